use scriptkeeper_core::diff::FieldDiff;
use scriptkeeper_core::id::CompositeId;
use serde::Serialize;

/// What applying a declaration would do to the cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Plan {
    /// Nothing is recorded or stored yet.
    Create,
    /// The stored script already matches the declaration.
    NoOp { id: CompositeId },
    /// Content drifted; a put under the same id converges it.
    Update {
        id: CompositeId,
        diffs: Vec<FieldDiff>,
    },
    /// The name changed, so the old script must go and a new one be put.
    Replace {
        id: CompositeId,
        diffs: Vec<FieldDiff>,
    },
}

impl Plan {
    pub fn action(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::NoOp { .. } => "no_op",
            Self::Update { .. } => "update",
            Self::Replace { .. } => "replace",
        }
    }

    /// The id the plan acts upon, if the script already exists.
    pub fn id(&self) -> Option<&CompositeId> {
        match self {
            Self::Create => None,
            Self::NoOp { id } | Self::Update { id, .. } | Self::Replace { id, .. } => Some(id),
        }
    }

    pub fn diffs(&self) -> &[FieldDiff] {
        match self {
            Self::Update { diffs, .. } | Self::Replace { diffs, .. } => diffs,
            Self::Create | Self::NoOp { .. } => &[],
        }
    }

    /// Whether applying would touch the cluster at all.
    pub fn has_changes(&self) -> bool {
        !matches!(self, Self::NoOp { .. })
    }
}
