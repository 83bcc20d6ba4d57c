//! Field-level drift between a declaration and the observed remote state.
//!
//! Both sides are compared in the declared shape. JSON-bearing fields
//! (`params`, `search_template`) are compared semantically, empty strings
//! count as unset, and an empty `params` is the same as `{}`.

use serde::{Deserialize, Serialize};

use crate::declared::{DeclaredScript, DeclaredStoredScript, DEFAULT_PARAMS};
use crate::json;

pub const FIELD_NAME: &str = "name";
pub const FIELD_LANG: &str = "script.lang";
pub const FIELD_SOURCE_SCRIPT: &str = "script.source.script";
pub const FIELD_SOURCE_TEMPLATE: &str = "script.source.search_template";
pub const FIELD_PARAMS: &str = "script.params";

/// The status of a field in a diff comparison.
///
/// - `Added`     -- set only on the declared side.
/// - `Removed`   -- set only on the observed side.
/// - `Changed`   -- set on both sides with different values.
/// - `Unchanged` -- set on both sides (or neither) with equivalent values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    Added,
    Removed,
    Changed,
    Unchanged,
}

impl DiffStatus {
    /// String representation for display and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Changed => "changed",
            Self::Unchanged => "unchanged",
        }
    }
}

impl std::fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One drifted field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDiff {
    /// Dotted path of the field in the declared shape.
    pub field: &'static str,
    pub status: DiffStatus,
    pub desired: Option<String>,
    pub observed: Option<String>,
}

impl FieldDiff {
    /// Whether this change can only be applied by recreating the resource.
    pub fn forces_replacement(&self) -> bool {
        self.field == FIELD_NAME
    }
}

/// Compare a declaration against the observed state, returning only the
/// fields that differ.
pub fn diff_declared(
    desired: &DeclaredStoredScript,
    observed: &DeclaredStoredScript,
) -> Vec<FieldDiff> {
    let want = Flat::from(desired);
    let have = Flat::from(observed);

    let fields = [
        (FIELD_NAME, want.name, have.name, Compare::Text),
        (FIELD_LANG, want.lang, have.lang, Compare::Text),
        (FIELD_SOURCE_SCRIPT, want.script, have.script, Compare::Text),
        (FIELD_SOURCE_TEMPLATE, want.template, have.template, Compare::Json),
        (FIELD_PARAMS, want.params, have.params, Compare::Json),
    ];

    fields
        .into_iter()
        .filter_map(|(field, desired, observed, compare)| {
            let status = compare.status(desired, observed);
            (status != DiffStatus::Unchanged).then(|| FieldDiff {
                field,
                status,
                desired: desired.map(str::to_string),
                observed: observed.map(str::to_string),
            })
        })
        .collect()
}

/// Whether any diff requires a replace rather than an in-place update.
pub fn forces_replacement(diffs: &[FieldDiff]) -> bool {
    diffs.iter().any(FieldDiff::forces_replacement)
}

#[derive(Clone, Copy)]
enum Compare {
    Text,
    Json,
}

impl Compare {
    fn status(self, desired: Option<&str>, observed: Option<&str>) -> DiffStatus {
        match (desired, observed) {
            (None, None) => DiffStatus::Unchanged,
            (Some(_), None) => DiffStatus::Added,
            (None, Some(_)) => DiffStatus::Removed,
            (Some(a), Some(b)) => {
                let same = match self {
                    Self::Text => a == b,
                    Self::Json => json::json_str_equivalent(a, b),
                };
                if same {
                    DiffStatus::Unchanged
                } else {
                    DiffStatus::Changed
                }
            }
        }
    }
}

/// Declared shape flattened to optional, non-empty field values.
struct Flat<'a> {
    name: Option<&'a str>,
    lang: Option<&'a str>,
    script: Option<&'a str>,
    template: Option<&'a str>,
    params: Option<&'a str>,
}

impl<'a> From<&'a DeclaredStoredScript> for Flat<'a> {
    fn from(declared: &'a DeclaredStoredScript) -> Self {
        let block: Option<&DeclaredScript> = declared.script.first();
        let source = block.and_then(|b| b.source.first());
        Self {
            name: non_empty(Some(declared.name.as_str())),
            lang: non_empty(block.map(|b| b.lang.as_str())),
            script: non_empty(source.and_then(|s| s.script.as_deref())),
            template: non_empty(source.and_then(|s| s.search_template.as_deref())),
            params: block.map(|b| {
                if b.params.is_empty() {
                    DEFAULT_PARAMS
                } else {
                    b.params.as_str()
                }
            }),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
