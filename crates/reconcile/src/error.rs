use scriptkeeper_core::error::CoreError;
use scriptkeeper_store::StoreError;

/// Errors from reconciling one stored script.
///
/// `Core` covers mistakes on the declaring side (bad JSON, bad ids); the
/// `Remote*` variants are rejections or failures reported by the cluster.
/// "Not found" is never an error here; it is folded into
/// [`ReadOutcome::Absent`](crate::ReadOutcome::Absent) and
/// [`DeleteOutcome::AlreadyAbsent`](crate::DeleteOutcome::AlreadyAbsent).
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Unable to resolve cluster identity: {0}")]
    ClusterIdentity(#[source] StoreError),

    #[error("Unable to create or update stored script '{name}': {source}")]
    RemoteWrite {
        name: String,
        #[source]
        source: StoreError,
    },

    #[error("Unable to get stored script '{name}': {source}")]
    RemoteRead {
        name: String,
        #[source]
        source: StoreError,
    },

    #[error("Unable to delete stored script '{name}': {source}")]
    RemoteDelete {
        name: String,
        #[source]
        source: StoreError,
    },

    /// The write succeeded but reading it back found nothing.
    #[error("Stored script '{0}' was not found right after it was written")]
    MissingAfterWrite(String),

    #[error("Operation cancelled")]
    Cancelled,
}

pub type ReconcileResult<T> = Result<T, ReconcileError>;

impl ReconcileError {
    /// Whether the transport gave up on a deadline.
    pub fn is_timeout(&self) -> bool {
        self.store_error().is_some_and(StoreError::is_timeout)
    }

    /// The underlying store failure, if any.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::ClusterIdentity(source)
            | Self::RemoteWrite { source, .. }
            | Self::RemoteRead { source, .. }
            | Self::RemoteDelete { source, .. } => Some(source),
            _ => None,
        }
    }
}
