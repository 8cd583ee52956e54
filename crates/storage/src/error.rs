use specledger_core::{format_issues, PatchError, ValidationIssue};

/// All errors that can be returned by the [`VersionStore`](crate::VersionStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The batch failed validation against the current specification.
    /// Nothing was applied.
    #[error("validation failed:\n{}", format_issues(.0))]
    Validation(Vec<ValidationIssue>),

    /// Stale-base commit: another commit or rollback landed after the caller
    /// read the specification. The caller must retry against the latest state.
    #[error(
        "stale base: expected generation {expected}, store is at generation {found}; retry against the latest specification"
    )]
    Conflict { expected: u64, found: u64 },

    /// The history log does not reproduce the stored specification.
    #[error("corrupt history: {0}")]
    Corruption(String),

    /// Rollback asked for more records than the log holds.
    #[error("cannot roll back {requested} record(s): history has {available}")]
    RollbackOutOfRange { requested: usize, available: usize },

    /// The patch engine rejected a batch the store believed valid.
    #[error("internal invariant violated: {0}")]
    Patch(#[from] PatchError),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("state serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
