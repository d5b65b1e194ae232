//! Error types for cwbench
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// cwbench error types
#[derive(Error, Debug)]
pub enum Error {
    /// Submitted dimensions don't match the project's dimension set
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// The same dimension was submitted twice
    #[error("Duplicated dimension: {0}")]
    DuplicatedDimension(String),

    /// A submission row could not be parsed
    #[error("Malformed data: {0:?}")]
    MalformedData(String),

    /// A control does not cover every project dimension (server-side defect)
    #[error("Dimension id missing: {0}\nControls are dimension-complete at creation. Please report this issue.")]
    DimensionIdMissing(String),

    /// Referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage collaborator failure
    #[error("Storage error: {0}")]
    StorageError(String),

    /// One or more candidates could not be scored during a search
    #[error("Search failed: {failed} of {total} candidates could not be scored\nFirst failure: {first}")]
    SearchFailed {
        /// Number of candidates that failed
        failed: usize,
        /// Number of candidates in the search
        total: usize,
        /// First failure observed
        first: Box<Error>,
    },

    /// A search worker panicked before draining the queue
    #[error("Search worker panicked: {0}")]
    WorkerPanicked(String),

    /// Search work queue closed (receiver dropped)
    #[error("Search queue closed (receiver dropped)")]
    QueueClosed,

    /// Invalid argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be parsed
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    /// Config file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error was caused by caller-supplied data.
    ///
    /// Validation errors are detected before any persistence and should be
    /// surfaced directly; they are never worth retrying.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::DimensionMismatch(_)
                | Self::DuplicatedDimension(_)
                | Self::MalformedData(_)
                | Self::InvalidInput(_)
        )
    }
}
