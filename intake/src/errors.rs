use thiserror::Error;

/// Result type alias for intake operations
pub type Result<T, E = IntakeError> = std::result::Result<T, E>;

/// Errors that can surface from the feedback intake pipeline
///
/// AI enrichment failures never appear here. The handler replaces them with
/// the fallback assessment (see [`AnalyzerError`]).
///
/// [`AnalyzerError`]: crate::analyzer::AnalyzerError
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Invalid feedback submission: {0}")]
    InvalidInput(String),

    #[error("Storage endpoint is not configured")]
    StorageNotConfigured,

    #[error("Storage request failed for {0}: {1}")]
    StorageRequestFailed(String, String),

    #[error("Storage timeout for {0}")]
    StorageTimeout(String),

    /// The endpoint answered but did not accept the record.
    #[error("{0}")]
    StorageRejected(String),

    #[error("Response serialization error: {0}")]
    ResponseSerializationError(String),

    #[error("Hyper error: {0}")]
    Hyper(#[from] hyper::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntakeError {
    /// True for failures of the storage endpoint collaborator.
    pub fn is_forwarding_error(&self) -> bool {
        matches!(
            self,
            IntakeError::StorageNotConfigured
                | IntakeError::StorageRequestFailed(..)
                | IntakeError::StorageTimeout(_)
                | IntakeError::StorageRejected(_)
        )
    }

    /// Short tag used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            IntakeError::InvalidInput(_) => "invalid_input",
            IntakeError::StorageNotConfigured => "storage_not_configured",
            IntakeError::StorageRequestFailed(..) => "storage_request_failed",
            IntakeError::StorageTimeout(_) => "storage_timeout",
            IntakeError::StorageRejected(_) => "storage_rejected",
            IntakeError::ResponseSerializationError(_) => "serialization",
            IntakeError::Hyper(_) => "hyper",
            IntakeError::Io(_) => "io",
        }
    }
}
