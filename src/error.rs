//! Error types
//!
//! Every failure a request can run into ends up as a [`HookError`], which the
//! router turns into a failure envelope.

use thiserror::Error;

/// Malformed or incomplete input
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No data received")]
    NoData,
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
    #[error("Officer Name and Date are required fields")]
    MissingRequired,
    #[error("Unknown action: {0}")]
    UnknownAction(String),
    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),
}

/// Sheet backend failure
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("timeout")]
    Timeout,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("storage task failed: {0}")]
    Task(String),
}

#[derive(Debug, Error)]
pub enum HookError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    /// The request body could not be read off the connection
    #[error("Failed to read request body: {0}")]
    BodyRead(String),
}

pub type HookResult<T> = Result<T, HookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        assert_eq!(ValidationError::NoData.to_string(), "No data received");
        assert_eq!(
            ValidationError::InvalidJson("expected value".into()).to_string(),
            "Invalid JSON: expected value"
        );
        assert_eq!(
            ValidationError::UnknownAction("remove".into()).to_string(),
            "Unknown action: remove"
        );
    }

    #[test]
    fn test_hook_error_display() {
        let err = HookError::from(ValidationError::MissingRequired);
        assert_eq!(err.to_string(), "Officer Name and Date are required fields");

        let err = HookError::from(StorageError::Timeout);
        assert_eq!(err.to_string(), "Storage error: timeout");

        let err = HookError::BodyRead("connection reset".into());
        assert_eq!(err.to_string(), "Failed to read request body: connection reset");
    }
}
