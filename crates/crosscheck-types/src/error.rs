use std::path::PathBuf;

use thiserror::Error;

/// Errors from session persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize sessions: {0}")]
    Serialize(String),

    #[error("session document at '{path}' is unreadable: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

/// Hard failures of a turn or a session-management action.
///
/// Per-call backend failures never show up here; they are stored as text on
/// the turn instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("question must not be empty")]
    EmptyQuestion,

    #[error("failed to persist sessions: {0}")]
    Persistence(#[from] StoreError),

    #[error("no session at index {index} ({len} sessions)")]
    SessionOutOfRange { index: usize, len: usize },

    #[error("session title must not be empty")]
    InvalidTitle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Corrupt {
            path: PathBuf::from("/tmp/sessions.json"),
            reason: "expected value at line 1".to_string(),
        };
        assert!(err.to_string().contains("/tmp/sessions.json"));
        assert!(err.to_string().contains("expected value"));
    }

    #[test]
    fn test_pipeline_error_from_store_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: PipelineError = StoreError::from(io).into();
        assert!(matches!(err, PipelineError::Persistence(StoreError::Io(_))));
        assert!(err.to_string().contains("read-only"));
    }

    #[test]
    fn test_out_of_range_display() {
        let err = PipelineError::SessionOutOfRange { index: 4, len: 2 };
        assert_eq!(err.to_string(), "no session at index 4 (2 sessions)");
    }
}
