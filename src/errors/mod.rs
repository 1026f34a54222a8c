//! Error taxonomy for the egress uploader.
//!
//! Per-file failures are carried as [`UploadError`] values with a typed HTTP
//! status where one exists. They are collected by an [`ErrorAggregator`] while
//! a run is in flight and surface as a single [`AggregateFailure`], which the
//! [`classifier`] reduces to an operator-facing [`ErrorSpecification`].

/// Synchronized collection of per-file failures
pub mod aggregate;

/// Mapping of failures onto structured error codes
pub mod classifier;

use std::path::PathBuf;

use thiserror::Error;

use crate::security::scrub_credentials;

pub use aggregate::{AggregateFailure, ErrorAggregator, UploadFailure};
pub use classifier::{classify, ErrorCode, ErrorSpecification};

/// A failure while uploading a single file.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid destination: {0}")]
    InvalidDestination(String),

    #[error("storage service returned HTTP {status} ({}): {message}", error_code.as_deref().unwrap_or("no error code"))]
    Storage {
        status: u16,
        error_code: Option<String>,
        message: String,
    },

    #[error("transport failure: {message}")]
    Transport { status: Option<u16>, message: String },
}

impl UploadError {
    /// HTTP status code attached to the failure, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            UploadError::Storage { status, .. } => Some(*status),
            UploadError::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            UploadError::Storage { status, .. } => matches!(status, 500 | 502 | 503 | 504),
            UploadError::Transport { status, .. } => status.is_none(),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for UploadError {
    fn from(error: reqwest::Error) -> Self {
        UploadError::Transport {
            status: error.status().map(|s| s.as_u16()),
            message: scrub_credentials(&error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_only_for_http_failures() {
        let storage = UploadError::Storage {
            status: 404,
            error_code: Some("ContainerNotFound".to_string()),
            message: "The specified container does not exist.".to_string(),
        };
        assert_eq!(storage.status(), Some(404));
        assert_eq!(UploadError::FileNotFound(PathBuf::from("/x")).status(), None);
        assert_eq!(UploadError::InvalidArgument("bad".to_string()).status(), None);
    }

    #[test]
    fn test_transient_classification() {
        let busy = UploadError::Storage { status: 503, error_code: None, message: String::new() };
        let denied = UploadError::Storage { status: 403, error_code: None, message: String::new() };
        let reset = UploadError::Transport { status: None, message: "connection reset".to_string() };

        assert!(busy.is_transient());
        assert!(!denied.is_transient());
        assert!(reset.is_transient());
        assert!(!UploadError::FileNotFound(PathBuf::from("/x")).is_transient());
    }

    #[test]
    fn test_storage_display_includes_error_code() {
        let err = UploadError::Storage {
            status: 409,
            error_code: Some("BlobAlreadyExists".to_string()),
            message: "conflict".to_string(),
        };
        assert_eq!(err.to_string(), "storage service returned HTTP 409 (BlobAlreadyExists): conflict");
    }
}
