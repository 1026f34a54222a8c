use serde::Serialize;

use super::AggregateFailure;

/// Structured error codes reported on the failure channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCode {
    InternalError,
    AuthenticationFailed,
    ContainerNotFound,
    Conflict,
    PreconditionFailed,
    UnknownError,
}

/// The JSON document written to stderr when a run fails.
///
/// Field order is the serialized key order: `code`, `file`, `pattern`,
/// `user_error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorSpecification {
    pub code: ErrorCode,
    pub file: Option<String>,
    pub pattern: Option<String>,
    pub user_error: bool,
}

impl ErrorSpecification {
    pub fn new(code: ErrorCode, user_error: bool, pattern: Option<String>, file: Option<String>) -> Self {
        ErrorSpecification {
            code,
            file,
            pattern,
            user_error,
        }
    }

    /// Classification for failures that never reached a per-file upload.
    pub fn unknown() -> Self {
        Self::new(ErrorCode::UnknownError, false, None, None)
    }
}

/// Map an HTTP status onto an error code and whether the caller is at fault.
pub fn code_for_status(status: Option<u16>) -> (ErrorCode, bool) {
    match status {
        Some(400) => (ErrorCode::InternalError, false),
        Some(403) => (ErrorCode::AuthenticationFailed, true),
        Some(404) => (ErrorCode::ContainerNotFound, true),
        Some(409) => (ErrorCode::Conflict, true),
        Some(412) => (ErrorCode::PreconditionFailed, false),
        Some(500) | Some(503) => (ErrorCode::InternalError, false),
        _ => (ErrorCode::UnknownError, false),
    }
}

/// Reduce a run failure to an [`ErrorSpecification`].
///
/// Only the first entry of an [`AggregateFailure`] is inspected; any other
/// error, including manifest loading failures, is `UnknownError`.
pub fn classify(error: &anyhow::Error) -> ErrorSpecification {
    let aggregate = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<AggregateFailure>());

    match aggregate.and_then(AggregateFailure::first) {
        Some(failure) => {
            let (code, user_error) = code_for_status(failure.error.status());
            ErrorSpecification::new(
                code,
                user_error,
                Some(failure.pattern.clone()),
                Some(failure.file.clone()),
            )
        }
        None => ErrorSpecification::unknown(),
    }
}
