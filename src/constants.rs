//! Global constants for the file egress uploader.
//!
//! This module centralizes all hardcoded values to improve maintainability
//! and make configuration changes easier.

// Worker pool
/// Default number of concurrent blob uploads
pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 4;

// Timeout and retry constants
/// Default per-request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Default retry attempts for transient storage failures (no retries)
pub const DEFAULT_MAX_UPLOAD_RETRIES: usize = 0;

/// Base retry delay in milliseconds
pub const RETRY_BASE_DELAY_MS: u64 = 250;

/// Maximum retry delay in seconds
pub const RETRY_MAX_DELAY_SECS: u64 = 30;

// Blob storage constants
/// Files larger than this are uploaded as staged blocks (64MB)
pub const LARGE_FILE_THRESHOLD: u64 = 64 * 1024 * 1024;

/// Block size for staged uploads (4MB)
pub const BLOCK_UPLOAD_SIZE: usize = 4 * 1024 * 1024;

/// Azure Blob REST API version sent with every request
pub const STORAGE_API_VERSION: &str = "2021-08-06";

/// Header carrying the storage service error code
pub const STORAGE_ERROR_CODE_HEADER: &str = "x-ms-error-code";

// Process surface
/// Exit status used when a run fails
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Environment variable holding the task working directory on a Batch node
pub const TASK_WORKING_DIR_ENV: &str = "AZ_BATCH_TASK_WORKING_DIR";

/// File argument that selects standard input
pub const STDIN_MARKER: &str = "-";
