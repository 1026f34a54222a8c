//! # batch_file_egress
//!
//! Uploads a task's output files from a compute node to Azure Blob Storage.
//!
//! ## Overview
//!
//! An output file manifest lists rules of the form "files matching this
//! pattern go to this blob container when the task ended like this". After the
//! task finishes, the uploader resolves each matching rule's pattern against
//! the task working directory, uploads every matched file through a bounded
//! pool of concurrent workers, and collects per-file failures instead of
//! stopping at the first one. A failed run is reduced to a single structured
//! error code for the operator.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use batch_file_egress::cloud::{create_http_client, SasBlobClient};
//! use batch_file_egress::config::{ManifestSource, UploadManifest, UploaderConfig};
//! use batch_file_egress::models::TaskOutcome;
//! use batch_file_egress::uploader::FileUploader;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let manifest = UploadManifest::load(&ManifestSource::EnvVar("OUTPUT_FILES".into()))?;
//! let config = UploaderConfig::new("/mnt/batch/tasks/workitems/job/task/wd");
//!
//! let client = create_http_client(Duration::from_secs(300))?;
//! let store = Arc::new(SasBlobClient::new(client, config.max_retries));
//!
//! let summary = FileUploader::new(store, config)
//!     .run(&manifest, TaskOutcome::Success)
//!     .await?;
//! println!("Uploaded {} files", summary.files_uploaded);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`cli`]: Command-line interface definitions
//! - [`config`]: Runtime settings and the output file manifest
//! - [`paths`]: Pattern resolution, file enumeration and blob naming
//! - [`uploader`]: Orchestration of one upload run
//! - [`cloud`]: Blob storage transport
//! - [`errors`]: Error taxonomy, aggregation and classification
//! - [`security`]: Credential scrubbing for logs
//! - [`constants`]: Application-wide constants

/// Command-line interface definitions and argument parsing
pub mod cli;

/// Core data models shared across modules
pub mod models;

/// Runtime configuration and the output file manifest
pub mod config;

/// Pattern resolution and file enumeration
pub mod paths;

/// Upload orchestration
pub mod uploader;

/// Blob storage integration
pub mod cloud;

/// Error taxonomy, aggregation and classification
pub mod errors;

/// Security utilities for credential protection
pub mod security;

/// Application constants and configuration values
pub mod constants;

/// Test utilities and helpers
#[cfg(test)]
pub mod test_utils;
