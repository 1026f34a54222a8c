//! Blob storage integration for output file uploads.
//!
//! Files are written to Azure Blob Storage through container SAS URLs using
//! the Blob REST API directly. The [`blob::BlobStore`] trait is the seam the
//! uploader talks to, so the transport can be swapped out in tests.
//!
//! ## Upload strategy
//!
//! ```text
//!   file <= 64MB  ──▶ Put Blob (single request, x-ms-blob-type: BlockBlob)
//!   file  > 64MB  ──▶ Put Block × N (4MB each) ──▶ Put Block List
//! ```
//!
//! Transient failures (HTTP 500/502/503/504 and connection errors) are retried
//! with exponential backoff when the run is configured with `max_retries > 0`.

pub mod blob;
pub mod client;

pub use blob::{retry_delay, BlobStore, SasBlobClient};
pub use client::create_http_client;
