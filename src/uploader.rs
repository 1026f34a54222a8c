//! Orchestration of one egress run.
//!
//! Rules are planned in manifest order: each matching rule's pattern is
//! resolved and fully enumerated into upload jobs before anything is sent.
//! The jobs of all rules then share one bounded pool of upload slots. A
//! failing file never stops the others; every failure lands in the run's
//! [`ErrorAggregator`].

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::future;
use log::{debug, info, warn};
use tokio::sync::Semaphore;

use crate::cloud::BlobStore;
use crate::config::{OutputFileRule, UploadManifest, UploaderConfig};
use crate::errors::{AggregateFailure, ErrorAggregator};
use crate::models::TaskOutcome;
use crate::paths::{enumerate_matches, normalize_blob_name, resolve};
use crate::security::display_container;

/// Counters for a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub rules_matched: usize,
    pub files_uploaded: usize,
    pub bytes_uploaded: u64,
}

/// A single file scheduled for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
struct UploadJob {
    file: PathBuf,
    pattern: String,
    container_sas: String,
    blob_name: String,
}

/// Uploads the output files named by a manifest.
pub struct FileUploader {
    store: Arc<dyn BlobStore>,
    config: UploaderConfig,
}

impl FileUploader {
    pub fn new(store: Arc<dyn BlobStore>, config: UploaderConfig) -> Self {
        FileUploader { store, config }
    }

    pub fn config(&self) -> &UploaderConfig {
        &self.config
    }

    /// Run every rule whose upload condition matches `outcome`.
    ///
    /// Fails with the aggregate of all per-file failures if there were any.
    pub async fn run(
        &self,
        manifest: &UploadManifest,
        outcome: TaskOutcome,
    ) -> Result<UploadSummary, AggregateFailure> {
        let start_time = Instant::now();
        let aggregator = ErrorAggregator::new();
        let mut jobs = Vec::new();
        let mut rules_matched = 0;

        for (index, rule) in manifest.output_files.iter().enumerate() {
            if !rule.condition().matches(outcome) {
                debug!(
                    "Skipping rule {} ({}): uploads on {}, task outcome is {}",
                    index,
                    rule.file_pattern,
                    rule.condition(),
                    outcome
                );
                continue;
            }
            rules_matched += 1;
            jobs.extend(self.plan_rule(rule, &aggregator));
        }

        info!(
            "Uploading {} file(s) from {} matching rule(s) with {} worker(s)",
            jobs.len(),
            rules_matched,
            self.config.concurrency
        );

        let semaphore = Semaphore::new(self.config.concurrency.max(1));
        let files_uploaded = AtomicUsize::new(0);
        let bytes_uploaded = AtomicU64::new(0);

        let uploads = jobs.into_iter().map(|job| {
            let semaphore = &semaphore;
            let aggregator = &aggregator;
            let files_uploaded = &files_uploaded;
            let bytes_uploaded = &bytes_uploaded;

            async move {
                // The semaphore is never closed, so acquire only fails if that changes.
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        warn!("Upload slot unavailable for {}: {}", job.file.display(), e);
                        return;
                    }
                };

                match self
                    .store
                    .put_blob(&job.container_sas, &job.blob_name, &job.file)
                    .await
                {
                    Ok(bytes) => {
                        debug!(
                            "Uploaded {} to {}/{} ({} bytes)",
                            job.file.display(),
                            display_container(&job.container_sas),
                            job.blob_name,
                            bytes
                        );
                        files_uploaded.fetch_add(1, Ordering::SeqCst);
                        bytes_uploaded.fetch_add(bytes, Ordering::SeqCst);
                    }
                    Err(e) => {
                        warn!("Failed to upload {}: {}", job.file.display(), e);
                        aggregator.record(job.file.display().to_string(), job.pattern, e);
                    }
                }
            }
        });

        future::join_all(uploads).await;

        let summary = UploadSummary {
            rules_matched,
            files_uploaded: files_uploaded.load(Ordering::SeqCst),
            bytes_uploaded: bytes_uploaded.load(Ordering::SeqCst),
        };

        if !aggregator.is_empty() {
            let failure = aggregator.into_failure();
            warn!(
                "{} upload(s) failed, {} succeeded in {:?}",
                failure.len(),
                summary.files_uploaded,
                start_time.elapsed()
            );
            return Err(failure);
        }

        info!(
            "Uploaded {} file(s), {} bytes total in {:?}",
            summary.files_uploaded,
            summary.bytes_uploaded,
            start_time.elapsed()
        );
        Ok(summary)
    }

    /// Resolve and enumerate one rule into upload jobs. Enumeration failures
    /// are recorded against the rule and yield no jobs.
    fn plan_rule(&self, rule: &OutputFileRule, aggregator: &ErrorAggregator) -> Vec<UploadJob> {
        let resolved = resolve(&rule.file_pattern, &self.config.working_directory);
        debug!(
            "Pattern {} resolved to {} (base {}, recursive: {})",
            rule.file_pattern,
            resolved.match_pattern.display(),
            resolved.base_directory.display(),
            resolved.is_recursive
        );

        let files = match enumerate_matches(&resolved) {
            Ok(files) => files,
            Err(e) => {
                warn!("Pattern {} failed: {}", rule.file_pattern, e);
                aggregator.record(
                    resolved.match_pattern.display().to_string(),
                    rule.file_pattern.clone(),
                    e,
                );
                return Vec::new();
            }
        };

        if files.is_empty() {
            info!("Pattern {} matched no files", rule.file_pattern);
        }

        let container = rule.container();
        files
            .into_iter()
            .filter_map(|file| match normalize_blob_name(&resolved.base_directory, &file) {
                Ok(name) => Some(UploadJob {
                    blob_name: container.blob_name(&name),
                    container_sas: container.container_sas.clone(),
                    pattern: rule.file_pattern.clone(),
                    file,
                }),
                Err(e) => {
                    aggregator.record(file.display().to_string(), rule.file_pattern.clone(), e);
                    None
                }
            })
            .collect()
    }
}
