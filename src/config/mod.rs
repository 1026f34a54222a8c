//! Runtime configuration and the output-file manifest.

mod env_vars;
pub mod manifest;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use log::debug;

use crate::constants::{
    DEFAULT_MAX_UPLOAD_RETRIES, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_UPLOAD_CONCURRENCY,
    TASK_WORKING_DIR_ENV,
};

pub use env_vars::{expand_env_vars, expand_unix_env_vars, expand_windows_env_vars};
pub use manifest::{
    ContainerDestination, ManifestError, ManifestSource, OutputFileRule, UploadCondition,
    UploadManifest,
};

/// Settings for one uploader run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploaderConfig {
    /// Directory relative file patterns are anchored at
    pub working_directory: PathBuf,
    /// Maximum number of blob uploads in flight
    pub concurrency: usize,
    /// Retries per file for transient storage failures
    pub max_retries: usize,
    /// Timeout applied to each storage request
    pub request_timeout: Duration,
}

impl UploaderConfig {
    pub fn new(working_directory: impl Into<PathBuf>) -> Self {
        UploaderConfig {
            working_directory: working_directory.into(),
            concurrency: DEFAULT_UPLOAD_CONCURRENCY,
            max_retries: DEFAULT_MAX_UPLOAD_RETRIES,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            bail!("Upload concurrency must be at least 1");
        }
        if !self.working_directory.is_absolute() {
            bail!(
                "Working directory must be absolute: {}",
                self.working_directory.display()
            );
        }
        Ok(())
    }
}

/// Pick the task working directory: explicit argument, then the Batch
/// environment, then the process current directory.
pub fn resolve_working_directory(explicit: Option<&Path>) -> Result<PathBuf> {
    let chosen = match explicit {
        Some(dir) => dir.to_path_buf(),
        None => match std::env::var_os(TASK_WORKING_DIR_ENV) {
            Some(dir) => {
                debug!("Using working directory from {}", TASK_WORKING_DIR_ENV);
                PathBuf::from(dir)
            }
            None => std::env::current_dir().context("Failed to determine current directory")?,
        },
    };

    if chosen.is_absolute() {
        Ok(chosen)
    } else {
        Ok(std::env::current_dir()
            .context("Failed to determine current directory")?
            .join(chosen))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = UploaderConfig::new("/wd");
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.request_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let config = UploaderConfig::new(std::env::temp_dir()).with_concurrency(0);
        assert!(config.validate().is_err());
        assert!(UploaderConfig::new(std::env::temp_dir()).validate().is_ok());
    }

    #[test]
    fn test_explicit_working_directory_wins() {
        let dir = std::env::temp_dir();
        assert_eq!(resolve_working_directory(Some(&dir)).unwrap(), dir);
    }

    #[test]
    fn test_relative_working_directory_is_anchored() {
        let resolved = resolve_working_directory(Some(Path::new("relative/wd"))).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("relative/wd"));
    }
}
