use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use crate::config::ManifestSource;
use crate::constants::{
    DEFAULT_MAX_UPLOAD_RETRIES, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_UPLOAD_CONCURRENCY,
    STDIN_MARKER,
};
use crate::models::TaskOutcome;

/// Command-line arguments for the file egress uploader.
///
/// Exactly one manifest source is required; the task outcome flags are
/// mutually exclusive and may both be omitted.
#[derive(Parser, Debug)]
#[clap(
    name = "batch-file-egress",
    about = "Upload task output files to Azure Blob Storage",
    group(ArgGroup::new("source").required(true).args(["file", "env"]))
)]
pub struct Args {
    /// Path to the output file manifest JSON ("-" reads standard input)
    #[clap(short, long)]
    pub file: Option<PathBuf>,

    /// Environment variable holding the output file manifest JSON
    #[clap(short, long)]
    pub env: Option<String>,

    /// The task succeeded
    #[clap(long, conflicts_with = "failure")]
    pub success: bool,

    /// The task failed
    #[clap(long)]
    pub failure: bool,

    /// Directory relative file patterns are resolved against
    /// (default: $AZ_BATCH_TASK_WORKING_DIR, then the current directory)
    #[clap(short, long)]
    pub working_dir: Option<PathBuf>,

    /// Maximum number of concurrent uploads
    #[clap(long, default_value_t = DEFAULT_UPLOAD_CONCURRENCY)]
    pub concurrency: usize,

    /// Retries per file for transient storage failures
    #[clap(long, default_value_t = DEFAULT_MAX_UPLOAD_RETRIES)]
    pub max_retries: usize,

    /// Per-request timeout in seconds
    #[clap(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Verbose logging
    #[clap(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn manifest_source(&self) -> ManifestSource {
        match (&self.file, &self.env) {
            (Some(path), _) if path.as_os_str() == STDIN_MARKER => ManifestSource::Stdin,
            (Some(path), _) => ManifestSource::File(path.clone()),
            (None, Some(name)) => ManifestSource::EnvVar(name.clone()),
            (None, None) => ManifestSource::Stdin,
        }
    }

    pub fn task_outcome(&self) -> TaskOutcome {
        TaskOutcome::from_flags(self.success, self.failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_file_source() {
        let args = Args::parse_from(["batch-file-egress", "--file", "/tmp/manifest.json"]);
        assert_eq!(
            args.manifest_source(),
            ManifestSource::File(PathBuf::from("/tmp/manifest.json"))
        );
        assert_eq!(args.task_outcome(), TaskOutcome::Unspecified);
    }

    #[test]
    fn test_env_source() {
        let args = Args::parse_from(["batch-file-egress", "-e", "EGRESS_MANIFEST", "--success"]);
        assert_eq!(
            args.manifest_source(),
            ManifestSource::EnvVar("EGRESS_MANIFEST".to_string())
        );
        assert_eq!(args.task_outcome(), TaskOutcome::Success);
    }

    #[test]
    fn test_stdin_source() {
        let args = Args::parse_from(["batch-file-egress", "--file", "-", "--failure"]);
        assert_eq!(args.manifest_source(), ManifestSource::Stdin);
        assert_eq!(args.task_outcome(), TaskOutcome::Failure);
    }

    #[test]
    fn test_source_is_required() {
        assert!(Args::try_parse_from(["batch-file-egress"]).is_err());
    }

    #[test]
    fn test_sources_are_mutually_exclusive() {
        let result = Args::try_parse_from(["batch-file-egress", "--file", "m.json", "--env", "M"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_outcome_flags_are_mutually_exclusive() {
        let result = Args::try_parse_from(["batch-file-egress", "-f", "m.json", "--success", "--failure"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_default_values() {
        let args = Args::parse_from(["batch-file-egress", "-f", "m.json"]);

        assert_eq!(args.concurrency, 4);
        assert_eq!(args.max_retries, 0);
        assert_eq!(args.timeout, 300);
        assert!(args.working_dir.is_none());
        assert!(!args.verbose);
    }

    #[test]
    fn test_tuning_flags() {
        let args = Args::parse_from([
            "batch-file-egress",
            "-f", "m.json",
            "--concurrency", "16",
            "--max-retries", "3",
            "--timeout", "60",
            "--working-dir", "/mnt/batch/tasks/wd",
            "--verbose",
        ]);

        assert_eq!(args.concurrency, 16);
        assert_eq!(args.max_retries, 3);
        assert_eq!(args.timeout, 60);
        assert_eq!(args.working_dir, Some(PathBuf::from("/mnt/batch/tasks/wd")));
        assert!(args.verbose);
    }
}
