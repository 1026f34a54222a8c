use std::fmt;
use std::path::PathBuf;

/// Outcome of the task whose output files are being uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failure,
    Unspecified,
}

impl TaskOutcome {
    /// Build an outcome from the mutually exclusive `--success`/`--failure` flags.
    pub fn from_flags(success: bool, failure: bool) -> Self {
        match (success, failure) {
            (true, _) => TaskOutcome::Success,
            (_, true) => TaskOutcome::Failure,
            _ => TaskOutcome::Unspecified,
        }
    }
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskOutcome::Success => write!(f, "success"),
            TaskOutcome::Failure => write!(f, "failure"),
            TaskOutcome::Unspecified => write!(f, "unspecified"),
        }
    }
}

/// A file pattern resolved against the task working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Directory that matched files are named relative to
    pub base_directory: PathBuf,
    /// Absolute, normalized pattern (or literal path)
    pub match_pattern: PathBuf,
    /// The pattern contains no wildcard characters
    pub is_literal_file: bool,
    /// The pattern contains a `**` segment
    pub is_recursive: bool,
}
