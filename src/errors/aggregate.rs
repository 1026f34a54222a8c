use std::fmt;
use std::sync::Mutex;

use super::UploadError;

/// One failed upload: the local file, the pattern that matched it, and why.
#[derive(Debug)]
pub struct UploadFailure {
    pub file: String,
    pub pattern: String,
    pub error: UploadError,
}

/// Every per-file failure from a single run, in the order they were recorded.
///
/// The `Display` rendering is read by operators and log scrapers, so its
/// format is fixed: `file: {file} from pattern: {pattern} hit error: {error:?}`
/// per entry, joined by `", "`.
#[derive(Debug, Default)]
pub struct AggregateFailure {
    failures: Vec<UploadFailure>,
}

impl AggregateFailure {
    pub fn new(failures: Vec<UploadFailure>) -> Self {
        AggregateFailure { failures }
    }

    pub fn failures(&self) -> &[UploadFailure] {
        &self.failures
    }

    /// The representative failure used for classification.
    pub fn first(&self) -> Option<&UploadFailure> {
        self.failures.first()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for AggregateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(
                f,
                "file: {} from pattern: {} hit error: {:?}",
                failure.file, failure.pattern, failure.error
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateFailure {}

/// Accumulator shared by concurrent upload workers.
#[derive(Debug, Default)]
pub struct ErrorAggregator {
    failures: Mutex<Vec<UploadFailure>>,
}

impl ErrorAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a failure. Safe to call from any worker.
    pub fn record(&self, file: impl Into<String>, pattern: impl Into<String>, error: UploadError) {
        let failure = UploadFailure {
            file: file.into(),
            pattern: pattern.into(),
            error,
        };
        // Poisoning leaves the Vec intact.
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(failure);
    }

    pub fn len(&self) -> usize {
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_failure(self) -> AggregateFailure {
        AggregateFailure::new(
            self.failures
                .into_inner()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }
}
