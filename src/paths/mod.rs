//! Resolution of output-file patterns against the task working directory.
//!
//! A pattern such as `$AZ_BATCH_TASK_DIR/out/**/*.log` is expanded, anchored
//! and normalized into a [`ResolvedPath`]; the [`walker`] then enumerates the
//! files it names, and [`normalize_blob_name`] turns each match into the blob
//! name it is uploaded under.

mod helpers;
pub mod walker;

use std::path::{Path, PathBuf};

use crate::config::expand_env_vars;
use crate::errors::UploadError;
use crate::models::ResolvedPath;

pub use helpers::{has_wildcard, normalize_lexically, to_slash_path, RECURSIVE_MARKER};
pub use walker::enumerate_matches;

/// Resolve a raw file pattern against `working_directory`.
///
/// Never fails; whether anything matches is decided at enumeration time.
pub fn resolve(raw_path: &str, working_directory: &Path) -> ResolvedPath {
    let expanded = expand_env_vars(raw_path);
    let anchored = if Path::new(&expanded).is_absolute() {
        PathBuf::from(&expanded)
    } else {
        working_directory.join(&expanded)
    };
    let normalized = normalize_lexically(&anchored);

    let mut base_directory = PathBuf::new();
    let mut in_pattern = false;
    let mut is_recursive = false;

    for component in normalized.components() {
        let text = component.as_os_str().to_string_lossy();
        if !in_pattern && has_wildcard(&text) {
            in_pattern = true;
        }
        if in_pattern {
            is_recursive |= text == RECURSIVE_MARKER;
        } else {
            base_directory.push(component.as_os_str());
        }
    }

    let is_literal_file = !in_pattern;
    if is_literal_file {
        base_directory = normalized
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| normalized.clone());
    }

    ResolvedPath {
        base_directory,
        match_pattern: normalized,
        is_literal_file,
        is_recursive,
    }
}

/// Blob name for `file` relative to `base_directory`, always `/`-separated.
pub fn normalize_blob_name(base_directory: &Path, file: &Path) -> Result<String, UploadError> {
    let relative = file.strip_prefix(base_directory).map_err(|_| {
        UploadError::InvalidArgument(format!(
            "{} is not under {}",
            file.display(),
            base_directory.display()
        ))
    })?;

    let name = to_slash_path(relative);
    if name.is_empty() {
        return Err(UploadError::InvalidArgument(format!(
            "{} names the base directory itself",
            file.display()
        )));
    }
    Ok(name)
}
