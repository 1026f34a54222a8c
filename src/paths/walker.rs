use std::path::PathBuf;

use log::{debug, warn};
use walkdir::WalkDir;

use crate::errors::UploadError;
use crate::models::ResolvedPath;
use crate::paths::helpers::{compile_pattern, to_slash_path};

/// Enumerate every file a resolved pattern names.
///
/// Literal patterns yield exactly their file or `FileNotFound`. Wildcard
/// patterns walk `base_directory` (the whole subtree when recursive, otherwise
/// only as deep as the pattern has segments) and may legitimately match
/// nothing. Unreadable directories are logged and skipped. Results are sorted.
pub fn enumerate_matches(resolved: &ResolvedPath) -> Result<Vec<PathBuf>, UploadError> {
    if resolved.is_literal_file {
        return if resolved.match_pattern.is_file() {
            Ok(vec![resolved.match_pattern.clone()])
        } else {
            Err(UploadError::FileNotFound(resolved.match_pattern.clone()))
        };
    }

    let relative_pattern = resolved
        .match_pattern
        .strip_prefix(&resolved.base_directory)
        .map_err(|_| {
            UploadError::InvalidArgument(format!(
                "pattern {} is not under {}",
                resolved.match_pattern.display(),
                resolved.base_directory.display()
            ))
        })?;
    let pattern = to_slash_path(relative_pattern);
    let matcher = compile_pattern(&pattern)
        .map_err(|e| UploadError::InvalidArgument(format!("invalid file pattern: {}", e)))?;

    let mut walker = WalkDir::new(&resolved.base_directory)
        .min_depth(1)
        .follow_links(true);
    if !resolved.is_recursive {
        walker = walker.max_depth(pattern.split('/').count());
    }

    let mut matches = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable path under {}: {}", resolved.base_directory.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = match entry.path().strip_prefix(&resolved.base_directory) {
            Ok(relative) => to_slash_path(relative),
            Err(_) => continue,
        };
        if matcher.is_match(&relative) {
            debug!("Matched file: {}", entry.path().display());
            matches.push(entry.into_path());
        }
    }

    matches.sort();
    debug!(
        "Pattern {} matched {} file(s){}",
        resolved.match_pattern.display(),
        matches.len(),
        if resolved.is_recursive { " recursively" } else { "" }
    );
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::resolve;
    use crate::test_utils::create_test_file_structure;

    fn names(base: &std::path::Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| to_slash_path(f.strip_prefix(base).unwrap()))
            .collect()
    }

    #[test]
    fn test_single_level_pattern() {
        let temp_dir = create_test_file_structure().unwrap();
        let base = temp_dir.path();

        let files = enumerate_matches(&resolve("*.txt", base)).unwrap();
        assert_eq!(names(base, &files), vec!["file1.txt"]);
    }

    #[test]
    fn test_recursive_pattern() {
        let temp_dir = create_test_file_structure().unwrap();
        let base = temp_dir.path();

        let files = enumerate_matches(&resolve("**/*.txt", base)).unwrap();
        assert_eq!(
            names(base, &files),
            vec!["dir1/file3.txt", "dir1/subdir1/file4.txt", "file1.txt"]
        );
    }

    #[test]
    fn test_wildcard_directory_spans_one_level() {
        let temp_dir = create_test_file_structure().unwrap();
        let base = temp_dir.path();

        let files = enumerate_matches(&resolve("*/*.log", base)).unwrap();
        assert_eq!(names(base, &files), vec!["dir2/file5.log"]);

        let files = enumerate_matches(&resolve("*/*.txt", base)).unwrap();
        assert_eq!(names(base, &files), vec!["dir1/file3.txt"]);
    }

    #[test]
    fn test_trailing_bare_wildcard() {
        let temp_dir = create_test_file_structure().unwrap();
        let base = temp_dir.path();

        let files = enumerate_matches(&resolve("dir1/file*", base)).unwrap();
        assert_eq!(names(base, &files), vec!["dir1/file3.txt"]);
    }

    #[test]
    fn test_literal_file() {
        let temp_dir = create_test_file_structure().unwrap();
        let base = temp_dir.path();

        let files = enumerate_matches(&resolve("dir2/file5.log", base)).unwrap();
        assert_eq!(files, vec![base.join("dir2/file5.log")]);
    }

    #[test]
    fn test_missing_literal_file() {
        let temp_dir = create_test_file_structure().unwrap();
        let err = enumerate_matches(&resolve("nope.txt", temp_dir.path())).unwrap_err();
        assert!(matches!(err, UploadError::FileNotFound(_)));
    }

    #[test]
    fn test_wildcard_without_matches_is_empty() {
        let temp_dir = create_test_file_structure().unwrap();
        let base = temp_dir.path();

        assert!(enumerate_matches(&resolve("*.csv", base)).unwrap().is_empty());
        assert!(enumerate_matches(&resolve("missing-dir/*.txt", base)).unwrap().is_empty());
    }

    #[test]
    fn test_character_class_pattern() {
        let temp_dir = create_test_file_structure().unwrap();
        let base = temp_dir.path();
        std::fs::write(base.join("run1.log"), "1").unwrap();
        std::fs::write(base.join("run3.log"), "3").unwrap();

        let resolved = resolve("run[12].log", base);
        assert!(!resolved.is_literal_file);

        let files = enumerate_matches(&resolved).unwrap();
        assert_eq!(names(base, &files), vec!["run1.log"]);
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let temp_dir = create_test_file_structure().unwrap();
        let err = enumerate_matches(&resolve("run[12.log", temp_dir.path())).unwrap_err();
        assert!(matches!(err, UploadError::InvalidArgument(_)));
    }
}
