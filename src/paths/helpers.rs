use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};

/// Segment that matches any number of directories.
pub const RECURSIVE_MARKER: &str = "**";

/// Check if a path fragment contains glob wildcard characters
pub fn has_wildcard(text: &str) -> bool {
    text.contains(['*', '?', '['])
}

/// Resolve `.` and `..` without touching the filesystem.
///
/// `..` at the root stays at the root.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if ends_with_normal(&normalized) {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }

    normalized
}

fn ends_with_normal(path: &Path) -> bool {
    matches!(path.components().next_back(), Some(Component::Normal(_)))
}

/// Compile a `/`-separated pattern relative to the base directory.
///
/// `*`, `?` and character classes never cross a `/`; `**` spans any number
/// of directories.
pub fn compile_pattern(pattern: &str) -> Result<GlobMatcher, globset::Error> {
    Ok(GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()?
        .compile_matcher())
}

/// Join the components of a relative path with `/`
pub fn to_slash_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
