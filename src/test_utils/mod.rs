//! Test utilities shared by the unit tests.

use anyhow::Result;
use std::fs;
use tempfile::TempDir;

/// Creates a temporary working directory with a small tree of task outputs
///
/// ```text
/// file1.txt
/// file2.log
/// dir1/file3.txt
/// dir1/subdir1/file4.txt
/// dir2/file5.log
/// ```
pub fn create_test_file_structure() -> Result<TempDir> {
    let temp_dir = TempDir::new()?;
    let base_path = temp_dir.path();

    fs::create_dir_all(base_path.join("dir1/subdir1"))?;
    fs::create_dir_all(base_path.join("dir2"))?;

    fs::write(base_path.join("file1.txt"), b"Test content 1")?;
    fs::write(base_path.join("file2.log"), b"Test log content")?;
    fs::write(base_path.join("dir1/file3.txt"), b"Test content 3")?;
    fs::write(base_path.join("dir1/subdir1/file4.txt"), b"Test content 4")?;
    fs::write(base_path.join("dir2/file5.log"), b"Another log file")?;

    Ok(temp_dir)
}
