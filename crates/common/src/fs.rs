//! Small filesystem helpers used when preparing and resetting node data directories.

use std::{
    fs::{create_dir_all, remove_dir_all, remove_file},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

/// Creates the directory (and its parents) if it's missing. Returns `true` if it was created.
pub fn ensure_directory(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(false);
    }
    create_dir_all(path)
        .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    Ok(true)
}

/// Removes anything that isn't a directory, sockets included.
pub fn remove_file_if_exists(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    if !path.exists() || path.is_dir() {
        return Ok(false);
    }
    remove_file(path).with_context(|| format!("Failed to remove file: {}", path.display()))?;
    Ok(true)
}

pub fn remove_dir_if_exists(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    if !path.is_dir() {
        return Ok(false);
    }
    remove_dir_all(path)
        .with_context(|| format!("Failed to remove directory: {}", path.display()))?;
    Ok(true)
}

/// Makes the path absolute against the current directory without touching the filesystem.
pub fn absolute_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Compares two paths, resolving symlinks when both exist and falling back to comparing their
/// absolute forms otherwise.
pub fn is_same_path(first: impl AsRef<Path>, second: impl AsRef<Path>) -> bool {
    let first = absolute_path(first);
    let second = absolute_path(second);
    match (first.canonicalize(), second.canonicalize()) {
        (Ok(first), Ok(second)) => first == second,
        _ => first == second,
    }
}

#[cfg(test)]
mod tests {
    use std::fs::{File, create_dir};

    use temp_dir::TempDir;

    use super::*;

    #[test]
    fn removal_helpers_report_whether_something_was_removed() {
        // Arrange
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("nodekey");
        let directory = temp_dir.path().join("chaindata");
        File::create(&file).unwrap();
        create_dir(&directory).unwrap();

        // Act & Assert
        assert!(remove_file_if_exists(&file).unwrap());
        assert!(!remove_file_if_exists(&file).unwrap());
        assert!(remove_dir_if_exists(&directory).unwrap());
        assert!(!remove_dir_if_exists(&directory).unwrap());
    }

    #[test]
    fn same_path_resolves_relative_components() {
        // Arrange
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested");
        ensure_directory(&nested).unwrap();

        // Act
        let same = is_same_path(nested.join(".."), temp_dir.path());

        // Assert
        assert!(same);
        assert!(!is_same_path(&nested, temp_dir.path()));
    }
}
