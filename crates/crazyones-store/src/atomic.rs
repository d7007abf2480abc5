//! Atomic file operations for crash-safe persistence.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{Result, StoreError};

/// Writes data to a file atomically.
///
/// This function writes to a temporary file first, then renames it to
/// the target path. This ensures the file is never observed in a
/// partially written state, even if the process crashes mid-write.
///
/// # Errors
/// Returns an error if the write or rename fails.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| StoreError::DirectoryError {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let dir = path.parent().unwrap_or(Path::new("."));
    let mut temp_file = tempfile::NamedTempFile::new_in(dir).map_err(|source| StoreError::WriteError {
        path: path.to_path_buf(),
        source,
    })?;

    temp_file.write_all(data).map_err(|source| StoreError::WriteError {
        path: path.to_path_buf(),
        source,
    })?;

    temp_file.flush().map_err(|source| StoreError::WriteError {
        path: path.to_path_buf(),
        source,
    })?;

    temp_file.persist(path).map_err(|e| StoreError::WriteError {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    Ok(())
}

/// Writes JSON data to a file atomically, pretty-printed for operator
/// readability.
pub fn atomic_write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    atomic_write(path, json.as_bytes())
}

/// Reads and deserializes JSON from a file.
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read_to_string(path).map_err(|source| StoreError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    let value = serde_json::from_str(&data)?;
    Ok(value)
}

/// Reads JSON from a file, returning `None` if the file doesn't exist.
pub fn read_json_optional<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    read_json(path).map(Some)
}

/// Reads JSON from a file, returning `None` on a missing file *or* a
/// parse failure.
///
/// Used by consumers of single-producer documents (the trigger file)
/// where a partial read during a concurrent write must be treated as
/// "not ready yet, try again next tick" rather than an error.
pub fn read_json_lenient<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    if !path.exists() {
        return None;
    }
    match fs::read_to_string(path) {
        Ok(data) => serde_json::from_str(&data).ok(),
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::tempdir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestData {
        name: String,
        value: i32,
    }

    #[test]
    fn atomic_write_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.txt");

        atomic_write(&path, b"hello world").unwrap();

        assert!(path.exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello world");
    }

    #[test]
    fn atomic_write_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/dir/test.txt");

        atomic_write(&path, b"nested content").unwrap();

        assert!(path.exists());
    }

    #[test]
    fn atomic_write_json_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");

        let data = TestData {
            name: "test".to_string(),
            value: 42,
        };

        atomic_write_json(&path, &data).unwrap();
        let loaded: TestData = read_json(&path).unwrap();

        assert_eq!(data, loaded);
    }

    #[test]
    fn read_json_optional_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.json");

        let result: Option<TestData> = read_json_optional(&path).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn read_json_lenient_ignores_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corrupt.json");
        fs::write(&path, b"{not valid json").unwrap();

        let result: Option<TestData> = read_json_lenient(&path);
        assert!(result.is_none());
    }
}
