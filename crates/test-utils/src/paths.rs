//! Temporary file helpers for tests that read or write datasets.

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Creates a temporary directory for test output.
///
/// The directory is removed when the returned handle is dropped.
pub fn temp_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Writes `contents` to `name` inside a fresh temporary directory.
///
/// Keep the returned `TempDir` alive for as long as the path is used.
pub fn write_fixture(name: &str, contents: &str) -> (TempDir, PathBuf) {
    let dir = temp_test_dir();
    let path = write_fixture_in(&dir, name, contents);
    (dir, path)
}

/// Writes `contents` to `name` inside an existing directory.
pub fn write_fixture_in(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("Failed to write fixture");
    path
}
