//! Filesystem utilities.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};

/// Remove a file, treating "not found" as success.
///
/// Returns `true` when a file was actually removed.
pub fn remove_file_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("failed to remove file: {}", path.display())),
    }
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_dir(parent)?;
        }
    }
    fs::write(path, contents).with_context(|| format!("failed to write file: {}", path.display()))
}

/// Modification time of a file, or `None` if it does not exist.
pub fn mtime(path: &Path) -> Result<Option<SystemTime>> {
    match fs::metadata(path) {
        Ok(meta) => {
            let modified = meta
                .modified()
                .with_context(|| format!("failed to read mtime: {}", path.display()))?;
            Ok(Some(modified))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("failed to stat: {}", path.display())),
    }
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

/// Lexically normalize a relative path (drops `.` components).
pub fn clean_relative(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_remove_file_if_exists_twice() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.o");
        fs::write(&file, "obj").unwrap();

        assert!(remove_file_if_exists(&file).unwrap());
        assert!(!remove_file_if_exists(&file).unwrap());
    }

    #[test]
    fn test_mtime_missing_file() {
        let tmp = TempDir::new().unwrap();
        assert!(mtime(&tmp.path().join("nope")).unwrap().is_none());

        let file = tmp.path().join("yes");
        fs::write(&file, "").unwrap();
        assert!(mtime(&file).unwrap().is_some());
    }

    #[test]
    fn test_write_string_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("build/out/stub.py");
        write_string(&file, "pass\n").unwrap();
        assert_eq!(read_to_string(&file).unwrap(), "pass\n");
    }

    #[test]
    fn test_clean_relative() {
        assert_eq!(
            clean_relative(Path::new("./SerialInterface.o")),
            PathBuf::from("SerialInterface.o")
        );
        assert_eq!(
            clean_relative(Path::new("build/./a.o")),
            PathBuf::from("build/a.o")
        );
    }
}
