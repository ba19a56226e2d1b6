//! Filesystem utilities.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

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
        ensure_dir(parent)?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write file: {}", path.display()))
}

/// Last path component of a `/` or `\` separated path.
pub fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// First path component of a `/` or `\` separated path.
pub fn top_segment(path: &str) -> &str {
    path.split(['/', '\\']).next().unwrap_or(path)
}

/// Rewrite `/` separators as `\`.
pub fn to_backslashes(path: &str) -> String {
    path.replace('/', "\\")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_string_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a").join("b").join("file.txt");

        write_string(&path, "hello").unwrap();
        assert_eq!(read_to_string(&path).unwrap(), "hello");
    }

    #[test]
    fn test_read_missing_file_mentions_path() {
        let tmp = TempDir::new().unwrap();
        let err = read_to_string(&tmp.path().join("nope.txt")).unwrap_err();
        assert!(err.to_string().contains("nope.txt"));
    }

    #[test]
    fn test_path_segments() {
        assert_eq!(file_name("Dep1\\bin\\a.dll"), "a.dll");
        assert_eq!(file_name("Dep1/bin/a.dll"), "a.dll");
        assert_eq!(file_name("a.dll"), "a.dll");
        assert_eq!(top_segment("Dep1\\bin\\a.dll"), "Dep1");
        assert_eq!(top_segment("Dep1/a.dll"), "Dep1");
        assert_eq!(top_segment("a.dll"), "a.dll");
        assert_eq!(to_backslashes("Dep1/bin/a.dll"), "Dep1\\bin\\a.dll");
    }
}
