//! Local filesystem access for the flat backing files.
//!
//! Reads treat a missing file as "no data". Whole-file rewrites go through
//! a temporary sibling and a rename so a reader never sees half a file.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

/// Read a text file, returning `None` if it doesn't exist.
pub fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AppError::Io(e)),
    }
}

/// Ensure the parent directory of a path exists.
fn ensure_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Write a file atomically (write to temp, then rename).
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    ensure_dir(path)?;

    let tmp = tmp_path(path);
    let mut file = fs::File::create(&tmp)?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    drop(file);

    fs::rename(&tmp, path)?;
    Ok(())
}

/// Append one line to a file, creating it if needed.
///
/// A newline is inserted first when the existing file does not end in one.
pub fn append_line(path: &Path, line: &str) -> Result<()> {
    ensure_dir(path)?;

    let needs_newline = match read_optional(path)? {
        Some(existing) => !existing.is_empty() && !existing.ends_with('\n'),
        None => false,
    };

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if needs_newline {
        file.write_all(b"\n")?;
    }
    file.write_all(line.as_bytes())?;
    file.write_all(b"\n")?;
    file.flush()?;
    Ok(())
}

/// Render a header and rows as file content with a trailing newline.
pub fn render_lines(header: Option<&str>, rows: impl IntoIterator<Item = String>) -> String {
    let mut content = String::new();
    if let Some(header) = header {
        content.push_str(header);
        content.push('\n');
    }
    for row in rows {
        content.push_str(&row);
        content.push('\n');
    }
    content
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/users.txt");

        write_atomic(&path, "hello\n").unwrap();
        assert_eq!(read_optional(&path).unwrap().as_deref(), Some("hello\n"));
        assert!(!tmp.path().join("nested/users.txt.tmp").exists());
    }

    #[test]
    fn test_read_nonexistent() {
        let tmp = TempDir::new().unwrap();
        assert!(read_optional(&tmp.path().join("nope.txt")).unwrap().is_none());
    }

    #[test]
    fn test_append_line_adds_missing_newline() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("payments.txt");

        fs::write(&path, "P1/a").unwrap();
        append_line(&path, "P2/b").unwrap();
        append_line(&path, "P3/c").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "P1/a\nP2/b\nP3/c\n");
    }

    #[test]
    fn test_render_lines() {
        let content = render_lines(Some("id/name"), vec!["1/a".to_string(), "2/b".to_string()]);
        assert_eq!(content, "id/name\n1/a\n2/b\n");
        assert_eq!(render_lines(None, Vec::new()), "");
    }
}
