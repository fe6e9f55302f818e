//! Filesystem helpers for provisioning steps.
//!
//! Small wrappers over `std::fs` that add path context to errors and the
//! create-parents / skip-if-exists conventions the command handlers rely on.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use tracing::debug;

use crate::exec;

/// Read a file to a string.
///
/// # Errors
///
/// When the file cannot be read.
pub fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Read a file as lines, treating a missing file as empty.
///
/// # Errors
///
/// When the file exists but cannot be read.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    Ok(read(path)?.lines().map(str::to_owned).collect())
}

/// Write a file, creating parent directories as needed.
///
/// # Errors
///
/// When a parent directory or the file cannot be created.
pub fn write(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    debug!(path = %path.display(), "wrote file");
    Ok(())
}

/// Append a line to a file, creating it (and parents) when absent. The line
/// is written with a trailing newline.
///
/// # Errors
///
/// When the file cannot be read or written.
pub fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut body = if path.exists() { read(path)? } else { String::new() };
    if !body.is_empty() && !body.ends_with('\n') {
        body.push('\n');
    }
    body.push_str(line);
    body.push('\n');
    write(path, &body)
}

/// Whether any line of the file equals `line` exactly. Missing files contain
/// nothing.
///
/// # Errors
///
/// When the file exists but cannot be read.
pub fn contains_line(path: &Path, line: &str) -> Result<bool> {
    Ok(read_lines(path)?.iter().any(|l| l == line))
}

/// Snapshot a file as `<path>.<suffix>` and return the backup path. When the
/// backup already exists it is left alone, so the first run's snapshot stays
/// the pristine prototype across re-runs.
///
/// # Errors
///
/// When the copy fails.
pub fn backup(path: &Path, suffix: &str) -> Result<PathBuf> {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    let backup_path = PathBuf::from(name);
    if backup_path.exists() {
        debug!(path = %backup_path.display(), "backup already present");
        return Ok(backup_path);
    }
    fs::copy(path, &backup_path).with_context(|| {
        format!(
            "Failed to back up {} to {}",
            path.display(),
            backup_path.display()
        )
    })?;
    debug!(path = %backup_path.display(), "created backup");
    Ok(backup_path)
}

/// Set file permissions from an octal mode.
///
/// # Errors
///
/// When the permissions cannot be changed.
#[cfg(unix)]
pub fn chmod(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt as _;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .with_context(|| format!("Failed to chmod {}", path.display()))
}

/// Change file ownership via the system `chown` binary.
///
/// # Errors
///
/// When `chown` fails.
pub fn chown(path: &Path, owner: &str) -> Result<()> {
    let path_str = path
        .to_str()
        .with_context(|| format!("Non-UTF-8 path {}", path.display()))?;
    exec::run("chown", &[owner, path_str])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_lines_missing_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let lines = read_lines(&dir.path().join("absent")).expect("missing file is fine");
        assert!(lines.is_empty());
    }

    #[test]
    fn write_creates_parents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("a/b/c.txt");
        write(&path, "hello\n").expect("write");
        assert_eq!(read(&path).expect("read back"), "hello\n");
    }

    #[test]
    fn append_line_adds_newline_and_creates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("hosts");
        append_line(&path, "127.0.0.1").expect("first append");
        append_line(&path, "::1").expect("second append");
        assert_eq!(read(&path).expect("read back"), "127.0.0.1\n::1\n");
    }

    #[test]
    fn contains_line_is_exact() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("domains");
        write(&path, "example.com\nexample.org\n").expect("seed");
        assert!(contains_line(&path, "example.com").expect("check"));
        assert!(!contains_line(&path, "example").expect("check"));
    }

    #[test]
    fn backup_is_created_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("main.cf");
        write(&path, "original\n").expect("seed");

        let bak = backup(&path, "bak").expect("first backup");
        assert_eq!(read(&bak).expect("read backup"), "original\n");

        write(&path, "modified\n").expect("mutate");
        let again = backup(&path, "bak").expect("second backup");
        assert_eq!(again, bak);
        assert_eq!(
            read(&bak).expect("read backup"),
            "original\n",
            "existing backup must not be overwritten"
        );
    }

    #[cfg(unix)]
    #[test]
    fn chmod_sets_mode() {
        use std::os::unix::fs::PermissionsExt as _;
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sasldb2");
        write(&path, "").expect("seed");
        chmod(&path, 0o400).expect("chmod");
        let mode = fs::metadata(&path).expect("stat").permissions().mode();
        assert_eq!(mode & 0o777, 0o400);
    }
}
