//! Filesystem fixtures for worker and session tests.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

const COOKIE_HEADER: &str = "# Netscape HTTP Cookie File\n";

/// Create a disposable directory removed on drop.
///
/// # Errors
///
/// Returns an error if the temporary directory cannot be created.
pub fn scratch_root() -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix("mediadrop-test-")
        .tempdir()
        .context("failed to create scratch root")
}

/// Write a POSIX `sh` script standing in for the external worker.
///
/// Launch it through `/bin/sh` with the returned path as the script argument
/// rather than executing it directly.
///
/// # Errors
///
/// Returns an error if the script cannot be written.
pub fn write_worker_script(dir: &Path, name: &str, body: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n"))
        .with_context(|| format!("failed to write worker script {}", path.display()))?;
    #[cfg(unix)]
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
        .with_context(|| format!("failed to mark {} executable", path.display()))?;
    Ok(path)
}

/// Write a cookie file of exactly `size` bytes (at least the Netscape header).
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_cookie_file(dir: &Path, name: &str, size: usize) -> Result<PathBuf> {
    let mut contents = String::from(COOKIE_HEADER);
    if size > contents.len() {
        contents.push_str(&"#".repeat(size - contents.len()));
    } else {
        contents.truncate(size);
    }
    let path = dir.join(name);
    fs::write(&path, contents)
        .with_context(|| format!("failed to write cookie file {}", path.display()))?;
    Ok(path)
}

/// Write an arbitrary asset file into a session directory.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_asset(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, bytes).with_context(|| format!("failed to write asset {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_file_matches_requested_size() -> Result<()> {
        let root = scratch_root()?;
        let large = write_cookie_file(root.path(), "instagram.txt", 128)?;
        let small = write_cookie_file(root.path(), "tiny.txt", 10)?;
        assert_eq!(fs::metadata(large)?.len(), 128);
        assert_eq!(fs::metadata(small)?.len(), 10);
        Ok(())
    }

    #[test]
    fn worker_script_carries_shebang() -> Result<()> {
        let root = scratch_root()?;
        let script = write_worker_script(root.path(), "worker.sh", "echo hi")?;
        let body = fs::read_to_string(script)?;
        assert!(body.starts_with("#!/bin/sh\n"));
        assert!(body.contains("echo hi"));
        Ok(())
    }
}
