//! Credential bundle discovery.
//!
//! # Design
//!
//! - A configured path names either one cookie file or a directory of `*.txt` files.
//! - Directory entries must be readable and larger than [`MIN_COOKIE_BYTES`].
//! - `instagram.txt` is tried first, then the most recently modified files.
//! - Discovery runs fresh on every call so rotated cookies are picked up.

use std::cmp::Reverse;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use mediadrop_core::{CredentialBundle, WorkerError, WorkerResult};
use tracing::debug;

/// Minimum size for a cookie file to be considered usable.
pub const MIN_COOKIE_BYTES: u64 = 50;

const PREFERRED_COOKIE_FILE: &str = "instagram.txt";
const COOKIE_EXTENSION: &str = "txt";

/// Resolve the credential bundle for the configured path.
///
/// # Errors
///
/// Returns [`WorkerError::PreconditionMissing`] when the path does not exist
/// or yields no usable cookie file.
pub fn discover_credentials(path: &Path) -> WorkerResult<CredentialBundle> {
    let path = &std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let missing = || WorkerError::PreconditionMissing {
        requirement: "credentials",
        path: Some(path.to_path_buf()),
    };
    let metadata = fs::metadata(path).map_err(|_| missing())?;

    if metadata.is_file() {
        return if is_usable(path, metadata.len()) {
            Ok(CredentialBundle::single(path.to_path_buf()))
        } else {
            Err(missing())
        };
    }

    let entries = fs::read_dir(path).map_err(|_| missing())?;
    let mut candidates: Vec<(PathBuf, bool, SystemTime)> = Vec::new();
    for entry in entries.flatten() {
        let candidate = entry.path();
        if candidate.extension().and_then(|ext| ext.to_str()) != Some(COOKIE_EXTENSION) {
            continue;
        }
        let Ok(meta) = fs::metadata(&candidate) else {
            continue;
        };
        if !meta.is_file() || !is_usable(&candidate, meta.len()) {
            debug!(file = ?candidate.file_name(), size = meta.len(), "skipping cookie file");
            continue;
        }
        let preferred = candidate.file_name().and_then(|name| name.to_str())
            == Some(PREFERRED_COOKIE_FILE);
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        candidates.push((candidate, preferred, modified));
    }

    if candidates.is_empty() {
        return Err(missing());
    }
    candidates.sort_by_key(|(candidate, preferred, modified)| {
        (Reverse(*preferred), Reverse(*modified), candidate.clone())
    });
    Ok(CredentialBundle::ordered(
        candidates.into_iter().map(|(candidate, _, _)| candidate).collect(),
    ))
}

fn is_usable(path: &Path, len: u64) -> bool {
    len > MIN_COOKIE_BYTES && File::open(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use mediadrop_test_support::fixtures::{scratch_root, write_cookie_file};

    #[test]
    fn prefers_instagram_txt_then_newest() -> Result<()> {
        let root = scratch_root()?;
        let older = write_cookie_file(root.path(), "older.txt", 200)?;
        let newer = write_cookie_file(root.path(), "newer.txt", 200)?;
        let preferred = write_cookie_file(root.path(), "instagram.txt", 200)?;
        write_cookie_file(root.path(), "tiny.txt", 20)?;
        write_cookie_file(root.path(), "notes.md", 500)?;

        let past = SystemTime::now() - std::time::Duration::from_secs(3_600);
        File::options().write(true).open(&older)?.set_modified(past)?;
        File::options()
            .write(true)
            .open(&preferred)?
            .set_modified(past - std::time::Duration::from_secs(3_600))?;

        let bundle = discover_credentials(root.path())?;
        assert_eq!(
            bundle.file_names(),
            vec!["instagram.txt", "newer.txt", "older.txt"]
        );
        let decoded: Vec<PathBuf> = serde_json::from_str(bundle.argument())?;
        assert_eq!(decoded, vec![preferred, newer, older]);
        Ok(())
    }

    #[test]
    fn single_file_passes_plain_path() -> Result<()> {
        let root = scratch_root()?;
        let cookie = write_cookie_file(root.path(), "session.txt", 120)?;
        let bundle = discover_credentials(&cookie)?;
        assert_eq!(bundle.argument(), cookie.to_string_lossy());
        Ok(())
    }

    #[test]
    fn empty_or_missing_path_is_a_precondition_failure() -> Result<()> {
        let root = scratch_root()?;
        write_cookie_file(root.path(), "tiny.txt", 10)?;
        for path in [root.path().to_path_buf(), root.path().join("absent")] {
            let err = discover_credentials(&path).expect_err("no usable cookies");
            assert!(matches!(
                err,
                WorkerError::PreconditionMissing {
                    requirement: "credentials",
                    ..
                }
            ));
        }
        Ok(())
    }
}
