//! Session directory allocation, lookup, and reclamation.
//!
//! # Design
//!
//! - Each fetch owns `root/<uuid>`; ids are random so allocation needs no lock.
//! - Directories are created exclusively; a collision retries with a fresh id.
//! - Lookups only ever resolve to direct children of the canonical root.
//! - The sweep only touches entries whose names are hyphenated UUIDs.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use mediadrop_core::SessionId;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{SessionError, SessionResult};

#[cfg(unix)]
use std::os::unix::fs::DirBuilderExt;

/// Bounded number of fresh ids tried before allocation gives up.
pub const MAX_ALLOCATION_ATTEMPTS: usize = 8;

#[cfg(unix)]
const SESSION_DIR_MODE: u32 = 0o700;

/// One fetch's storage scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSession {
    id: SessionId,
    dir: PathBuf,
    created_at: DateTime<Utc>,
}

impl FetchSession {
    /// Session identifier handed to clients.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Backing directory the worker writes into.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Allocation time.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Outcome of one retention sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Session directories inspected.
    pub examined: usize,
    /// Expired directories removed.
    pub removed: usize,
    /// Expired directories that could not be removed.
    pub failed: usize,
}

/// Filesystem-backed store of fetch sessions under a single root.
#[derive(Debug, Clone)]
pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    /// Open (creating if needed) the store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] when the root cannot be created or resolved.
    pub fn open(root: impl AsRef<Path>) -> SessionResult<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root).map_err(|err| SessionError::io("store.open", root, err))?;
        let root = root
            .canonicalize()
            .map_err(|err| SessionError::io("store.canonicalize", root, err))?;
        Ok(Self { root })
    }

    /// Canonical root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Allocate a fresh, empty session directory.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] when the directory cannot be created and
    /// [`SessionError::AllocationExhausted`] after repeated collisions.
    pub fn create(&self) -> SessionResult<FetchSession> {
        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            let id = SessionId::random();
            let dir = self.root.join(id.to_string());
            match create_private_dir(&dir) {
                Ok(()) => {
                    debug!(session_id = %id, attempt, "session allocated");
                    return Ok(FetchSession {
                        id,
                        dir,
                        created_at: Utc::now(),
                    });
                }
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                    warn!(session_id = %id, attempt, "session id collision");
                }
                Err(err) => return Err(SessionError::io("store.create", dir, err)),
            }
        }
        Err(SessionError::AllocationExhausted {
            attempts: MAX_ALLOCATION_ATTEMPTS,
        })
    }

    /// Remove a session directory and everything in it; missing is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] when removal fails for another reason.
    pub fn discard(&self, session: &FetchSession) -> SessionResult<()> {
        match fs::remove_dir_all(&session.dir) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(SessionError::io("store.discard", &session.dir, err)),
        }
    }

    /// Resolve an untrusted session fragment to an existing session directory.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] for anything that is not a session
    /// directory directly under the root.
    pub fn locate(&self, fragment: &str) -> SessionResult<(SessionId, PathBuf)> {
        let id = SessionId::from_fragment(fragment).ok_or(SessionError::NotFound)?;
        let candidate = self.root.join(id.to_string());
        let canonical = candidate
            .canonicalize()
            .map_err(|_| SessionError::NotFound)?;
        if canonical.parent() != Some(self.root.as_path()) || !canonical.is_dir() {
            return Err(SessionError::NotFound);
        }
        Ok((id, canonical))
    }

    /// Delete session directories last modified more than `max_age` ago.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Walkdir`] when the root cannot be listed.
    pub fn sweep_expired(&self, max_age: Duration) -> SessionResult<SweepReport> {
        let cutoff = SystemTime::now()
            .checked_sub(max_age)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let mut report = SweepReport::default();

        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
        {
            let entry = entry.map_err(|err| SessionError::walkdir("store.sweep", &self.root, err))?;
            if !entry.file_type().is_dir() || !is_session_name(entry.file_name().to_str()) {
                continue;
            }
            report.examined += 1;
            let modified = entry
                .metadata()
                .ok()
                .and_then(|meta| meta.modified().ok())
                .unwrap_or_else(SystemTime::now);
            if modified > cutoff {
                continue;
            }
            match fs::remove_dir_all(entry.path()) {
                Ok(()) => report.removed += 1,
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    report.failed += 1;
                    warn!(path = %entry.path().display(), error = %err, "failed to reclaim session");
                }
            }
        }
        Ok(report)
    }
}

fn is_session_name(name: Option<&str>) -> bool {
    name.is_some_and(|name| SessionId::from_fragment(name).is_some_and(|id| id.to_string() == name))
}

fn create_private_dir(dir: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    #[cfg(unix)]
    builder.mode(SESSION_DIR_MODE);
    builder.create(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use mediadrop_test_support::fixtures::scratch_root;

    #[test]
    fn create_allocates_private_directory() -> Result<()> {
        let root = scratch_root()?;
        let store = SessionStore::open(root.path().join("downloads"))?;
        let before = Utc::now();
        let session = store.create()?;
        assert!(session.created_at() >= before && session.created_at() <= Utc::now());
        assert!(session.dir().is_dir());
        assert_eq!(session.dir().parent(), Some(store.root()));
        assert_eq!(
            session.dir().file_name().and_then(|name| name.to_str()),
            Some(session.id().to_string().as_str())
        );
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(session.dir())?.permissions().mode() & 0o777;
            assert_eq!(mode & 0o077, 0, "session dir must not be group/world accessible");
        }
        Ok(())
    }

    #[test]
    fn discard_is_idempotent() -> Result<()> {
        let root = scratch_root()?;
        let store = SessionStore::open(root.path())?;
        let session = store.create()?;
        fs::write(session.dir().join("clip.mp4"), b"data")?;
        store.discard(&session)?;
        assert!(!session.dir().exists());
        store.discard(&session)?;
        Ok(())
    }

    #[test]
    fn locate_rejects_traversal_and_unknown_ids() -> Result<()> {
        let root = scratch_root()?;
        let store = SessionStore::open(root.path().join("downloads"))?;
        let session = store.create()?;
        let (id, dir) = store.locate(&session.id().to_string())?;
        assert_eq!(id, session.id());
        assert_eq!(dir, session.dir());

        fs::create_dir_all(root.path().join("downloads").join("scratch"))?;
        let unknown = SessionId::random().to_string();
        for fragment in ["..", ".", "", "scratch", "/etc", "../downloads", unknown.as_str()] {
            assert!(
                matches!(store.locate(fragment), Err(SessionError::NotFound)),
                "{fragment:?} must not resolve"
            );
        }
        Ok(())
    }

    #[test]
    fn sweep_removes_only_expired_session_dirs() -> Result<()> {
        let root = scratch_root()?;
        let store = SessionStore::open(root.path())?;
        let expired = store.create()?;
        let fresh = store.create()?;
        let unrelated = root.path().join("keep-me");
        fs::create_dir_all(&unrelated)?;

        let past = SystemTime::now() - Duration::from_secs(7_200);
        for dir in [expired.dir(), unrelated.as_path()] {
            fs::File::open(dir)?.set_modified(past)?;
        }

        let report = store.sweep_expired(Duration::from_secs(3_600))?;
        assert_eq!(report.examined, 2);
        assert_eq!(report.removed, 1);
        assert!(!expired.dir().exists());
        assert!(fresh.dir().exists());
        assert!(unrelated.exists());
        Ok(())
    }
}
