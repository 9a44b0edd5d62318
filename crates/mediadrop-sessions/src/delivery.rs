//! Single-file delivery resolution.

use std::path::{Path, PathBuf};

use mediadrop_core::{SessionId, basename};

use crate::error::{SessionError, SessionResult};
use crate::store::SessionStore;

/// Fallback content type for unknown extensions.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

const CONTENT_TYPES: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("mkv", "video/x-matroska"),
    ("mov", "video/quicktime"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
];

/// Media extensions stored without recompression in archives.
pub(crate) fn is_media(name: &str) -> bool {
    extension(name).is_some_and(|ext| CONTENT_TYPES.iter().any(|(known, _)| *known == ext))
}

/// Content type for a file name, by extension.
#[must_use]
pub fn content_type_for(name: &str) -> &'static str {
    extension(name)
        .and_then(|ext| {
            CONTENT_TYPES
                .iter()
                .find(|(known, _)| *known == ext)
                .map(|(_, mime)| *mime)
        })
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// A file resolved for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFile {
    /// Owning session.
    pub session: SessionId,
    /// Canonical path of the file.
    pub path: PathBuf,
    /// Basename used for `Content-Disposition`.
    pub file_name: String,
    /// Content type from the static table.
    pub content_type: &'static str,
    /// File size in bytes.
    pub len: u64,
}

impl SessionStore {
    /// Resolve untrusted session and file fragments to a deliverable file.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] for every kind of miss: unknown
    /// session, traversal attempts, missing files and non-regular files.
    pub fn resolve_file(&self, session: &str, file_name: &str) -> SessionResult<DeliveryFile> {
        let name = basename(file_name).ok_or(SessionError::NotFound)?;
        let (id, dir) = self.locate(session)?;
        let canonical = dir
            .join(name)
            .canonicalize()
            .map_err(|_| SessionError::NotFound)?;
        if canonical.parent() != Some(dir.as_path()) {
            return Err(SessionError::NotFound);
        }
        let metadata = canonical.metadata().map_err(|_| SessionError::NotFound)?;
        if !metadata.is_file() {
            return Err(SessionError::NotFound);
        }
        Ok(DeliveryFile {
            session: id,
            content_type: content_type_for(name),
            file_name: name.to_string(),
            len: metadata.len(),
            path: canonical,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use mediadrop_test_support::fixtures::{scratch_root, write_asset};

    #[test]
    fn content_types_follow_extension_table() {
        assert_eq!(content_type_for("clip.MP4"), "video/mp4");
        assert_eq!(content_type_for("clip.mkv"), "video/x-matroska");
        assert_eq!(content_type_for("clip.mov"), "video/quicktime");
        assert_eq!(content_type_for("a.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("notes.txt"), DEFAULT_CONTENT_TYPE);
        assert_eq!(content_type_for("noext"), DEFAULT_CONTENT_TYPE);
        assert!(is_media("x.webp"));
        assert!(!is_media("x.json"));
    }

    #[test]
    fn resolves_regular_files_in_session() -> Result<()> {
        let root = scratch_root()?;
        let store = SessionStore::open(root.path())?;
        let session = store.create()?;
        write_asset(session.dir(), "clip.mp4", b"0123456789")?;

        let file = store.resolve_file(&session.id().to_string(), "clip.mp4")?;
        assert_eq!(file.session, session.id());
        assert_eq!(file.len, 10);
        assert_eq!(file.content_type, "video/mp4");
        assert_eq!(file.file_name, "clip.mp4");
        Ok(())
    }

    #[test]
    fn traversal_and_misses_are_not_found() -> Result<()> {
        let root = scratch_root()?;
        let store = SessionStore::open(root.path().join("downloads"))?;
        let session = store.create()?;
        let sid = session.id().to_string();
        std::fs::create_dir(session.dir().join("nested"))?;
        write_asset(root.path(), "outside.txt", b"secret")?;
        #[cfg(unix)]
        std::os::unix::fs::symlink(
            root.path().join("outside.txt"),
            session.dir().join("escape.txt"),
        )?;

        let cases = [
            (sid.as_str(), "../../etc/passwd"),
            (sid.as_str(), "/etc/passwd"),
            (sid.as_str(), ".."),
            (sid.as_str(), ""),
            (sid.as_str(), "nested"),
            (sid.as_str(), "missing.mp4"),
            (sid.as_str(), "escape.txt"),
            ("..", "outside.txt"),
            ("not-a-uuid", "clip.mp4"),
        ];
        for (session_fragment, file_fragment) in cases {
            assert!(
                matches!(
                    store.resolve_file(session_fragment, file_fragment),
                    Err(SessionError::NotFound)
                ),
                "{session_fragment:?}/{file_fragment:?} must be not found"
            );
        }
        Ok(())
    }
}
