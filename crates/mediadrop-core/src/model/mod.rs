//! Core media pipeline domain types shared across the workspace.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::paths::basename;

/// Extensions the worker produces for video assets.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mkv", "mov"];

/// Kind of media carried by an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Moving picture (with or without audio).
    Video,
    /// Still picture.
    Image,
}

impl MediaKind {
    /// Infer the media kind from a file extension.
    #[must_use]
    pub fn from_extension(extension: &str) -> Self {
        let lowered = extension.trim_start_matches('.').to_ascii_lowercase();
        if VIDEO_EXTENSIONS.contains(&lowered.as_str()) {
            Self::Video
        } else {
            Self::Image
        }
    }

    /// Parse the worker's `type` label; `photo` is accepted as an alias.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "video" => Some(Self::Video),
            "image" | "photo" => Some(Self::Image),
            _ => None,
        }
    }

    /// Stable label used in responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Image => "image",
        }
    }
}

/// Post shape the source URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// `/p/{id}` feed post (photo, video or carousel).
    Post,
    /// `/reel/{id}` or `/reels/{id}`.
    Reel,
    /// `/tv/{id}` long-form video.
    Tv,
    /// `/stories/{user}/{id}`.
    Story,
}

impl SourceKind {
    /// Stable label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Reel => "reel",
            Self::Tv => "tv",
            Self::Story => "story",
        }
    }
}

/// One file the worker reports having written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerAsset {
    /// Server-side path as reported by the worker; never exposed to clients.
    pub path: String,
    /// Video or image.
    pub kind: MediaKind,
    /// File format (extension without the dot).
    pub format: String,
    /// Quality label, e.g. `1080p` or `Original`.
    pub quality: String,
    /// Remote thumbnail URL reported by the worker.
    pub thumbnail: Option<String>,
    /// Local thumbnail file written next to the asset.
    pub thumbnail_file: Option<String>,
}

impl WorkerAsset {
    /// Basename of the reported path.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        basename(&self.path)
    }
}

/// Successful worker run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSuccess {
    /// Content type label reported by the worker (`video`, `image`, `carousel`, ...).
    pub content_type: Option<String>,
    /// Account that published the content.
    pub username: String,
    /// Caption text (possibly empty).
    pub caption: String,
    /// Post-level thumbnail URL.
    pub thumbnail: Option<String>,
    /// Assets written into the session directory.
    pub items: Vec<WorkerAsset>,
}

/// Domain failure reported by the worker itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerFailure {
    /// Human-readable message produced by the worker.
    pub message: String,
    /// Worker-specific error category, e.g. `private_content`.
    pub error_type: String,
}

/// Structured result of one worker run: success XOR failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerReply {
    /// Media was fetched.
    Success(WorkerSuccess),
    /// The worker reported a domain failure.
    Failure(WorkerFailure),
}

/// Fixed set of client-facing failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    /// Input failed shape validation.
    InvalidUrl,
    /// Server configuration prerequisite missing.
    PreconditionMissing,
    /// Worker exceeded its time budget.
    WorkerTimeout,
    /// Worker output could not be decoded.
    ParseError,
    /// Worker reported a domain failure.
    BusinessError,
    /// Local IO failure while allocating or spawning.
    InternalError,
    /// Delivery target does not exist.
    NotFound,
}

impl FailureCategory {
    /// Wire label used as `error_type`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidUrl => "invalid_url",
            Self::PreconditionMissing => "precondition_missing",
            Self::WorkerTimeout => "worker_timeout",
            Self::ParseError => "parse_error",
            Self::BusinessError => "business_error",
            Self::InternalError => "internal_error",
            Self::NotFound => "not_found",
        }
    }

    /// Whether the failure stems from the caller's input or the content itself.
    #[must_use]
    pub const fn is_client_side(self) -> bool {
        matches!(self, Self::InvalidUrl | Self::BusinessError | Self::NotFound)
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credential argument handed to the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialBundle {
    files: Vec<PathBuf>,
    argument: String,
}

impl CredentialBundle {
    /// Bundle backed by a single credential file passed as a plain path.
    #[must_use]
    pub fn single(path: PathBuf) -> Self {
        let argument = path.to_string_lossy().into_owned();
        Self {
            files: vec![path],
            argument,
        }
    }

    /// Bundle backed by several credential files, tried by the worker in order.
    ///
    /// The worker receives the list as a JSON array of paths.
    #[must_use]
    pub fn ordered(files: Vec<PathBuf>) -> Self {
        let paths: Vec<String> = files
            .iter()
            .map(|path| path.to_string_lossy().into_owned())
            .collect();
        let argument = serde_json::Value::from(paths).to_string();
        Self { files, argument }
    }

    /// Value passed to the worker as its credential argument.
    #[must_use]
    pub fn argument(&self) -> &str {
        &self.argument
    }

    /// Number of credential files in the bundle.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the bundle carries no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// File names in try order, safe for logs.
    #[must_use]
    pub fn file_names(&self) -> Vec<String> {
        self.files
            .iter()
            .filter_map(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect()
    }
}

/// Opaque identifier of a fetch session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Allocate a fresh random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Interpret an untrusted path fragment as a session identifier.
    ///
    /// The fragment is reduced to its basename first; anything that is not a
    /// hyphenated UUID afterwards is rejected.
    #[must_use]
    pub fn from_fragment(raw: &str) -> Option<Self> {
        let candidate = basename(raw)?;
        if candidate.len() != uuid::fmt::Hyphenated::LENGTH {
            return None;
        }
        Uuid::try_parse(candidate).ok().map(Self)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_kind_infers_video_extensions() {
        assert_eq!(MediaKind::from_extension("MP4"), MediaKind::Video);
        assert_eq!(MediaKind::from_extension(".webm"), MediaKind::Video);
        assert_eq!(MediaKind::from_extension("jpg"), MediaKind::Image);
        assert_eq!(MediaKind::from_extension(""), MediaKind::Image);
        assert_eq!(MediaKind::from_label("Photo"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_label("audio"), None);
    }

    #[test]
    fn credential_bundle_encodes_ordered_list_as_json() -> anyhow::Result<()> {
        let bundle = CredentialBundle::ordered(vec![
            PathBuf::from("/srv/cookies/instagram.txt"),
            PathBuf::from("/srv/cookies/backup 1.txt"),
        ]);
        let decoded: Vec<String> = serde_json::from_str(bundle.argument())?;
        assert_eq!(
            decoded,
            vec!["/srv/cookies/instagram.txt", "/srv/cookies/backup 1.txt"]
        );
        assert_eq!(bundle.len(), 2);
        assert_eq!(bundle.file_names(), vec!["instagram.txt", "backup 1.txt"]);

        let single = CredentialBundle::single(PathBuf::from("/srv/cookies.txt"));
        assert_eq!(single.argument(), "/srv/cookies.txt");
        Ok(())
    }

    #[test]
    fn session_id_rejects_non_uuid_fragments() {
        let id = SessionId::random();
        let rendered = id.to_string();
        assert_eq!(SessionId::from_fragment(&rendered), Some(id));
        assert_eq!(
            SessionId::from_fragment(&format!("../../{rendered}")),
            Some(id)
        );
        assert_eq!(SessionId::from_fragment(".."), None);
        assert_eq!(SessionId::from_fragment("scratch"), None);
        assert_eq!(
            SessionId::from_fragment(&rendered.replace('-', "")),
            None,
            "simple-format ids must not alias hyphenated directories"
        );
    }

    #[test]
    fn failure_category_labels_are_stable() {
        assert_eq!(FailureCategory::InvalidUrl.as_str(), "invalid_url");
        assert_eq!(FailureCategory::NotFound.to_string(), "not_found");
        assert!(FailureCategory::BusinessError.is_client_side());
        assert!(!FailureCategory::ParseError.is_client_side());
    }
}
