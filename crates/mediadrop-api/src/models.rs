//! Request and response bodies of the fetch endpoint.

use mediadrop_core::{SessionId, SourceKind, WorkerSuccess};
use mediadrop_sessions::{ClientAsset, TranslatedFetch};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/fetch`.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchRequest {
    /// Post, reel, tv or story URL.
    #[serde(default)]
    pub url: String,
}

/// Successful fetch: metadata plus download links.
#[derive(Debug, Clone, Serialize)]
pub struct FetchResponse {
    /// Always `true`.
    pub success: bool,
    /// Content type label (`video`, `image`, `carousel`, ...).
    #[serde(rename = "type")]
    pub content_type: String,
    /// Account that published the content.
    pub username: String,
    /// Caption text.
    pub caption: String,
    /// Post-level thumbnail URL.
    pub thumbnail: Option<String>,
    /// Downloadable items.
    pub items: Vec<ClientAsset>,
    /// Archive link for the whole session.
    pub download_all_url: String,
    /// Session that holds the files.
    pub session_id: SessionId,
}

impl FetchResponse {
    pub(crate) fn new(
        session: SessionId,
        source: SourceKind,
        success: WorkerSuccess,
        translated: TranslatedFetch,
    ) -> Self {
        let content_type = success
            .content_type
            .filter(|label| !label.trim().is_empty())
            .unwrap_or_else(|| derive_content_type(source, &translated.items).to_string());
        Self {
            success: true,
            content_type,
            username: success.username,
            caption: success.caption,
            thumbnail: translated.thumbnail,
            items: translated.items,
            download_all_url: translated.download_all_url,
            session_id: session,
        }
    }
}

fn derive_content_type(source: SourceKind, items: &[ClientAsset]) -> &'static str {
    match items {
        [] => source.as_str(),
        [only] => only.kind.as_str(),
        _ => "carousel",
    }
}

/// Failed fetch or delivery.
#[derive(Debug, Clone, Serialize)]
pub struct FailureBody {
    /// Always `false`.
    pub success: bool,
    /// Client-facing message.
    pub error: String,
    /// Failure category or the worker's own error type.
    pub error_type: String,
}
