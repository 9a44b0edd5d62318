//! Translation of worker asset paths into client download links.
//!
//! # Design
//!
//! - Clients only ever see `{base}/download/{session}/{basename}`; server paths never leak.
//! - An asset is linked only if its basename names a regular file in the session directory.
//! - Local thumbnails become session links; remote `http(s)` thumbnails pass through.

use std::fs;
use std::path::Path;

use mediadrop_core::{MediaKind, SessionId, WorkerAsset, WorkerSuccess, basename};
use serde::Serialize;
use tracing::warn;

use crate::store::FetchSession;

/// Route prefix for single-file downloads.
pub const DOWNLOAD_ROUTE: &str = "/download";
/// Route prefix for whole-session archives.
pub const DOWNLOAD_ALL_ROUTE: &str = "/download-all";

/// One downloadable item as presented to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientAsset {
    /// 1-based position within the fetch.
    pub id: usize,
    /// Video or image.
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// File format.
    pub format: String,
    /// Quality label.
    pub quality: String,
    /// Basename inside the session.
    pub filename: String,
    /// Link to the single-file delivery route.
    pub download_url: String,
    /// Thumbnail link, local or remote.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

/// Client-safe view of a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedFetch {
    /// Linked assets in worker order.
    pub items: Vec<ClientAsset>,
    /// Post-level thumbnail, remote only.
    pub thumbnail: Option<String>,
    /// Link to the archive route for the session.
    pub download_all_url: String,
    /// Number of worker assets that could not be linked.
    pub dropped: usize,
}

/// Builds download links under an optional public base URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkBuilder {
    base: String,
}

impl LinkBuilder {
    /// Links prefixed with `base`; an empty base yields relative links.
    #[must_use]
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// Link to one file of a session.
    #[must_use]
    pub fn file_url(&self, session: SessionId, file_name: &str) -> String {
        format!(
            "{}{DOWNLOAD_ROUTE}/{session}/{}",
            self.base,
            urlencoding::encode(file_name)
        )
    }

    /// Link to the archive of a session.
    #[must_use]
    pub fn bundle_url(&self, session: SessionId) -> String {
        format!("{}{DOWNLOAD_ALL_ROUTE}/{session}", self.base)
    }

    /// Replace every worker path in `success` with a session link.
    #[must_use]
    pub fn translate(&self, session: &FetchSession, success: &WorkerSuccess) -> TranslatedFetch {
        let mut items = Vec::with_capacity(success.items.len());
        let mut dropped = 0;
        for asset in &success.items {
            match self.translate_asset(session, asset, items.len() + 1) {
                Some(item) => items.push(item),
                None => {
                    dropped += 1;
                    warn!(session_id = %session.id(), "worker asset not present in session");
                }
            }
        }
        TranslatedFetch {
            items,
            thumbnail: success.thumbnail.clone().filter(|url| is_remote(url)),
            download_all_url: self.bundle_url(session.id()),
            dropped,
        }
    }

    fn translate_asset(
        &self,
        session: &FetchSession,
        asset: &WorkerAsset,
        id: usize,
    ) -> Option<ClientAsset> {
        let file_name = asset.file_name().filter(|name| is_session_file(session.dir(), name))?;
        let thumbnail_url = asset
            .thumbnail_file
            .as_deref()
            .and_then(basename)
            .filter(|name| is_session_file(session.dir(), name))
            .map(|name| self.file_url(session.id(), name))
            .or_else(|| asset.thumbnail.clone().filter(|url| is_remote(url)));
        Some(ClientAsset {
            id,
            kind: asset.kind,
            format: asset.format.clone(),
            quality: asset.quality.clone(),
            filename: file_name.to_string(),
            download_url: self.file_url(session.id(), file_name),
            thumbnail_url,
        })
    }
}

fn is_session_file(dir: &Path, name: &str) -> bool {
    fs::symlink_metadata(dir.join(name)).is_ok_and(|meta| meta.is_file())
}

fn is_remote(url: &str) -> bool {
    url::Url::parse(url).is_ok_and(|parsed| matches!(parsed.scheme(), "http" | "https"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SessionStore;
    use anyhow::Result;
    use mediadrop_test_support::fixtures::{scratch_root, write_asset};

    fn asset(path: &str, thumbnail_file: Option<&str>, thumbnail: Option<&str>) -> WorkerAsset {
        WorkerAsset {
            path: path.to_string(),
            kind: MediaKind::from_extension(path.rsplit('.').next().unwrap_or_default()),
            format: "mp4".to_string(),
            quality: "720p".to_string(),
            thumbnail: thumbnail.map(str::to_string),
            thumbnail_file: thumbnail_file.map(str::to_string),
        }
    }

    #[test]
    fn links_use_session_and_encoded_basename() -> Result<()> {
        let root = scratch_root()?;
        let store = SessionStore::open(root.path())?;
        let session = store.create()?;
        write_asset(session.dir(), "my clip #1.mp4", b"v")?;
        write_asset(session.dir(), "thumb.jpg", b"t")?;

        let worker_path = session.dir().join("my clip #1.mp4");
        let success = WorkerSuccess {
            content_type: Some("reel".to_string()),
            username: "someone".to_string(),
            caption: String::new(),
            thumbnail: Some("file:///etc/passwd".to_string()),
            items: vec![asset(
                &worker_path.to_string_lossy(),
                Some(&*session.dir().join("thumb.jpg").to_string_lossy()),
                None,
            )],
        };

        let links = LinkBuilder::new("https://dl.example.com/");
        let translated = links.translate(&session, &success);
        let id = session.id();
        assert_eq!(translated.items.len(), 1);
        let item = &translated.items[0];
        assert_eq!(item.id, 1);
        assert_eq!(item.filename, "my clip #1.mp4");
        assert_eq!(
            item.download_url,
            format!("https://dl.example.com/download/{id}/my%20clip%20%231.mp4")
        );
        assert_eq!(
            item.thumbnail_url.as_deref(),
            Some(format!("https://dl.example.com/download/{id}/thumb.jpg").as_str())
        );
        assert_eq!(translated.thumbnail, None);
        assert_eq!(
            translated.download_all_url,
            format!("https://dl.example.com/download-all/{id}")
        );
        Ok(())
    }

    #[test]
    fn assets_outside_session_are_dropped() -> Result<()> {
        let root = scratch_root()?;
        let store = SessionStore::open(root.path().join("downloads"))?;
        let session = store.create()?;
        let other = store.create()?;
        write_asset(other.dir(), "secret.mp4", b"x")?;
        write_asset(session.dir(), "real.jpg", b"x")?;

        let success = WorkerSuccess {
            content_type: None,
            username: String::new(),
            caption: String::new(),
            thumbnail: Some("https://cdn.example.com/post.jpg".to_string()),
            items: vec![
                asset("/etc/passwd", None, None),
                asset(&other.dir().join("secret.mp4").to_string_lossy(), None, None),
                asset(
                    r"C:\worker\out\real.jpg",
                    Some("missing_thumb.jpg"),
                    Some("https://cdn.example.com/real.jpg"),
                ),
            ],
        };

        let translated = LinkBuilder::default().translate(&session, &success);
        assert_eq!(translated.dropped, 2);
        assert_eq!(translated.items.len(), 1);
        let item = &translated.items[0];
        assert_eq!(item.id, 1);
        assert_eq!(
            item.download_url,
            format!("/download/{}/real.jpg", session.id())
        );
        assert_eq!(
            item.thumbnail_url.as_deref(),
            Some("https://cdn.example.com/real.jpg")
        );
        assert_eq!(
            translated.thumbnail.as_deref(),
            Some("https://cdn.example.com/post.jpg")
        );
        Ok(())
    }
}
