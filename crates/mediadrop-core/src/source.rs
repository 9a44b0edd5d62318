//! Source URL shape validation.
//!
//! # Design
//!
//! - Validation is purely syntactic; no network access happens here.
//! - A [`SourceUrl`] can only be obtained through [`SourceUrl::parse`].

use std::fmt;

use url::Url;

use crate::error::SourceUrlError;
use crate::model::SourceKind;

/// Longest source URL accepted, in bytes.
pub const MAX_SOURCE_URL_LEN: usize = 2048;

const ACCEPTED_HOSTS: &[&str] = &["instagram.com", "www.instagram.com"];

/// An Instagram post, reel, video or story URL that passed shape validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUrl {
    raw: String,
    kind: SourceKind,
}

impl SourceUrl {
    /// Validate user input as a supported source URL.
    ///
    /// # Errors
    ///
    /// Returns [`SourceUrlError`] when the input is empty, too long, not an
    /// absolute URL, or does not point at a supported post shape.
    pub fn parse(input: &str) -> Result<Self, SourceUrlError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SourceUrlError::Missing);
        }
        if trimmed.len() > MAX_SOURCE_URL_LEN {
            return Err(SourceUrlError::TooLong { len: trimmed.len() });
        }
        let url = Url::parse(trimmed).map_err(|_| SourceUrlError::Malformed)?;
        if url.as_str().len() > MAX_SOURCE_URL_LEN {
            return Err(SourceUrlError::TooLong {
                len: url.as_str().len(),
            });
        }
        if url.cannot_be_a_base() {
            return Err(SourceUrlError::Malformed);
        }
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SourceUrlError::UnsupportedShape { reason: "scheme" });
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(SourceUrlError::UnsupportedShape {
                reason: "credentials",
            });
        }
        if url.port().is_some() {
            return Err(SourceUrlError::UnsupportedShape { reason: "port" });
        }
        let host = url
            .host_str()
            .map(str::to_ascii_lowercase)
            .ok_or(SourceUrlError::UnsupportedShape { reason: "host" })?;
        if !ACCEPTED_HOSTS.contains(&host.as_str()) {
            return Err(SourceUrlError::UnsupportedShape { reason: "host" });
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|parts| parts.filter(|part| !part.is_empty()).collect())
            .unwrap_or_default();
        let kind = classify(&segments)?;

        Ok(Self {
            raw: url.into(),
            kind,
        })
    }

    /// The normalized URL handed to the worker.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Which post shape the URL points at.
    #[must_use]
    pub const fn kind(&self) -> SourceKind {
        self.kind
    }
}

impl fmt::Display for SourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn classify(segments: &[&str]) -> Result<SourceKind, SourceUrlError> {
    let (prefix, rest) = segments
        .split_first()
        .ok_or(SourceUrlError::UnsupportedShape { reason: "path" })?;
    let kind = match prefix.to_ascii_lowercase().as_str() {
        "p" => SourceKind::Post,
        "reel" | "reels" => SourceKind::Reel,
        "tv" => SourceKind::Tv,
        "stories" => SourceKind::Story,
        _ => return Err(SourceUrlError::UnsupportedShape { reason: "path" }),
    };

    let _identifier = rest
        .first()
        .copied()
        .filter(|segment| is_identifier(segment))
        .ok_or(SourceUrlError::UnsupportedShape {
            reason: "identifier",
        })?;

    if kind == SourceKind::Story {
        let story_id = rest.get(1).copied().unwrap_or_default();
        if story_id.is_empty() || !story_id.bytes().all(|byte| byte.is_ascii_digit())
        {
            return Err(SourceUrlError::UnsupportedShape {
                reason: "story_id",
            });
        }
    }

    Ok(kind)
}

fn is_identifier(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|ch| ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_supported_shapes() -> anyhow::Result<()> {
        let cases = [
            ("https://www.instagram.com/p/Cx1_ab-9/", SourceKind::Post),
            ("http://instagram.com/reel/C0ffee", SourceKind::Reel),
            ("https://instagram.com/reels/Abc.def?igsh=xyz", SourceKind::Reel),
            ("https://www.instagram.com/tv/B1234/", SourceKind::Tv),
            (
                "https://WWW.Instagram.com/stories/some.user/3141592653589793/",
                SourceKind::Story,
            ),
        ];
        for (input, expected) in cases {
            let url = SourceUrl::parse(input)?;
            assert_eq!(url.kind(), expected, "{input}");
        }
        Ok(())
    }

    #[test]
    fn trims_surrounding_whitespace() -> anyhow::Result<()> {
        let url = SourceUrl::parse("  https://instagram.com/p/abc/ \n")?;
        assert_eq!(url.as_str(), "https://instagram.com/p/abc/");
        Ok(())
    }

    #[test]
    fn embedded_control_characters_never_survive() -> anyhow::Result<()> {
        let url = SourceUrl::parse("https://WWW.instagram.com/p/Ca\tb\nc/\r?igsh=1")?;
        assert_eq!(url.as_str(), "https://www.instagram.com/p/Cabc/?igsh=1");
        assert!(!url.to_string().chars().any(char::is_control));
        Ok(())
    }

    #[test]
    fn rejects_missing_and_malformed_input() {
        assert_eq!(SourceUrl::parse("   "), Err(SourceUrlError::Missing));
        assert_eq!(
            SourceUrl::parse("not a url"),
            Err(SourceUrlError::Malformed)
        );
        let long = format!("https://instagram.com/p/{}", "a".repeat(MAX_SOURCE_URL_LEN));
        assert!(matches!(
            SourceUrl::parse(&long),
            Err(SourceUrlError::TooLong { .. })
        ));
    }

    #[test]
    fn rejects_foreign_hosts_and_shapes() {
        let rejected = [
            "ftp://instagram.com/p/abc",
            "https://evil.com/p/abc",
            "https://instagram.com.evil.com/p/abc",
            "https://user:pw@instagram.com/p/abc",
            "https://instagram.com:8443/p/abc",
            "https://instagram.com/",
            "https://instagram.com/explore/abc",
            "https://instagram.com/p/",
            "https://instagram.com/p/a;rm -rf",
            "https://instagram.com/stories/someone/",
            "https://instagram.com/stories/someone/12ab",
            "mailto:someone@instagram.com",
        ];
        for input in rejected {
            assert!(
                matches!(
                    SourceUrl::parse(input),
                    Err(SourceUrlError::UnsupportedShape { .. } | SourceUrlError::Malformed)
                ),
                "{input} should be rejected"
            );
        }
    }
}
