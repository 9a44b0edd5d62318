//! Worker stdout protocol decoding.
//!
//! # Design
//!
//! - The first stdout line that is a JSON object with a result marker wins.
//! - The line is deserialized into a raw shape, then resolved into a reply:
//!   a failure (`error`) or a success (`items`), never both.
//! - Missing output is a parse failure, never an empty success.

use mediadrop_core::{
    MediaKind, WorkerAsset, WorkerError, WorkerFailure, WorkerReply, WorkerResult, WorkerSuccess,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::invoker::WorkerOutput;

const RESULT_MARKERS: &[&str] = &["success", "error", "items"];
const DEFAULT_ERROR_TYPE: &str = "business_error";
const DEFAULT_QUALITY: &str = "Original";

/// Result line as emitted by the worker; unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct RawReply {
    success: Option<bool>,
    error: Option<String>,
    error_type: Option<String>,
    items: Option<Vec<Value>>,
    #[serde(rename = "type")]
    content_type: Option<String>,
    username: Option<String>,
    caption: Option<String>,
    thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    path: Option<String>,
    format: Option<String>,
    quality: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    thumbnail: Option<String>,
    thumbnail_file: Option<String>,
}

/// Decode the captured output of a worker run into a typed reply.
///
/// # Errors
///
/// Returns [`WorkerError::Parse`] when no result line is present or the
/// result line is not a well-formed success or failure.
pub fn decode(output: &WorkerOutput) -> WorkerResult<WorkerReply> {
    let parse = |reason| WorkerError::Parse {
        reason,
        exit_code: output.exit_code,
    };
    let line = find_result_line(&output.stdout_lines).ok_or_else(|| parse("no_result_line"))?;
    let raw: RawReply = serde_json::from_value(line).map_err(|err| {
        debug!(error = %err, "worker result line has an invalid shape");
        parse("invalid_shape")
    })?;
    raw.resolve().map_err(parse)
}

impl RawReply {
    fn resolve(self) -> Result<WorkerReply, &'static str> {
        let Self {
            success,
            error,
            error_type,
            items,
            content_type,
            username,
            caption,
            thumbnail,
        } = self;
        let reply = match (error, items) {
            (Some(message), None) => WorkerReply::Failure(WorkerFailure {
                message,
                error_type: error_type
                    .filter(|value| !value.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_ERROR_TYPE.to_string()),
            }),
            (None, Some(items)) => WorkerReply::Success(WorkerSuccess {
                content_type,
                username: username.unwrap_or_default(),
                caption: caption.unwrap_or_default(),
                thumbnail: non_empty(thumbnail),
                items: decode_items(items),
            }),
            (Some(_), Some(_)) => return Err("ambiguous_result"),
            (None, None) => return Err("missing_result_fields"),
        };
        match success {
            Some(flag) if flag != matches!(reply, WorkerReply::Success(_)) => {
                Err("success_flag_mismatch")
            }
            _ => Ok(reply),
        }
    }
}

fn find_result_line(lines: &[String]) -> Option<Value> {
    lines.iter().find_map(|line| {
        let trimmed = line.trim();
        if !trimmed.starts_with('{') {
            return None;
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(value)
                if value.as_object().is_some_and(|object| {
                    RESULT_MARKERS.iter().any(|key| object.contains_key(*key))
                }) =>
            {
                Some(value)
            }
            Ok(_) => {
                debug!("skipping json line without result marker");
                None
            }
            Err(_) => None,
        }
    })
}

fn decode_items(items: Vec<Value>) -> Vec<WorkerAsset> {
    let reported = items.len();
    let assets: Vec<WorkerAsset> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<RawItem>(item).ok())
        .filter_map(RawItem::into_asset)
        .collect();
    if assets.len() != reported {
        debug!(reported, kept = assets.len(), "dropped unusable worker items");
    }
    assets
}

impl RawItem {
    fn into_asset(self) -> Option<WorkerAsset> {
        let path = self.path.filter(|path| !path.trim().is_empty())?;
        let format = non_empty(self.format)
            .or_else(|| extension_of(&path))
            .unwrap_or_default()
            .to_ascii_lowercase();
        let kind = self
            .kind
            .as_deref()
            .and_then(MediaKind::from_label)
            .unwrap_or_else(|| MediaKind::from_extension(&format));
        Some(WorkerAsset {
            kind,
            quality: self.quality.unwrap_or_else(|| DEFAULT_QUALITY.to_string()),
            thumbnail: non_empty(self.thumbnail),
            thumbnail_file: non_empty(self.thumbnail_file),
            format,
            path,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

fn extension_of(path: &str) -> Option<String> {
    let name = mediadrop_core::basename(path)?;
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_string())
        .filter(|ext| !ext.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(lines: &[&str]) -> WorkerOutput {
        WorkerOutput {
            exit_code: Some(0),
            stdout_lines: lines.iter().map(|line| (*line).to_string()).collect(),
            stderr_lines: Vec::new(),
        }
    }

    #[test]
    fn skips_leading_noise_and_unrelated_json() -> anyhow::Result<()> {
        let reply = decode(&output(&[
            "[youtube] Extracting URL",
            r#"{"level":"debug","msg":"warming up"}"#,
            r#"{"success":true,"type":"reel","username":"someone","caption":"hi","items":[{"path":"/tmp/x/clip.mp4","format":"mp4","quality":"1080p"}]}"#,
            r#"{"success":false,"error":"later lines are ignored"}"#,
        ]))?;
        let WorkerReply::Success(success) = reply else {
            anyhow::bail!("expected success");
        };
        assert_eq!(success.username, "someone");
        assert_eq!(success.content_type.as_deref(), Some("reel"));
        assert_eq!(success.items.len(), 1);
        assert_eq!(success.items[0].kind, MediaKind::Video);
        assert_eq!(success.items[0].quality, "1080p");
        Ok(())
    }

    #[test]
    fn failure_carries_worker_category() -> anyhow::Result<()> {
        let reply = decode(&output(&[
            r#"{"success":false,"error":"This content is private","error_type":"private_content","cookies_tried":2}"#,
        ]))?;
        assert_eq!(
            reply,
            WorkerReply::Failure(WorkerFailure {
                message: "This content is private".to_string(),
                error_type: "private_content".to_string(),
            })
        );

        let blank = decode(&output(&[r#"{"error":"nope","error_type":"  "}"#]))?;
        let WorkerReply::Failure(failure) = blank else {
            anyhow::bail!("expected failure");
        };
        assert_eq!(failure.error_type, "business_error");
        Ok(())
    }

    #[test]
    fn malformed_results_are_parse_errors() {
        let cases = [
            (vec!["no json at all", ""], "no_result_line"),
            (vec![r#"{"error":"x","items":[]}"#], "ambiguous_result"),
            (vec![r#"{"success":true}"#], "missing_result_fields"),
            (vec![r#"{"error":42}"#], "invalid_shape"),
            (vec![r#"{"items":{"path":"a"}}"#], "invalid_shape"),
            (vec![r#"{"success":false,"items":[]}"#], "success_flag_mismatch"),
            (vec![r#"{"success":"yes","error":"x"}"#], "invalid_shape"),
            (vec![r#"{"success":true,"error":null,"items":null}"#], "missing_result_fields"),
        ];
        for (lines, expected) in cases {
            match decode(&output(&lines)) {
                Err(WorkerError::Parse { reason, .. }) => assert_eq!(reason, expected, "{lines:?}"),
                other => panic!("expected parse error for {lines:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn items_without_path_are_dropped_and_kind_is_inferred() -> anyhow::Result<()> {
        let reply = decode(&output(&[
            r#"{"items":[{"format":"jpg"},{"path":""},{"path":"C:\\out\\a.WEBM"},{"path":"/o/b.jpg","type":"photo","thumbnail_file":"/o/b_thumb.jpg","extra":[1]},"junk",{"path":7}]}"#,
        ]))?;
        let WorkerReply::Success(success) = reply else {
            anyhow::bail!("expected success");
        };
        assert_eq!(success.items.len(), 2);
        assert_eq!(success.items[0].format, "webm");
        assert_eq!(success.items[0].kind, MediaKind::Video);
        assert_eq!(success.items[0].quality, "Original");
        assert_eq!(success.items[1].kind, MediaKind::Image);
        assert_eq!(
            success.items[1].thumbnail_file.as_deref(),
            Some("/o/b_thumb.jpg")
        );
        Ok(())
    }

    #[test]
    fn empty_item_list_is_still_success() -> anyhow::Result<()> {
        let reply = decode(&output(&[r#"{"success":true,"username":"u","items":[]}"#]))?;
        assert!(matches!(reply, WorkerReply::Success(ref s) if s.items.is_empty()));
        Ok(())
    }
}
