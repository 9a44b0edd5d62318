//! `GET /download/{session}/{filename}` and `GET /download-all/{session}`.
//!
//! # Design
//! - Every miss renders the same `not_found` body whatever the reason.
//! - Filesystem lookups and archive assembly run on the blocking pool; bodies stream from disk.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State, rejection::PathRejection},
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
    },
    response::Response,
};
use mediadrop_sessions::SessionError;
use tokio::task::JoinError;
use tokio_util::io::ReaderStream;
use tracing::{error, info};

use crate::http::constants::{
    ARCHIVE_CONTENT_TYPE, DELIVERY_ARCHIVE, DELIVERY_FILE, HEADER_FILES_DISCOVERED,
    HEADER_FILES_INCLUDED,
};
use crate::http::errors::ApiError;
use crate::state::ApiState;

pub(crate) async fn download_file(
    State(state): State<Arc<ApiState>>,
    params: Result<Path<(String, String)>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path((session, file_name)) = params.map_err(|_| ApiError::not_found())?;
    let store = state.store.clone();
    let file = tokio::task::spawn_blocking(move || store.resolve_file(&session, &file_name))
        .await
        .map_err(|err| joined(DELIVERY_FILE, &err))?
        .map_err(|err| delivery_error(DELIVERY_FILE, &err))?;
    let handle = tokio::fs::File::open(&file.path)
        .await
        .map_err(|_| ApiError::not_found())?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, file.content_type)
        .header(CONTENT_LENGTH, file.len)
        .header(CONTENT_DISPOSITION, attachment(&file.file_name))
        .body(Body::from_stream(ReaderStream::new(handle)))
        .map_err(|err| {
            error!(error = %err, "failed to build download response");
            ApiError::internal()
        })?;
    info!(session_id = %file.session, bytes = file.len, "file delivered");
    Ok(response)
}

pub(crate) async fn download_all(
    State(state): State<Arc<ApiState>>,
    params: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(session) = params.map_err(|_| ApiError::not_found())?;
    let builder = Arc::clone(&state);
    let archive = tokio::task::spawn_blocking(move || {
        builder.store.build_archive(&session, &builder.scratch_dir)
    })
    .await
    .map_err(|err| joined(DELIVERY_ARCHIVE, &err))?
    .map_err(|err| delivery_error(DELIVERY_ARCHIVE, &err))?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, ARCHIVE_CONTENT_TYPE)
        .header(CONTENT_LENGTH, archive.len)
        .header(CONTENT_DISPOSITION, attachment(&archive.file_name))
        .header(HEADER_FILES_INCLUDED, archive.included)
        .header(HEADER_FILES_DISCOVERED, archive.discovered)
        .body(Body::from_stream(ReaderStream::new(
            tokio::fs::File::from_std(archive.file),
        )))
        .map_err(|err| {
            error!(error = %err, "failed to build archive response");
            ApiError::internal()
        })?;
    Ok(response)
}

fn joined(kind: &'static str, err: &JoinError) -> ApiError {
    error!(kind, error = %err, "delivery task failed");
    ApiError::internal()
}

fn delivery_error(kind: &'static str, err: &SessionError) -> ApiError {
    if err.is_not_found() {
        return ApiError::not_found();
    }
    error!(
        kind,
        error = %err,
        cause = ?std::error::Error::source(err),
        "delivery failed"
    );
    ApiError::internal()
}

/// `Content-Disposition` with an ASCII fallback and an RFC 5987 `filename*`.
fn attachment(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|ch| {
            if ch == ' ' || (ch.is_ascii_graphic() && ch != '"' && ch != '\\') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if fallback == file_name {
        format!("attachment; filename=\"{file_name}\"")
    } else {
        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            urlencoding::encode(file_name)
        )
    }
}
