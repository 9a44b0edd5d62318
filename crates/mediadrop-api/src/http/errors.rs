//! Client-facing `{success: false, error, error_type}` responses.
//!
//! # Design
//! - Messages are fixed per category; only worker-reported failures pass their text through.
//! - Causes (paths, stderr, sources) are logged by callers and never reach the body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mediadrop_core::{FailureCategory, SourceUrlError, WorkerError, WorkerFailure};

use crate::http::constants::{
    MESSAGE_INTERNAL, MESSAGE_NOT_FOUND, MESSAGE_PARSE, MESSAGE_PRECONDITION, MESSAGE_TIMEOUT,
};
use crate::models::FailureBody;

/// Categorised failure ready to render.
#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    category: FailureCategory,
    error_type: String,
    message: String,
}

impl ApiError {
    fn new(category: FailureCategory, message: impl Into<String>) -> Self {
        Self {
            status: status_for(category),
            category,
            error_type: category.as_str().to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid_url(err: &SourceUrlError) -> Self {
        Self::new(FailureCategory::InvalidUrl, err.user_message())
    }

    pub(crate) fn from_worker(err: &WorkerError) -> Self {
        let category = err.category();
        let message = match category {
            FailureCategory::PreconditionMissing => MESSAGE_PRECONDITION,
            FailureCategory::WorkerTimeout => MESSAGE_TIMEOUT,
            FailureCategory::ParseError => MESSAGE_PARSE,
            _ => MESSAGE_INTERNAL,
        };
        Self::new(category, message)
    }

    /// Worker-reported failure; message and `error_type` pass through.
    pub(crate) fn business(failure: WorkerFailure) -> Self {
        Self {
            status: status_for(FailureCategory::BusinessError),
            category: FailureCategory::BusinessError,
            error_type: failure.error_type,
            message: failure.message,
        }
    }

    pub(crate) fn not_found() -> Self {
        Self::new(FailureCategory::NotFound, MESSAGE_NOT_FOUND)
    }

    pub(crate) fn internal() -> Self {
        Self::new(FailureCategory::InternalError, MESSAGE_INTERNAL)
    }

    pub(crate) const fn category(&self) -> FailureCategory {
        self.category
    }

    pub(crate) fn error_type(&self) -> &str {
        &self.error_type
    }
}

const fn status_for(category: FailureCategory) -> StatusCode {
    match category {
        FailureCategory::InvalidUrl | FailureCategory::BusinessError => StatusCode::BAD_REQUEST,
        FailureCategory::NotFound => StatusCode::NOT_FOUND,
        FailureCategory::PreconditionMissing
        | FailureCategory::WorkerTimeout
        | FailureCategory::ParseError
        | FailureCategory::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = FailureBody {
            success: false,
            error: self.message,
            error_type: self.error_type,
        };
        (self.status, Json(body)).into_response()
    }
}
