//! `POST /api/fetch`.

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use mediadrop_core::{FailureCategory, SourceUrlError};
use tracing::info;

use crate::http::errors::ApiError;
use crate::models::{FetchRequest, FetchResponse};
use crate::pipeline::run_fetch;
use crate::state::ApiState;

pub(crate) async fn fetch(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<FetchRequest>, JsonRejection>,
) -> Result<Json<FetchResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        info!(error = %rejection.body_text(), "fetch request body rejected");
        state
            .telemetry
            .inc_fetch(FailureCategory::InvalidUrl.as_str());
        ApiError::invalid_url(&SourceUrlError::Malformed)
    })?;
    run_fetch(&state, &request.url).await.map(Json)
}
