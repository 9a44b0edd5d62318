//! Health and diagnostics endpoints.

use std::sync::Arc;

use axum::{Json, body::Body, extract::State, http::StatusCode, response::Response};
use mediadrop_telemetry::{MetricsSnapshot, build_sha};
use serde::Serialize;
use tracing::{error, warn};

use crate::http::constants::METRICS_CONTENT_TYPE;
use crate::http::errors::ApiError;
use crate::state::ApiState;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) status: &'static str,
    pub(crate) build: String,
}

#[derive(Serialize)]
pub(crate) struct WorkerHealth {
    pub(crate) status: &'static str,
    pub(crate) credential_files: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) error_type: Option<&'static str>,
}

#[derive(Serialize)]
pub(crate) struct FullHealthResponse {
    pub(crate) status: &'static str,
    pub(crate) build: String,
    pub(crate) degraded: Vec<&'static str>,
    pub(crate) worker: WorkerHealth,
    pub(crate) metrics: MetricsSnapshot,
}

pub(crate) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        build: build_sha().to_string(),
    })
}

pub(crate) async fn health_full(State(state): State<Arc<ApiState>>) -> Json<FullHealthResponse> {
    let mut degraded = Vec::new();
    let worker = match state.worker.preflight().await {
        Ok(credentials) => WorkerHealth {
            status: "ok",
            credential_files: credentials.len(),
            error_type: None,
        },
        Err(err) => {
            warn!(error = %err, "worker preflight failed during health check");
            degraded.push("worker");
            WorkerHealth {
                status: "unavailable",
                credential_files: 0,
                error_type: Some(err.category().as_str()),
            }
        }
    };
    if !state.store.root().is_dir() {
        degraded.push("sessions");
    }
    if !state.scratch_dir.is_dir() {
        degraded.push("scratch");
    }
    let status = if degraded.is_empty() { "ok" } else { "degraded" };
    Json(FullHealthResponse {
        status,
        build: build_sha().to_string(),
        degraded,
        worker,
        metrics: state.telemetry.snapshot(),
    })
}

pub(crate) async fn metrics(State(state): State<Arc<ApiState>>) -> Result<Response, ApiError> {
    match state.telemetry.render() {
        Ok(body) => Response::builder()
            .status(StatusCode::OK)
            .header(axum::http::header::CONTENT_TYPE, METRICS_CONTENT_TYPE)
            .body(Body::from(body))
            .map_err(|err| {
                error!(error = %err, "failed to build metrics response");
                ApiError::internal()
            }),
        Err(err) => {
            error!(error = %err, "failed to render metrics");
            Err(ApiError::internal())
        }
    }
}
