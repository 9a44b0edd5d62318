//! Router construction and server host for the API.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::{HeaderName, Method, Request, header::CONTENT_DISPOSITION, header::CONTENT_TYPE},
    routing::{get, post},
};
use mediadrop_telemetry::{REQUEST_ID_HEADER, build_sha};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{Span, info};

use crate::error::{ApiServerError, ApiServerResult};
use crate::http::constants::{
    HEADER_FILES_DISCOVERED, HEADER_FILES_INCLUDED, ROUTE_DOWNLOAD, ROUTE_DOWNLOAD_ALL,
    ROUTE_FETCH,
};
use crate::http::downloads::{download_all, download_file};
use crate::http::fetch::fetch;
use crate::http::health::{health, health_full, metrics};
use crate::http::telemetry::SurfaceMetricsLayer;
use crate::state::{ApiDependencies, ApiState};

/// Axum router wrapper that hosts the MediaDrop HTTP surface.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Build the router over the supplied dependencies.
    #[must_use]
    pub fn new(dependencies: ApiDependencies) -> Self {
        let telemetry = dependencies.telemetry.clone();
        let state = Arc::new(ApiState::new(dependencies));

        let cors_layer = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE])
            .expose_headers([
                CONTENT_DISPOSITION,
                HeaderName::from_static(HEADER_FILES_INCLUDED),
                HeaderName::from_static(HEADER_FILES_DISCOVERED),
                HeaderName::from_static(REQUEST_ID_HEADER),
            ]);
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                tracing::info_span!(
                    "http.request",
                    method = %request.method(),
                    route = %request.uri().path(),
                    request_id = %request_id,
                    build_sha = %build_sha(),
                    stage = tracing::field::Empty,
                    status_code = tracing::field::Empty,
                    latency_ms = tracing::field::Empty
                )
            })
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &Span| {
                    span.record("status_code", response.status().as_u16());
                    let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
                    span.record("latency_ms", latency_ms);
                },
            );
        let layered = ServiceBuilder::new()
            .layer(mediadrop_telemetry::set_request_id_layer())
            .layer(mediadrop_telemetry::propagate_request_id_layer())
            .layer(trace_layer)
            .layer(SurfaceMetricsLayer::new(telemetry));

        let router = Self::routes()
            .layer(cors_layer)
            .route_layer(layered)
            .with_state(state);
        Self { router }
    }

    fn routes() -> Router<Arc<ApiState>> {
        Router::new()
            .route(ROUTE_FETCH, post(fetch))
            .route(ROUTE_DOWNLOAD, get(download_file))
            .route(ROUTE_DOWNLOAD_ALL, get(download_all))
            .route("/health", get(health))
            .route("/health/full", get(health_full))
            .route("/metrics", get(metrics))
    }

    /// The fully layered router, for embedding or in-process tests.
    #[must_use]
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve on `addr` until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener fails to bind or the server terminates unexpectedly.
    pub async fn serve<F>(self, addr: SocketAddr, shutdown: F) -> ApiServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ApiServerError::Bind { addr, source })?;
        info!(addr = %addr, "api listener started");
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|source| ApiServerError::Serve { source })
    }
}
