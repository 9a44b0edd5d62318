//! Request accounting per MediaDrop surface.
//!
//! # Design
//! - Every routed request is counted by route template and status code.
//! - Download routes also count a delivery outcome taken from the final status,
//!   so handlers never record delivery metrics themselves.
//! - The request id assigned upstream is scoped onto the handler future.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

use axum::extract::MatchedPath;
use axum::http::Request;
use axum::response::Response;
use mediadrop_telemetry::{Metrics, REQUEST_ID_HEADER, with_request_id};
use tower::{Layer, Service};

use crate::http::constants::{
    DELIVERY_ARCHIVE, DELIVERY_FILE, ROUTE_DOWNLOAD, ROUTE_DOWNLOAD_ALL, ROUTE_FETCH,
};

/// Which part of the HTTP surface a request hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Surface {
    Fetch,
    File,
    Archive,
    Probe,
}

impl Surface {
    pub(crate) fn from_route(route: &str) -> Self {
        match route {
            ROUTE_FETCH => Self::Fetch,
            ROUTE_DOWNLOAD => Self::File,
            ROUTE_DOWNLOAD_ALL => Self::Archive,
            _ => Self::Probe,
        }
    }

    pub(crate) const fn delivery_kind(self) -> Option<&'static str> {
        match self {
            Self::File => Some(DELIVERY_FILE),
            Self::Archive => Some(DELIVERY_ARCHIVE),
            Self::Fetch | Self::Probe => None,
        }
    }
}

/// Delivery outcome label for a final response status.
pub(crate) const fn delivery_outcome(status: u16) -> &'static str {
    match status {
        200..=299 => "ok",
        404 => "not_found",
        _ => "error",
    }
}

/// Layer installing [`SurfaceMetrics`] around the routed services.
#[derive(Clone)]
pub(crate) struct SurfaceMetricsLayer {
    telemetry: Metrics,
}

impl SurfaceMetricsLayer {
    pub(crate) const fn new(telemetry: Metrics) -> Self {
        Self { telemetry }
    }
}

impl<S> Layer<S> for SurfaceMetricsLayer {
    type Service = SurfaceMetrics<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SurfaceMetrics {
            inner,
            telemetry: self.telemetry.clone(),
        }
    }
}

#[derive(Clone)]
pub(crate) struct SurfaceMetrics<S> {
    inner: S,
    telemetry: Metrics,
}

impl<S, B> Service<Request<B>> for SurfaceMetrics<S>
where
    S: Service<Request<B>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let route = req
            .extensions()
            .get::<MatchedPath>()
            .map_or_else(|| req.uri().path(), MatchedPath::as_str)
            .to_string();
        let surface = Surface::from_route(&route);
        let request_id = req
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let telemetry = self.telemetry.clone();
        let handled = with_request_id(request_id, self.inner.call(req));

        Box::pin(async move {
            let response = handled.await?;
            let status = response.status().as_u16();
            telemetry.inc_http_request(&route, status);
            if let Some(kind) = surface.delivery_kind() {
                telemetry.inc_delivery(kind, delivery_outcome(status));
            }
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_map_to_surfaces() {
        assert_eq!(Surface::from_route(ROUTE_FETCH), Surface::Fetch);
        assert_eq!(Surface::from_route(ROUTE_DOWNLOAD), Surface::File);
        assert_eq!(Surface::from_route(ROUTE_DOWNLOAD_ALL), Surface::Archive);
        assert_eq!(Surface::from_route("/health/full"), Surface::Probe);
        assert_eq!(Surface::File.delivery_kind(), Some("file"));
        assert_eq!(Surface::Archive.delivery_kind(), Some("archive"));
        assert_eq!(Surface::Fetch.delivery_kind(), None);
    }

    #[test]
    fn statuses_map_to_delivery_outcomes() {
        assert_eq!(delivery_outcome(200), "ok");
        assert_eq!(delivery_outcome(206), "ok");
        assert_eq!(delivery_outcome(404), "not_found");
        assert_eq!(delivery_outcome(500), "error");
        assert_eq!(delivery_outcome(400), "error");
    }
}
