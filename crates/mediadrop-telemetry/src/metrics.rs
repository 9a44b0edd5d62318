//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Label values are supplied by callers from fixed vocabularies (routes, categories).

use std::sync::Arc;
use std::time::Duration;

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Outcome label recorded for successful fetches.
pub const FETCH_SUCCESS: &str = "success";

/// Prometheus-backed metrics registry shared across services.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    fetch_requests_total: IntCounterVec,
    worker_duration_ms: IntGauge,
    deliveries_total: IntCounterVec,
    sessions_swept_total: IntCounter,
}

/// Snapshot of selected gauges and counters for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Fetches that returned download links.
    pub fetch_success_total: u64,
    /// Duration of the most recent worker run (ms).
    pub worker_duration_ms: i64,
    /// Session directories removed by the retention sweep.
    pub sessions_swept_total: u64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be
    /// built or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests_total = counter_vec(
            "http_requests_total",
            "Total HTTP requests received",
            &["route", "code"],
        )?;
        let fetch_requests_total = counter_vec(
            "fetch_requests_total",
            "Fetch requests by outcome (success or failure category)",
            &["outcome"],
        )?;
        let worker_duration_ms = IntGauge::with_opts(Opts::new(
            "worker_duration_ms",
            "Wall time of the most recent worker run (ms)",
        ))
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "worker_duration_ms",
            source,
        })?;
        let deliveries_total = counter_vec(
            "deliveries_total",
            "Download responses by kind and outcome",
            &["kind", "outcome"],
        )?;
        let sessions_swept_total = IntCounter::with_opts(Opts::new(
            "sessions_swept_total",
            "Session directories removed by the retention sweep",
        ))
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "sessions_swept_total",
            source,
        })?;

        register(&registry, "http_requests_total", http_requests_total.clone())?;
        register(&registry, "fetch_requests_total", fetch_requests_total.clone())?;
        register(&registry, "worker_duration_ms", worker_duration_ms.clone())?;
        register(&registry, "deliveries_total", deliveries_total.clone())?;
        register(&registry, "sessions_swept_total", sessions_swept_total.clone())?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                http_requests_total,
                fetch_requests_total,
                worker_duration_ms,
                deliveries_total,
                sessions_swept_total,
            }),
        })
    }

    /// Increment the HTTP request counter for the given route and status code.
    pub fn inc_http_request(&self, route: &str, status: u16) {
        let code = status.to_string();
        self.inner
            .http_requests_total
            .with_label_values(&[route, code.as_str()])
            .inc();
    }

    /// Count a finished fetch under `outcome`.
    pub fn inc_fetch(&self, outcome: &str) {
        self.inner
            .fetch_requests_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Record how long the latest worker run took.
    pub fn observe_worker_duration(&self, duration: Duration) {
        self.inner
            .worker_duration_ms
            .set(Self::duration_to_ms(duration));
    }

    /// Count a delivery response; `kind` is `file` or `archive`.
    pub fn inc_delivery(&self, kind: &str, outcome: &str) {
        self.inner
            .deliveries_total
            .with_label_values(&[kind, outcome])
            .inc();
    }

    /// Add the sessions removed by one sweep pass.
    pub fn add_sessions_swept(&self, removed: u64) {
        self.inner.sessions_swept_total.inc_by(removed);
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }

    /// Take a point-in-time snapshot of the most relevant gauges and counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            fetch_success_total: self
                .inner
                .fetch_requests_total
                .with_label_values(&[FETCH_SUCCESS])
                .get(),
            worker_duration_ms: self.inner.worker_duration_ms.get(),
            sessions_swept_total: self.inner.sessions_swept_total.get(),
        }
    }

    /// Convert a duration to milliseconds saturating at `i64::MAX`.
    pub(crate) fn duration_to_ms(duration: Duration) -> i64 {
        i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
    }
}

fn counter_vec(name: &'static str, help: &str, labels: &[&str]) -> Result<IntCounterVec> {
    IntCounterVec::new(Opts::new(name, help), labels)
        .map_err(|source| TelemetryError::MetricsCollector { name, source })
}

fn register<C>(registry: &Registry, name: &'static str, collector: C) -> Result<()>
where
    C: prometheus::core::Collector + 'static,
{
    registry
        .register(Box::new(collector))
        .map_err(|source| TelemetryError::MetricsRegister { name, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_to_ms_saturates_on_large_values() {
        let duration = Duration::from_secs(u64::MAX / 2);
        assert_eq!(Metrics::duration_to_ms(duration), i64::MAX);
    }

    #[test]
    fn metrics_snapshot_reflects_updates() -> anyhow::Result<()> {
        let metrics = Metrics::new()?;
        metrics.inc_http_request("/api/fetch", 200);
        metrics.inc_fetch(FETCH_SUCCESS);
        metrics.inc_fetch(FETCH_SUCCESS);
        metrics.inc_fetch("worker_timeout");
        metrics.observe_worker_duration(Duration::from_millis(1_250));
        metrics.inc_delivery("archive", "ok");
        metrics.add_sessions_swept(3);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.fetch_success_total, 2);
        assert_eq!(snapshot.worker_duration_ms, 1_250);
        assert_eq!(snapshot.sessions_swept_total, 3);

        let rendered = metrics.render()?;
        assert!(rendered.contains(r#"route="/api/fetch""#));
        assert!(rendered.contains(r#"fetch_requests_total{outcome="worker_timeout"} 1"#));
        assert!(rendered.contains(r#"kind="archive""#));
        assert!(rendered.contains("sessions_swept_total 3"));
        Ok(())
    }

    #[test]
    fn snapshot_serializes_for_health_reports() -> anyhow::Result<()> {
        let metrics = Metrics::new()?;
        let value = serde_json::to_value(metrics.snapshot())?;
        assert_eq!(value["fetch_success_total"], 0);
        assert_eq!(value["sessions_swept_total"], 0);
        Ok(())
    }
}
