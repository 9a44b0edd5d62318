//! Process span and per-request identifiers.
//!
//! # Design
//! - One leaked `app` span tags every event with the run mode and build SHA.
//! - The request id lives in task-local storage for the handler future only.
//! - Fetch stages are recorded on whichever span is current.

use std::future::Future;
use std::sync::Arc;

use tracing::{Span, span::Entered};

use crate::init::build_sha;

tokio::task_local! {
    static REQUEST_ID: Arc<str>;
}

/// Keeps the process-level span entered while alive.
pub struct GlobalContextGuard {
    _entered: Entered<'static>,
}

impl GlobalContextGuard {
    /// Enter the `app` span for `mode` (e.g. `serve`).
    #[must_use]
    pub fn new(mode: impl Into<String>) -> Self {
        let mode = mode.into();
        let span: &'static Span = Box::leak(Box::new(tracing::info_span!(
            "app",
            mode = %mode,
            build_sha = %build_sha()
        )));
        Self {
            _entered: span.enter(),
        }
    }
}

/// Record the fetch pipeline stage on the current request span.
pub fn record_fetch_stage(stage: &str) {
    Span::current().record("stage", tracing::field::display(stage));
}

/// Request id of the request being served; `None` outside a request or when blank.
#[must_use]
pub fn current_request_id() -> Option<String> {
    REQUEST_ID
        .try_with(|id| id.to_string())
        .ok()
        .filter(|id| !id.is_empty())
}

/// Run `fut` with `request_id` visible to [`current_request_id`].
pub async fn with_request_id<Fut, T>(request_id: impl Into<String>, fut: Fut) -> T
where
    Fut: Future<Output = T>,
{
    REQUEST_ID.scope(Arc::from(request_id.into()), fut).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_context_guard_enters_and_drops() {
        let guard = GlobalContextGuard::new("test");
        record_fetch_stage("validating");
        drop(guard);
    }

    #[tokio::test]
    async fn request_id_is_scoped_to_the_future() {
        let seen = with_request_id("req-42", async { current_request_id() }).await;
        assert_eq!(seen.as_deref(), Some("req-42"));
        assert!(current_request_id().is_none());

        let blank = with_request_id("", async { current_request_id() }).await;
        assert!(blank.is_none());
    }
}
