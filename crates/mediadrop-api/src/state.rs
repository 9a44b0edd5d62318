//! Shared handler state.

use std::path::PathBuf;
use std::sync::Arc;

use mediadrop_core::MediaWorker;
use mediadrop_sessions::{LinkBuilder, SessionStore};
use mediadrop_telemetry::Metrics;

/// Everything the router needs from the composition root.
pub struct ApiDependencies {
    /// Worker used by the fetch pipeline.
    pub worker: Arc<dyn MediaWorker>,
    /// Session storage shared by fetch and delivery.
    pub store: SessionStore,
    /// Link builder for client responses.
    pub links: LinkBuilder,
    /// Directory for temporary archives.
    pub scratch_dir: PathBuf,
    /// Metrics registry.
    pub telemetry: Metrics,
}

pub(crate) struct ApiState {
    pub(crate) worker: Arc<dyn MediaWorker>,
    pub(crate) store: SessionStore,
    pub(crate) links: LinkBuilder,
    pub(crate) scratch_dir: PathBuf,
    pub(crate) telemetry: Metrics,
}

impl ApiState {
    pub(crate) fn new(dependencies: ApiDependencies) -> Self {
        let ApiDependencies {
            worker,
            store,
            links,
            scratch_dir,
            telemetry,
        } = dependencies;
        Self {
            worker,
            store,
            links,
            scratch_dir,
            telemetry,
        }
    }
}
