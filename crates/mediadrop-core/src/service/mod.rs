//! Worker trait implemented by fetch adapters.

use std::path::Path;

use async_trait::async_trait;

use crate::error::WorkerResult;
use crate::model::{CredentialBundle, WorkerReply};
use crate::source::SourceUrl;

/// External media worker seam; the process-backed adapter lives in `mediadrop-worker`.
#[async_trait]
pub trait MediaWorker: Send + Sync {
    /// Check prerequisites without spawning anything and resolve the credential bundle.
    ///
    /// Called before any session directory is allocated.
    async fn preflight(&self) -> WorkerResult<CredentialBundle>;

    /// Run one fetch writing assets into `output_dir` and decode the reply.
    async fn invoke(
        &self,
        url: &SourceUrl,
        output_dir: &Path,
        credentials: &CredentialBundle,
    ) -> WorkerResult<WorkerReply>;
}
