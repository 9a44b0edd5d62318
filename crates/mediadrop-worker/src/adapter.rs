//! Process-backed [`MediaWorker`] implementation.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mediadrop_core::{
    CredentialBundle, MediaWorker, SourceUrl, WorkerError, WorkerReply, WorkerResult,
};
use tracing::{debug, warn};

use crate::credentials::discover_credentials;
use crate::invoker::{ProcessInvoker, WorkerCommand};
use crate::protocol::decode;

/// Worker that runs the configured external process for every fetch.
#[derive(Debug, Clone)]
pub struct ProcessWorker {
    invoker: ProcessInvoker,
    credentials_path: PathBuf,
}

impl ProcessWorker {
    /// Build a worker for `command`, resolving credentials from `credentials_path`.
    #[must_use]
    pub const fn new(command: WorkerCommand, credentials_path: PathBuf) -> Self {
        Self {
            invoker: ProcessInvoker::new(command),
            credentials_path,
        }
    }

    /// Underlying process invoker.
    #[must_use]
    pub const fn invoker(&self) -> &ProcessInvoker {
        &self.invoker
    }
}

#[async_trait]
impl MediaWorker for ProcessWorker {
    async fn preflight(&self) -> WorkerResult<CredentialBundle> {
        self.invoker.check_script()?;
        let path = self.credentials_path.clone();
        let bundle = tokio::task::spawn_blocking(move || discover_credentials(&path))
            .await
            .map_err(|err| WorkerError::Io {
                operation: "credentials.discover",
                source: io::Error::other(err),
            })??;
        debug!(credential_files = bundle.len(), "worker preflight passed");
        Ok(bundle)
    }

    async fn invoke(
        &self,
        url: &SourceUrl,
        output_dir: &Path,
        credentials: &CredentialBundle,
    ) -> WorkerResult<WorkerReply> {
        let output = self.invoker.run(url, output_dir, credentials).await?;
        let reply = decode(&output);
        if let Err(err) = &reply {
            warn!(
                error = %err,
                exit_code = ?output.exit_code,
                stdout_lines = output.stdout_lines.len(),
                stderr_lines = output.stderr_lines.len(),
                "worker output rejected"
            );
        }
        reply
    }
}
