//! In-process worker doubles used by pipeline and router tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use mediadrop_core::{
    CredentialBundle, MediaWorker, SourceUrl, WorkerError, WorkerReply, WorkerResult,
};

/// Canned outcome returned by [`ScriptedWorker::invoke`].
#[derive(Debug, Clone)]
pub enum Script {
    /// Write the listed files into the output directory, then return the reply.
    ///
    /// Asset paths in the reply are rewritten to absolute paths inside the
    /// output directory when they are bare file names.
    Reply {
        /// Files to create as `(name, contents)`.
        files: Vec<(String, Vec<u8>)>,
        /// Reply returned after writing.
        reply: WorkerReply,
    },
    /// Fail with a timeout.
    Timeout,
    /// Fail with an undecodable output.
    Unparseable,
}

/// Worker double that records every call and plays back a [`Script`].
#[derive(Debug)]
pub struct ScriptedWorker {
    script: Script,
    preflight_ok: bool,
    preflight_calls: AtomicUsize,
    invoke_calls: AtomicUsize,
    output_dirs: Mutex<Vec<PathBuf>>,
}

impl ScriptedWorker {
    /// Worker that passes preflight and plays back `script`.
    #[must_use]
    pub const fn new(script: Script) -> Self {
        Self::build(script, true)
    }

    /// Worker whose preflight reports missing credentials.
    #[must_use]
    pub const fn without_credentials() -> Self {
        Self::build(Script::Unparseable, false)
    }

    const fn build(script: Script, preflight_ok: bool) -> Self {
        Self {
            script,
            preflight_ok,
            preflight_calls: AtomicUsize::new(0),
            invoke_calls: AtomicUsize::new(0),
            output_dirs: Mutex::new(Vec::new()),
        }
    }

    /// Number of `preflight` calls observed.
    #[must_use]
    pub fn preflight_calls(&self) -> usize {
        self.preflight_calls.load(Ordering::SeqCst)
    }

    /// Number of `invoke` calls observed.
    #[must_use]
    pub fn invoke_calls(&self) -> usize {
        self.invoke_calls.load(Ordering::SeqCst)
    }

    /// Output directories handed to `invoke`, in call order.
    #[must_use]
    pub fn output_dirs(&self) -> Vec<PathBuf> {
        self.output_dirs
            .lock()
            .map(|dirs| dirs.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MediaWorker for ScriptedWorker {
    async fn preflight(&self) -> WorkerResult<CredentialBundle> {
        self.preflight_calls.fetch_add(1, Ordering::SeqCst);
        if self.preflight_ok {
            Ok(CredentialBundle::single(PathBuf::from("cookies.txt")))
        } else {
            Err(WorkerError::PreconditionMissing {
                requirement: "credentials",
                path: None,
            })
        }
    }

    async fn invoke(
        &self,
        _url: &SourceUrl,
        output_dir: &Path,
        _credentials: &CredentialBundle,
    ) -> WorkerResult<WorkerReply> {
        self.invoke_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut dirs) = self.output_dirs.lock() {
            dirs.push(output_dir.to_path_buf());
        }
        match &self.script {
            Script::Reply { files, reply } => {
                for (name, contents) in files {
                    fs::write(output_dir.join(name), contents).map_err(|source| {
                        WorkerError::Io {
                            operation: "scripted_worker.write",
                            source,
                        }
                    })?;
                }
                Ok(anchor_paths(reply.clone(), output_dir))
            }
            Script::Timeout => Err(WorkerError::Timeout {
                timeout: std::time::Duration::from_secs(1),
            }),
            Script::Unparseable => Err(WorkerError::Parse {
                reason: "no_result_line",
                exit_code: Some(0),
            }),
        }
    }
}

fn anchor_paths(reply: WorkerReply, output_dir: &Path) -> WorkerReply {
    match reply {
        WorkerReply::Success(mut success) => {
            for item in &mut success.items {
                if !item.path.contains('/') {
                    item.path = output_dir.join(&item.path).to_string_lossy().into_owned();
                }
            }
            WorkerReply::Success(success)
        }
        failure @ WorkerReply::Failure(_) => failure,
    }
}
