//! External worker process invocation.
//!
//! # Design
//!
//! - Every value reaches the child as a discrete `argv` entry; no shell is involved.
//! - The child is killed when the invocation future is dropped or times out.
//! - Stdout is returned line by line for decoding; stderr is only logged.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use mediadrop_core::{CredentialBundle, SourceUrl, WorkerError, WorkerResult};
use tokio::process::Command;
use tracing::{debug, info};

/// Default time budget for one worker run.
pub const DEFAULT_WORKER_TIMEOUT: Duration = Duration::from_secs(60);

/// How the external worker process is launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    /// Interpreter or executable to run.
    pub program: String,
    /// Script handed to the program as its first argument.
    pub script: Option<PathBuf>,
    /// Downloader binary path appended as the optional trailing argument.
    pub downloader: Option<PathBuf>,
    /// `HOME` override for the child environment.
    pub home_dir: Option<PathBuf>,
    /// Hard time budget for one run.
    pub timeout: Duration,
}

impl WorkerCommand {
    /// Command running `program` with no script and the default timeout.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            script: None,
            downloader: None,
            home_dir: None,
            timeout: DEFAULT_WORKER_TIMEOUT,
        }
    }
}

/// Raw captured output of one worker run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerOutput {
    /// Exit code, absent when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Stdout split into lines.
    pub stdout_lines: Vec<String>,
    /// Stderr split into lines.
    pub stderr_lines: Vec<String>,
}

/// Runs the configured worker command once per fetch.
#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    command: WorkerCommand,
}

impl ProcessInvoker {
    /// Build an invoker for the given command.
    #[must_use]
    pub const fn new(command: WorkerCommand) -> Self {
        Self { command }
    }

    /// Command configuration in use.
    #[must_use]
    pub const fn command(&self) -> &WorkerCommand {
        &self.command
    }

    /// Check that the configured script exists, without spawning anything.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::PreconditionMissing`] when a script is configured
    /// but is not a regular file.
    pub fn check_script(&self) -> WorkerResult<()> {
        match &self.command.script {
            Some(script) if !script.is_file() => Err(WorkerError::PreconditionMissing {
                requirement: "worker_script",
                path: Some(script.clone()),
            }),
            _ => Ok(()),
        }
    }

    /// Assemble the argument vector passed after the program name.
    #[must_use]
    pub fn arguments(
        &self,
        url: &SourceUrl,
        output_dir: &Path,
        credentials: &CredentialBundle,
    ) -> Vec<String> {
        let mut args = Vec::with_capacity(5);
        if let Some(script) = &self.command.script {
            args.push(absolute(script).to_string_lossy().into_owned());
        }
        args.push(url.as_str().to_string());
        args.push(absolute(output_dir).to_string_lossy().into_owned());
        args.push(credentials.argument().to_string());
        if let Some(downloader) = &self.command.downloader {
            args.push(downloader.to_string_lossy().into_owned());
        }
        args
    }

    /// Run the worker to completion or until the time budget expires.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Spawn`] when the process cannot be started,
    /// [`WorkerError::Timeout`] when it exceeds its budget, and
    /// [`WorkerError::Io`] when collecting its output fails.
    pub async fn run(
        &self,
        url: &SourceUrl,
        output_dir: &Path,
        credentials: &CredentialBundle,
    ) -> WorkerResult<WorkerOutput> {
        let mut command = Command::new(&self.command.program);
        command
            .args(self.arguments(url, output_dir, credentials))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = self
            .command
            .script
            .as_deref()
            .and_then(Path::parent)
            .filter(|dir| !dir.as_os_str().is_empty())
        {
            command.current_dir(dir);
        }
        if let Some(home) = &self.command.home_dir {
            command.env("HOME", home);
        }

        let started = Instant::now();
        let child = command.spawn().map_err(|source| WorkerError::Spawn {
            program: self.command.program.clone(),
            source,
        })?;
        debug!(pid = ?child.id(), "worker spawned");

        let output = tokio::time::timeout(self.command.timeout, child.wait_with_output())
            .await
            .map_err(|_| WorkerError::Timeout {
                timeout: self.command.timeout,
            })?
            .map_err(|source| WorkerError::Io {
                operation: "worker.wait",
                source,
            })?;

        let stderr_lines = split_lines(&output.stderr);
        for line in &stderr_lines {
            debug!(target: "mediadrop::worker::stderr", "{line}");
        }
        let result = WorkerOutput {
            exit_code: output.status.code(),
            stdout_lines: split_lines(&output.stdout),
            stderr_lines,
        };
        info!(
            exit_code = ?result.exit_code,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            stdout_lines = result.stdout_lines.len(),
            "worker finished"
        );
        Ok(result)
    }
}

/// Paths are absolutised because the child runs from the script directory.
fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::to_string)
        .collect()
}
