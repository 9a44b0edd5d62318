//! Typed configuration consumed by the application.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Requested log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormatSetting {
    /// Structured JSON lines.
    Json,
    /// Human-readable multi-line output.
    Pretty,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Interface to bind.
    pub bind_addr: IpAddr,
    /// Listener port (non-zero).
    pub port: u16,
    /// Prefix for generated download links; empty for relative links.
    pub public_base_url: String,
}

impl HttpConfig {
    /// Socket address to listen on.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

/// Session storage settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionsConfig {
    /// Directory holding one subdirectory per fetch.
    pub root: PathBuf,
    /// Directory for temporary archives, outside [`SessionsConfig::root`].
    pub scratch_dir: PathBuf,
    /// Age after which sessions are reclaimed.
    pub ttl: Duration,
    /// Sweep period; `None` disables the sweep.
    pub sweep_interval: Option<Duration>,
}

/// External worker settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Interpreter or executable.
    pub program: String,
    /// Script passed as the first argument, if any.
    pub script: Option<PathBuf>,
    /// Downloader binary passed as the trailing argument, if any.
    pub downloader: Option<PathBuf>,
    /// `HOME` override for the worker.
    pub home_dir: Option<PathBuf>,
    /// Hard time budget per run.
    pub timeout: Duration,
    /// Cookie file or directory of cookie files.
    pub credentials_path: PathBuf,
}

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// HTTP listener.
    pub http: HttpConfig,
    /// Session storage.
    pub sessions: SessionsConfig,
    /// External worker.
    pub worker: WorkerConfig,
    /// Explicit log format; inferred from the build profile when `None`.
    pub log_format: Option<LogFormatSetting>,
}
