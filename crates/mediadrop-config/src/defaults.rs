//! Settings keys and their defaults.
//!
//! # Design
//! - Centralize keys so loaders, tests, and docs agree on names.
//! - Keep time-based defaults explicit in seconds.

pub(crate) const BIND_ADDR: &str = "MEDIADROP_BIND_ADDR";
pub(crate) const HTTP_PORT: &str = "MEDIADROP_HTTP_PORT";
pub(crate) const PUBLIC_BASE_URL: &str = "MEDIADROP_PUBLIC_BASE_URL";
pub(crate) const SESSIONS_ROOT: &str = "MEDIADROP_SESSIONS_ROOT";
pub(crate) const SCRATCH_DIR: &str = "MEDIADROP_SCRATCH_DIR";
pub(crate) const SESSION_TTL_SECS: &str = "MEDIADROP_SESSION_TTL_SECS";
pub(crate) const SWEEP_INTERVAL_SECS: &str = "MEDIADROP_SWEEP_INTERVAL_SECS";
pub(crate) const WORKER_PROGRAM: &str = "MEDIADROP_WORKER_PROGRAM";
pub(crate) const WORKER_SCRIPT: &str = "MEDIADROP_WORKER_SCRIPT";
pub(crate) const WORKER_DOWNLOADER: &str = "MEDIADROP_WORKER_DOWNLOADER";
pub(crate) const WORKER_HOME: &str = "MEDIADROP_WORKER_HOME";
pub(crate) const WORKER_TIMEOUT_SECS: &str = "MEDIADROP_WORKER_TIMEOUT_SECS";
pub(crate) const CREDENTIALS_PATH: &str = "MEDIADROP_CREDENTIALS_PATH";
pub(crate) const LOG_FORMAT: &str = "MEDIADROP_LOG_FORMAT";

/// Every key read by [`crate::AppConfig::load`].
pub const ALL_KEYS: &[&str] = &[
    BIND_ADDR,
    HTTP_PORT,
    PUBLIC_BASE_URL,
    SESSIONS_ROOT,
    SCRATCH_DIR,
    SESSION_TTL_SECS,
    SWEEP_INTERVAL_SECS,
    WORKER_PROGRAM,
    WORKER_SCRIPT,
    WORKER_DOWNLOADER,
    WORKER_HOME,
    WORKER_TIMEOUT_SECS,
    CREDENTIALS_PATH,
    LOG_FORMAT,
];

pub(crate) const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
pub(crate) const DEFAULT_HTTP_PORT: u16 = 8080;
pub(crate) const DEFAULT_SESSIONS_ROOT: &str = "storage/downloads";
pub(crate) const DEFAULT_SCRATCH_DIR: &str = "storage/scratch";
pub(crate) const DEFAULT_SESSION_TTL_SECS: u64 = 6 * 60 * 60;
pub(crate) const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 10 * 60;
pub(crate) const DEFAULT_WORKER_PROGRAM: &str = "python3";
pub(crate) const DEFAULT_WORKER_SCRIPT: &str = "python_worker/instagram_fetch.py";
pub(crate) const DEFAULT_WORKER_TIMEOUT_SECS: u64 = 60;
pub(crate) const MAX_WORKER_TIMEOUT_SECS: u64 = 600;
pub(crate) const DEFAULT_CREDENTIALS_PATH: &str = "python_worker/cookies";
