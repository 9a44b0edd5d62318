//! Loading and validating [`AppConfig`] from a [`SettingsProvider`].

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::defaults::{
    BIND_ADDR, CREDENTIALS_PATH, DEFAULT_BIND_ADDR, DEFAULT_CREDENTIALS_PATH, DEFAULT_HTTP_PORT,
    DEFAULT_SCRATCH_DIR, DEFAULT_SESSION_TTL_SECS, DEFAULT_SESSIONS_ROOT,
    DEFAULT_SWEEP_INTERVAL_SECS, DEFAULT_WORKER_PROGRAM, DEFAULT_WORKER_SCRIPT,
    DEFAULT_WORKER_TIMEOUT_SECS, HTTP_PORT, LOG_FORMAT, MAX_WORKER_TIMEOUT_SECS, PUBLIC_BASE_URL,
    SCRATCH_DIR, SESSION_TTL_SECS, SESSIONS_ROOT, SWEEP_INTERVAL_SECS, WORKER_DOWNLOADER,
    WORKER_HOME, WORKER_PROGRAM, WORKER_SCRIPT, WORKER_TIMEOUT_SECS,
};
use crate::error::{ConfigError, ConfigResult};
use crate::model::{AppConfig, HttpConfig, LogFormatSetting, SessionsConfig, WorkerConfig};
use crate::provider::SettingsProvider;

impl AppConfig {
    /// Load configuration, applying defaults for unset keys.
    ///
    /// Relative paths are resolved against the current directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] for the first value that fails
    /// validation.
    pub fn load(settings: &dyn SettingsProvider) -> ConfigResult<Self> {
        let reader = Reader { settings };

        let bind_addr = reader.parsed::<IpAddr>(BIND_ADDR, DEFAULT_BIND_ADDR, "invalid_ip")?;
        let port = reader.number(HTTP_PORT, u64::from(DEFAULT_HTTP_PORT))?;
        let port = u16::try_from(port)
            .ok()
            .filter(|port| *port != 0)
            .ok_or_else(|| ConfigError::invalid(HTTP_PORT, port.to_string(), "out_of_range"))?;
        let public_base_url = normalize_base_url(&reader.string(PUBLIC_BASE_URL, ""))?;

        let root = absolute(&reader.path(SESSIONS_ROOT, DEFAULT_SESSIONS_ROOT)?);
        let scratch_dir = absolute(&reader.path(SCRATCH_DIR, DEFAULT_SCRATCH_DIR)?);
        if scratch_dir.starts_with(&root) {
            return Err(ConfigError::invalid(
                SCRATCH_DIR,
                scratch_dir.display().to_string(),
                "inside_sessions_root",
            ));
        }
        let ttl_secs = reader.number(SESSION_TTL_SECS, DEFAULT_SESSION_TTL_SECS)?;
        if ttl_secs == 0 {
            return Err(ConfigError::invalid(SESSION_TTL_SECS, "0", "must_be_positive"));
        }
        let sweep_secs = reader.number(SWEEP_INTERVAL_SECS, DEFAULT_SWEEP_INTERVAL_SECS)?;

        let program = reader.string(WORKER_PROGRAM, DEFAULT_WORKER_PROGRAM);
        let timeout_secs = reader.number(WORKER_TIMEOUT_SECS, DEFAULT_WORKER_TIMEOUT_SECS)?;
        if !(1..=MAX_WORKER_TIMEOUT_SECS).contains(&timeout_secs) {
            return Err(ConfigError::invalid(
                WORKER_TIMEOUT_SECS,
                timeout_secs.to_string(),
                "out_of_range",
            ));
        }

        let config = Self {
            http: HttpConfig {
                bind_addr,
                port,
                public_base_url,
            },
            sessions: SessionsConfig {
                root,
                scratch_dir,
                ttl: Duration::from_secs(ttl_secs),
                sweep_interval: (sweep_secs > 0).then_some(Duration::from_secs(sweep_secs)),
            },
            worker: WorkerConfig {
                program,
                script: reader.optional_path(WORKER_SCRIPT, DEFAULT_WORKER_SCRIPT),
                downloader: reader.optional_path(WORKER_DOWNLOADER, ""),
                home_dir: reader.optional_path(WORKER_HOME, ""),
                timeout: Duration::from_secs(timeout_secs),
                credentials_path: absolute(&reader.path(CREDENTIALS_PATH, DEFAULT_CREDENTIALS_PATH)?),
            },
            log_format: reader.log_format()?,
        };
        debug!(
            listen = %config.http.socket_addr(),
            sessions_root = %config.sessions.root.display(),
            sweep_enabled = config.sessions.sweep_interval.is_some(),
            "configuration loaded"
        );
        Ok(config)
    }
}

struct Reader<'a> {
    settings: &'a dyn SettingsProvider,
}

impl Reader<'_> {
    fn string(&self, key: &str, default: &str) -> String {
        self.settings
            .get(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| default.to_string())
    }

    fn number(&self, key: &'static str, default: u64) -> ConfigResult<u64> {
        match self.settings.get(key).map(|value| value.trim().to_string()) {
            None => Ok(default),
            Some(value) if value.is_empty() => Ok(default),
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::invalid(key, value, "not_a_number")),
        }
    }

    fn parsed<T: FromStr>(
        &self,
        key: &'static str,
        default: &str,
        reason: &'static str,
    ) -> ConfigResult<T> {
        let value = self.string(key, default);
        value
            .parse()
            .map_err(|_| ConfigError::invalid(key, value, reason))
    }

    fn path(&self, key: &'static str, default: &str) -> ConfigResult<PathBuf> {
        let value = self.string(key, default);
        if value.contains('\0') {
            return Err(ConfigError::invalid(key, value, "contains_nul"));
        }
        Ok(PathBuf::from(value))
    }

    /// Unset falls back to `default`; set-but-empty disables the value.
    fn optional_path(&self, key: &str, default: &str) -> Option<PathBuf> {
        let value = self
            .settings
            .get(key)
            .map_or_else(|| default.to_string(), |value| value.trim().to_string());
        (!value.is_empty()).then(|| absolute(Path::new(&value)))
    }

    fn log_format(&self) -> ConfigResult<Option<LogFormatSetting>> {
        match self.string(LOG_FORMAT, "").to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "json" => Ok(Some(LogFormatSetting::Json)),
            "pretty" => Ok(Some(LogFormatSetting::Pretty)),
            other => Err(ConfigError::invalid(LOG_FORMAT, other, "unknown_format")),
        }
    }
}

fn normalize_base_url(raw: &str) -> ConfigResult<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    let parsed =
        Url::parse(trimmed).map_err(|_| ConfigError::invalid(PUBLIC_BASE_URL, raw, "malformed"))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(ConfigError::invalid(PUBLIC_BASE_URL, raw, "unsupported_scheme"));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(ConfigError::invalid(PUBLIC_BASE_URL, raw, "query_or_fragment"));
    }
    Ok(trimmed.to_string())
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
