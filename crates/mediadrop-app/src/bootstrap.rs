//! # Design
//!
//! - Load configuration once, then wire worker, store, and API from it.
//! - Startup preflight failures are logged, not fatal; fetches re-check per request.
//! - The retention sweep lives only as long as the HTTP server.

use std::sync::Arc;

use mediadrop_api::{ApiDependencies, ApiServer};
use mediadrop_config::{AppConfig, EnvSettings, LogFormatSetting, SettingsProvider};
use mediadrop_core::MediaWorker;
use mediadrop_sessions::{LinkBuilder, SessionStore};
use mediadrop_telemetry::{GlobalContextGuard, LogFormat, LoggingConfig, Metrics};
use mediadrop_worker::{ProcessWorker, WorkerCommand};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::sweep::spawn_retention_sweep;

/// Long-lived services assembled from configuration.
#[derive(Debug, Clone)]
pub struct Services {
    /// Worker used for every fetch.
    pub worker: Arc<ProcessWorker>,
    /// Session storage.
    pub store: SessionStore,
    /// Metrics registry shared by HTTP and background tasks.
    pub telemetry: Metrics,
}

/// Entry point for the MediaDrop boot sequence.
///
/// # Errors
///
/// Returns an error if configuration, telemetry, storage, or the listener fail.
pub async fn run_app() -> AppResult<()> {
    let settings = EnvSettings::new();
    run_app_with(&settings).await
}

async fn run_app_with(settings: &dyn SettingsProvider) -> AppResult<()> {
    let config = AppConfig::load(settings).map_err(|err| AppError::config("config.load", err))?;
    let logging = LoggingConfig {
        format: log_format(config.log_format),
        ..LoggingConfig::default()
    };
    mediadrop_telemetry::init_logging(&logging)
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;
    let _context = GlobalContextGuard::new("serve");

    info!("MediaDrop bootstrap starting");

    let telemetry = Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
    let services = build_services(&config, telemetry)?;

    match services.worker.preflight().await {
        Ok(bundle) => info!(credential_files = bundle.len(), "worker preflight passed"),
        Err(err) => warn!(
            error_type = err.category().as_str(),
            error = %err,
            "worker preflight failed; fetches will be rejected until resolved"
        ),
    }

    let sweep = config.sessions.sweep_interval.map(|interval| {
        spawn_retention_sweep(
            services.store.clone(),
            config.sessions.ttl,
            interval,
            services.telemetry.clone(),
        )
    });
    if sweep.is_none() {
        info!("session retention sweep disabled");
    }

    let api = ApiServer::new(ApiDependencies {
        worker: services.worker,
        store: services.store,
        links: LinkBuilder::new(&config.http.public_base_url),
        scratch_dir: config.sessions.scratch_dir.clone(),
        telemetry: services.telemetry,
    });

    let addr = config.http.socket_addr();
    info!(addr = %addr, "launching API listener");
    let serve_result = api.serve(addr, shutdown_signal()).await;

    if let Some(sweep) = sweep {
        sweep.abort();
        if let Err(err) = sweep.await
            && !err.is_cancelled()
        {
            warn!(error = %err, "retention sweep join failed");
        }
    }

    serve_result.map_err(|err| AppError::api_server("api_server.serve", err))?;
    info!("API server shutdown complete");
    Ok(())
}

/// Build the worker and session store and prepare the scratch directory.
///
/// # Errors
///
/// Returns an error when the scratch directory or session root cannot be created.
pub fn build_services(config: &AppConfig, telemetry: Metrics) -> AppResult<Services> {
    let scratch = &config.sessions.scratch_dir;
    std::fs::create_dir_all(scratch).map_err(|err| AppError::io("scratch.create", scratch, err))?;
    let store = SessionStore::open(&config.sessions.root)
        .map_err(|err| AppError::sessions("store.open", err))?;

    let command = WorkerCommand {
        script: config.worker.script.clone(),
        downloader: config.worker.downloader.clone(),
        home_dir: config.worker.home_dir.clone(),
        timeout: config.worker.timeout,
        ..WorkerCommand::new(config.worker.program.clone())
    };
    let worker = ProcessWorker::new(command, config.worker.credentials_path.clone());

    Ok(Services {
        worker: Arc::new(worker),
        store,
        telemetry,
    })
}

fn log_format(setting: Option<LogFormatSetting>) -> LogFormat {
    match setting {
        Some(LogFormatSetting::Json) => LogFormat::Json,
        Some(LogFormatSetting::Pretty) => LogFormat::Pretty,
        None => LogFormat::infer(),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use mediadrop_config::StaticSettings;
    use mediadrop_core::FailureCategory;
    use mediadrop_test_support::fixtures::scratch_root;

    #[test]
    fn log_format_follows_explicit_setting() {
        assert_eq!(log_format(Some(LogFormatSetting::Json)), LogFormat::Json);
        assert_eq!(log_format(Some(LogFormatSetting::Pretty)), LogFormat::Pretty);
        assert_eq!(log_format(None), LogFormat::infer());
    }

    #[tokio::test]
    async fn build_services_prepares_directories_and_worker() -> Result<()> {
        let root = scratch_root()?;
        let sessions = root.path().join("state/downloads");
        let scratch = root.path().join("state/scratch");
        let settings = StaticSettings::new()
            .with("MEDIADROP_SESSIONS_ROOT", sessions.to_string_lossy())
            .with("MEDIADROP_SCRATCH_DIR", scratch.to_string_lossy())
            .with("MEDIADROP_WORKER_SCRIPT", "")
            .with("MEDIADROP_CREDENTIALS_PATH", root.path().join("absent").to_string_lossy());
        let config = AppConfig::load(&settings)?;

        let services = build_services(&config, Metrics::new()?)?;
        assert!(scratch.is_dir());
        assert_eq!(services.store.root(), sessions.canonicalize()?.as_path());
        assert_eq!(services.worker.invoker().command().program, "python3");

        let preflight = services.worker.preflight().await;
        assert!(matches!(
            preflight.map_err(|err| err.category()),
            Err(FailureCategory::PreconditionMissing)
        ));
        Ok(())
    }

    #[test]
    fn build_services_reports_unusable_scratch_dir() -> Result<()> {
        let root = scratch_root()?;
        let blocker = root.path().join("blocker");
        std::fs::write(&blocker, b"file")?;
        let settings = StaticSettings::new()
            .with("MEDIADROP_SESSIONS_ROOT", root.path().join("downloads").to_string_lossy())
            .with("MEDIADROP_SCRATCH_DIR", blocker.join("scratch").to_string_lossy());
        let config = AppConfig::load(&settings)?;

        let err = build_services(&config, Metrics::new()?).err();
        assert!(matches!(
            err,
            Some(AppError::Io {
                operation: "scratch.create",
                ..
            })
        ));
        Ok(())
    }
}
