//! Background reclamation of expired session directories.

use std::time::Duration;

use mediadrop_sessions::{SessionStore, SweepReport};
use mediadrop_telemetry::Metrics;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Sweep `store` every `interval`, removing sessions older than `ttl`.
///
/// The first pass runs immediately and `interval` must be non-zero. Abort the
/// returned handle to stop the task.
#[must_use]
pub fn spawn_retention_sweep(
    store: SessionStore,
    ttl: Duration,
    interval: Duration,
    telemetry: Metrics,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            ttl_secs = ttl.as_secs(),
            interval_secs = interval.as_secs(),
            "session retention sweep started"
        );
        loop {
            ticker.tick().await;
            sweep_once(&store, ttl, &telemetry).await;
        }
    })
}

/// Run one sweep pass on the blocking pool and record the outcome.
pub async fn sweep_once(
    store: &SessionStore,
    ttl: Duration,
    telemetry: &Metrics,
) -> Option<SweepReport> {
    let blocking_store = store.clone();
    let result = tokio::task::spawn_blocking(move || blocking_store.sweep_expired(ttl)).await;
    match result {
        Ok(Ok(report)) => {
            telemetry.add_sessions_swept(u64::try_from(report.removed).unwrap_or(u64::MAX));
            if report.removed > 0 || report.failed > 0 {
                info!(
                    examined = report.examined,
                    removed = report.removed,
                    failed = report.failed,
                    "expired sessions reclaimed"
                );
            } else {
                debug!(examined = report.examined, "no expired sessions");
            }
            Some(report)
        }
        Ok(Err(err)) => {
            warn!(error = %err, root = %store.root().display(), "session sweep failed");
            None
        }
        Err(err) => {
            warn!(error = %err, "session sweep task failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use mediadrop_test_support::fixtures::{scratch_root, write_asset};

    #[tokio::test]
    async fn sweep_once_reclaims_expired_sessions_only() -> Result<()> {
        let root = scratch_root()?;
        let store = SessionStore::open(root.path().join("downloads"))?;
        let session = store.create()?;
        write_asset(session.dir(), "a.jpg", b"bytes")?;
        std::fs::create_dir(store.root().join("not-a-session"))?;
        let telemetry = Metrics::new()?;

        let kept = sweep_once(&store, Duration::from_secs(3600), &telemetry).await;
        assert_eq!(kept.map(|report| (report.examined, report.removed)), Some((1, 0)));
        assert!(session.dir().is_dir());

        let swept = sweep_once(&store, Duration::ZERO, &telemetry).await;
        assert_eq!(swept.map(|report| report.removed), Some(1));
        assert!(!session.dir().exists());
        assert!(store.root().join("not-a-session").is_dir());
        assert_eq!(telemetry.snapshot().sessions_swept_total, 1);
        Ok(())
    }

    #[tokio::test]
    async fn spawned_sweep_runs_until_aborted() -> Result<()> {
        let root = scratch_root()?;
        let store = SessionStore::open(root.path().join("downloads"))?;
        let session = store.create()?;
        let telemetry = Metrics::new()?;

        let handle = spawn_retention_sweep(
            store.clone(),
            Duration::ZERO,
            Duration::from_millis(20),
            telemetry.clone(),
        );
        for _ in 0..100 {
            if !session.dir().exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(!session.dir().exists());
        assert!(!handle.is_finished());

        handle.abort();
        let joined = handle.await;
        assert!(joined.is_err_and(|err| err.is_cancelled()));
        assert!(telemetry.snapshot().sessions_swept_total >= 1);
        Ok(())
    }
}
