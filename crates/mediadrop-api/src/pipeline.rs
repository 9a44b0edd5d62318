//! Fetch pipeline from submitted URL to client download links.
//!
//! # Design
//! - Stages run strictly in order; any stage may end the fetch as `Failed(category)`.
//! - URL validation and worker preflight happen before any filesystem or process cost.
//! - A failed fetch removes its own session directory and never returns partial results.
//! - Session allocation, link translation and cleanup touch the filesystem on the blocking pool.

use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::time::Instant;

use mediadrop_core::{CredentialBundle, SourceUrl, WorkerError, WorkerReply};
use mediadrop_sessions::{FetchSession, SessionError};
use mediadrop_telemetry::{FETCH_SUCCESS, current_request_id, record_fetch_stage};
use tokio::task::JoinError;
use tracing::{error, info, warn};

use crate::http::errors::ApiError;
use crate::models::FetchResponse;
use crate::state::ApiState;

/// Position of a fetch within the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FetchStage {
    Validating,
    SessionCreated,
    WorkerRunning,
    Decoding,
    Translating,
    Responding,
}

impl FetchStage {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::SessionCreated => "session_created",
            Self::WorkerRunning => "worker_running",
            Self::Decoding => "decoding",
            Self::Translating => "translating",
            Self::Responding => "responding",
        }
    }

    fn enter(self) -> Self {
        record_fetch_stage(self.as_str());
        self
    }
}

impl Display for FetchStage {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Terminal `Failed` state: the stage that failed, the client error and the logged cause.
#[derive(Debug)]
struct StageFailure {
    stage: FetchStage,
    error: ApiError,
    cause: Option<String>,
}

impl StageFailure {
    const fn new(stage: FetchStage, error: ApiError) -> Self {
        Self {
            stage,
            error,
            cause: None,
        }
    }

    fn caused_by(mut self, cause: &dyn Error) -> Self {
        self.cause = Some(describe(cause));
        self
    }

    fn worker(stage: FetchStage, err: &WorkerError) -> Self {
        let stage = if matches!(err, WorkerError::Parse { .. }) {
            FetchStage::Decoding
        } else {
            stage
        };
        Self::new(stage, ApiError::from_worker(err)).caused_by(err)
    }

    fn session(stage: FetchStage, err: &SessionError) -> Self {
        Self::new(stage, ApiError::internal()).caused_by(err)
    }

    fn joined(stage: FetchStage, err: &JoinError) -> Self {
        Self::new(stage, ApiError::internal()).caused_by(err)
    }
}

/// Run one fetch for the raw `url` submitted by a client.
pub(crate) async fn run_fetch(state: &ApiState, url: &str) -> Result<FetchResponse, ApiError> {
    let mut session = None;
    let outcome = execute(state, url, &mut session).await;
    match outcome {
        Ok(response) => {
            state.telemetry.inc_fetch(FETCH_SUCCESS);
            Ok(response)
        }
        Err(failure) => {
            if let Some(session) = session {
                discard(state, session).await;
            }
            report(state, &failure);
            Err(failure.error)
        }
    }
}

async fn discard(state: &ApiState, session: FetchSession) {
    let id = session.id();
    let store = state.store.clone();
    let cause = match tokio::task::spawn_blocking(move || store.discard(&session)).await {
        Ok(Ok(())) => return,
        Ok(Err(err)) => describe(&err),
        Err(join) => format!("cleanup task failed: {join}"),
    };
    warn!(session_id = %id, error = %cause, "failed session could not be removed");
}

async fn execute(
    state: &ApiState,
    raw_url: &str,
    allocated: &mut Option<FetchSession>,
) -> Result<FetchResponse, StageFailure> {
    let stage = FetchStage::Validating.enter();
    let url = SourceUrl::parse(raw_url).map_err(|err| {
        StageFailure::new(stage, ApiError::invalid_url(&err)).caused_by(&err)
    })?;
    let credentials = state
        .worker
        .preflight()
        .await
        .map_err(|err| StageFailure::worker(stage, &err))?;

    let store = state.store.clone();
    let session = tokio::task::spawn_blocking(move || store.create())
        .await
        .map_err(|err| StageFailure::joined(stage, &err))?
        .map_err(|err| StageFailure::session(stage, &err))?;
    FetchStage::SessionCreated.enter();
    let session = allocated.insert(session);
    info!(
        session_id = %session.id(),
        created_at = %session.created_at(),
        source_url = %url,
        kind = url.kind().as_str(),
        credential_files = credentials.len(),
        "fetch session created"
    );

    let reply = invoke(state, &url, session, &credentials).await?;

    let stage = FetchStage::Decoding.enter();
    let success = match reply {
        WorkerReply::Success(success) => success,
        WorkerReply::Failure(failure) => {
            return Err(StageFailure::new(stage, ApiError::business(failure)));
        }
    };

    let stage = FetchStage::Translating.enter();
    let links = state.links.clone();
    let scope = session.clone();
    let (success, translated) = tokio::task::spawn_blocking(move || {
        let translated = links.translate(&scope, &success);
        (success, translated)
    })
    .await
    .map_err(|err| StageFailure::joined(stage, &err))?;

    FetchStage::Responding.enter();
    info!(
        session_id = %session.id(),
        items = translated.items.len(),
        dropped = translated.dropped,
        "fetch completed"
    );
    Ok(FetchResponse::new(session.id(), url.kind(), success, translated))
}

async fn invoke(
    state: &ApiState,
    url: &SourceUrl,
    session: &FetchSession,
    credentials: &CredentialBundle,
) -> Result<WorkerReply, StageFailure> {
    let stage = FetchStage::WorkerRunning.enter();
    let started = Instant::now();
    let reply = state.worker.invoke(url, session.dir(), credentials).await;
    let elapsed = started.elapsed();
    state.telemetry.observe_worker_duration(elapsed);
    info!(
        session_id = %session.id(),
        duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        ok = reply.is_ok(),
        "worker run finished"
    );
    reply.map_err(|err| StageFailure::worker(stage, &err))
}

fn report(state: &ApiState, failure: &StageFailure) {
    let category = failure.error.category();
    state.telemetry.inc_fetch(category.as_str());
    let request_id = current_request_id().unwrap_or_default();
    let cause = failure.cause.as_deref().unwrap_or("");
    if category.is_client_side() {
        info!(
            request_id = %request_id,
            stage = %failure.stage,
            error_type = failure.error.error_type(),
            cause,
            "fetch rejected"
        );
    } else {
        error!(
            request_id = %request_id,
            stage = %failure.stage,
            error_type = failure.error.error_type(),
            cause,
            "fetch failed"
        );
    }
}

fn describe(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}
