#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Engine-agnostic media pipeline types shared across the workspace.
//!
//! Layout: `model` (worker replies, assets, credential bundles, session ids),
//! `source.rs` (input URL shape validation), `paths.rs` (basename reduction),
//! `service` (the `MediaWorker` seam), `error.rs` (typed failures).

pub mod error;
pub mod model;
pub mod paths;
pub mod service;
pub mod source;

pub use error::{SourceUrlError, WorkerError, WorkerResult};
pub use model::{
    CredentialBundle, FailureCategory, MediaKind, SessionId, SourceKind, WorkerAsset,
    WorkerFailure, WorkerReply, WorkerSuccess,
};
pub use paths::basename;
pub use service::MediaWorker;
pub use source::{MAX_SOURCE_URL_LEN, SourceUrl};
