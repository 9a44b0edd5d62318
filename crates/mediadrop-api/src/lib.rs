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

//! HTTP surface for MediaDrop: the fetch endpoint and session downloads.
//!
//! Layout: `pipeline.rs` (fetch stages from URL to links), `models.rs`
//! (response bodies), `state.rs` (shared dependencies), `http/` (router,
//! handlers, error mapping, metrics middleware), `error.rs` (server errors).

pub mod error;
pub mod http;
pub mod models;
pub(crate) mod pipeline;
pub mod state;

pub use error::{ApiServerError, ApiServerResult};
pub use http::router::ApiServer;
pub use models::{FailureBody, FetchRequest, FetchResponse};
pub use state::ApiDependencies;
