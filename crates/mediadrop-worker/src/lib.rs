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

//! External media worker adapter.
//!
//! Layout: `credentials.rs` (cookie bundle discovery), `invoker.rs` (process
//! launch and capture), `protocol.rs` (stdout result decoding), `adapter.rs`
//! (the [`ProcessWorker`] implementation of `MediaWorker`).

pub mod adapter;
pub mod credentials;
pub mod invoker;
pub mod protocol;

pub use adapter::ProcessWorker;
pub use credentials::discover_credentials;
pub use invoker::{DEFAULT_WORKER_TIMEOUT, ProcessInvoker, WorkerCommand, WorkerOutput};
pub use protocol::decode;
