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

//! MediaDrop application bootstrap wiring.
//!
//! Layout: `bootstrap.rs` (service wiring), `sweep.rs` (session retention task).

/// Application bootstrap and environment loading.
pub mod bootstrap;
/// Application error types.
pub mod error;
/// Periodic session retention sweep.
pub mod sweep;

pub use bootstrap::{Services, build_services, run_app};
pub use error::{AppError, AppResult};
pub use sweep::spawn_retention_sweep;
