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

//! Session-scoped storage for fetched media and its delivery.
//!
//! Layout: `store.rs` (allocation, lookup, retention sweep), `links.rs`
//! (client link translation), `delivery.rs` (single-file resolution and
//! content types), `archive.rs` (zip assembly), `error.rs` (typed failures).

pub mod archive;
pub mod delivery;
pub mod error;
pub mod links;
pub mod store;

pub use archive::SessionArchive;
pub use delivery::{DEFAULT_CONTENT_TYPE, DeliveryFile, content_type_for};
pub use error::{SessionError, SessionResult};
pub use links::{ClientAsset, DOWNLOAD_ALL_ROUTE, DOWNLOAD_ROUTE, LinkBuilder, TranslatedFetch};
pub use store::{FetchSession, MAX_ALLOCATION_ATTEMPTS, SessionStore, SweepReport};
