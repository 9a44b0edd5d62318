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

//! Environment-backed configuration for the media pipeline.
//!
//! Layout: `provider.rs` (the injected `SettingsProvider` and its env/static
//! implementations), `model.rs` (typed config), `loader.rs` (parsing and
//! validation), `defaults.rs` (keys and default values).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod provider;

pub use defaults::ALL_KEYS;
pub use error::{ConfigError, ConfigResult};
pub use model::{AppConfig, HttpConfig, LogFormatSetting, SessionsConfig, WorkerConfig};
pub use provider::{EnvSettings, SettingsProvider, StaticSettings};
