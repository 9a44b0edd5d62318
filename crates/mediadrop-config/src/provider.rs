//! Injected settings sources.
//!
//! # Design
//!
//! - Callers read settings through [`SettingsProvider`]; nothing caches at module level.
//! - [`EnvSettings`] memoizes lookups per key until that key is invalidated.
//! - [`StaticSettings`] serves fixed values for tests and embedding.

use std::collections::HashMap;
use std::env;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Key/value settings source.
pub trait SettingsProvider: Send + Sync {
    /// Current value for `key`, if set.
    fn get(&self, key: &str) -> Option<String>;

    /// Drop any cached value so the next [`SettingsProvider::get`] re-reads `key`.
    fn invalidate(&self, key: &str);
}

/// Process environment with a per-key cache.
#[derive(Debug, Default)]
pub struct EnvSettings {
    cache: Mutex<HashMap<String, Option<String>>>,
}

impl EnvSettings {
    /// Empty cache over the process environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every cached value.
    pub fn invalidate_all(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Option<String>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SettingsProvider for EnvSettings {
    fn get(&self, key: &str) -> Option<String> {
        let mut cache = self.lock();
        if let Some(cached) = cache.get(key) {
            return cached.clone();
        }
        let value = env::var(key).ok();
        cache.insert(key.to_string(), value.clone());
        value
    }

    fn invalidate(&self, key: &str) {
        self.lock().remove(key);
    }
}

/// Fixed in-memory settings.
#[derive(Debug, Clone, Default)]
pub struct StaticSettings {
    values: HashMap<String, String>,
}

impl StaticSettings {
    /// Empty settings; every key falls back to its default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }
}

impl SettingsProvider for StaticSettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn invalidate(&self, _key: &str) {}
}
