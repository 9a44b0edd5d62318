//! HTTP surface modules (router, handlers, middleware).

/// Shared constants and header names.
pub(crate) mod constants;
/// Session file and archive downloads.
pub(crate) mod downloads;
/// Client-facing error mapping.
pub(crate) mod errors;
/// The fetch endpoint.
pub(crate) mod fetch;
/// Health and diagnostics endpoints.
pub(crate) mod health;
/// Router construction and server host.
pub mod router;
/// Metrics middleware for HTTP requests.
pub(crate) mod telemetry;
