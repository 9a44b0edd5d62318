//! Shared HTTP constants (routes, headers, messages).

pub(crate) const ROUTE_FETCH: &str = "/api/fetch";
pub(crate) const ROUTE_DOWNLOAD: &str = "/download/{session}/{filename}";
pub(crate) const ROUTE_DOWNLOAD_ALL: &str = "/download-all/{session}";

pub(crate) const HEADER_FILES_INCLUDED: &str = "x-archive-files-included";
pub(crate) const HEADER_FILES_DISCOVERED: &str = "x-archive-files-discovered";
pub(crate) const ARCHIVE_CONTENT_TYPE: &str = "application/zip";
pub(crate) const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

pub(crate) const DELIVERY_FILE: &str = "file";
pub(crate) const DELIVERY_ARCHIVE: &str = "archive";

pub(crate) const MESSAGE_PRECONDITION: &str = "Server configuration error. Please try again later.";
pub(crate) const MESSAGE_TIMEOUT: &str = "The request timed out. Please try again.";
pub(crate) const MESSAGE_PARSE: &str = "Failed to process Instagram content. Please try again.";
pub(crate) const MESSAGE_INTERNAL: &str = "An unexpected error occurred. Please try again.";
pub(crate) const MESSAGE_NOT_FOUND: &str = "File not found.";
