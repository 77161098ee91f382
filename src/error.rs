//! Error types for the vtt-maps library.
//!
//! Three error types mirror the three components:
//!
//! * [`CatalogError`]: talking to the remote listing service or saving what
//!   it returned. A failed map inside a category run is recorded in the
//!   [`crate::output::CategoryReport`] instead of aborting the run.
//!
//! * [`LibraryError`]: scanning the local maps folder or writing the index.
//!   Per-file codec failures are not here; they stay inside
//!   [`crate::output::FileOutcome`] so one bad file never hides the others.
//!
//! * [`ConfigError`]: builder validation.
//!
//! Codec failures use [`dd2vtt::CodecError`], re-exported from the crate root.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the remote catalog and the downloader.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The server answered 404.
    #[error("Not found: '{url}'")]
    NotFound { url: String },

    /// The server answered with any other non-2xx status.
    #[error("Service unavailable for '{url}': HTTP {status}")]
    ServiceUnavailable { url: String, status: u16 },

    /// The request never produced a response (DNS, TLS, connection reset).
    #[error("Request to '{url}' failed: {reason}\nCheck your internet connection.")]
    Request { url: String, reason: String },

    /// The request exceeded the configured timeout.
    #[error("Request timed out after {secs}s for '{url}'\nIncrease --timeout.")]
    Timeout { url: String, secs: u64 },

    /// The listing body was not the expected JSON array.
    #[error("Invalid listing from '{url}': {reason}")]
    InvalidListing { url: String, reason: String },

    /// The category is not part of the configured catalog.
    #[error("Unknown category '{category}'. Available: {available}")]
    UnknownCategory { category: String, available: String },

    /// Could not save a downloaded file.
    #[error("Failed to write '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl CatalogError {
    /// True for failures that came back from the server as a status code.
    pub fn is_http_status(&self) -> bool {
        matches!(
            self,
            CatalogError::NotFound { .. } | CatalogError::ServiceUnavailable { .. }
        )
    }
}

/// Errors from the local map library.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// The maps folder does not exist.
    #[error("No maps folder found at '{path}'\nDownload some maps first: vttmaps download --sample")]
    MapsDirMissing { path: PathBuf },

    /// A directory could not be listed.
    #[error("Failed to scan '{path}': {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The index could not be serialised.
    #[error("Failed to serialise map index: {0}")]
    IndexSerialize(#[from] serde_json::Error),

    /// The index file could not be written.
    #[error("Failed to write index '{path}': {source}")]
    IndexWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration validation failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
