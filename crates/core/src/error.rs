//! Error types for pipeline operations.
//!
//! This module defines the main error type [`PaperboyError`] which covers
//! every failure the pipeline can surface: fetching, extraction, file I/O,
//! external conversion, and cache cleanup.
//!
//! # Example
//!
//! ```rust
//! use paperboy_core::{PaperboyError, Result};
//!
//! fn extract_title(html: &str) -> Result<String> {
//!     if html.is_empty() {
//!         return Err(PaperboyError::NoContent);
//!     }
//!     # Ok(String::new())
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for fetch-and-convert operations.
///
/// Callers that only care about the broad category can match on the
/// variant groups: `Http`/`Timeout`/`BadStatus`/`InvalidUrl` are fetch
/// failures, `Extraction`/`NoContent` are extraction failures, `Io` is a
/// filesystem failure, `Conversion`/`ConversionTimeout` are packaging
/// failures, and `Cleanup` is a best-effort purge failure that is safe
/// to log and ignore.
#[derive(Error, Debug)]
pub enum PaperboyError {
    /// HTTP request errors from reqwest (DNS, connect, TLS, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request exceeded the configured timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// The server answered with a non-success status code.
    ///
    /// Error pages are not articles. The pipeline refuses to extract from
    /// them rather than mailing a rendered 404.
    #[error("Unexpected HTTP status {status} for {url}")]
    BadStatus { status: u16, url: String },

    /// The input could not be parsed as an absolute http(s) URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTML parsing or content selection failed.
    #[error("Failed to extract readable content: {0}")]
    Extraction(String),

    /// The document has no body or no text at all.
    #[error("No content could be extracted from the document")]
    NoContent,

    /// Cache directory or file operations failed.
    #[error("Filesystem operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// The external converter exited with a non-zero status.
    #[error("{tool} exited with status {status}: {stderr}")]
    Conversion {
        tool: String,
        status: i32,
        stderr: String,
    },

    /// The external converter ran past its time budget and was killed.
    #[error("{tool} timed out after {timeout} seconds")]
    ConversionTimeout { tool: String, timeout: u64 },

    /// One or more registered cache files could not be deleted.
    ///
    /// Non-fatal by contract: the purge always visits every entry before
    /// reporting the ones it could not remove.
    #[error("Failed to remove {} cached file(s)", failed.len())]
    Cleanup { failed: Vec<PathBuf> },
}

/// Result type alias for [`PaperboyError`].
pub type Result<T> = std::result::Result<T, PaperboyError>;
