//! Error types for the terminwatch crate
//!
//! Fetch failures carry the taxonomy that the scheduler maps onto wire
//! status codes; everything else funnels into the unified [`Error`] enum.

use thiserror::Error;

/// Errors that can occur while fetching a calendar page
#[derive(Error, Debug)]
pub enum FetchError {
    /// Upstream responded with a non-success HTTP status
    #[error("upstream returned HTTP {status} for {url}")]
    Upstream { status: u16, url: String },

    /// Could not establish or complete the network exchange
    #[error("connection failed: {0}")]
    Connection(String),

    /// No response within the allotted time
    #[error("request timed out")]
    Timeout,

    /// Client-side HTTP failure (builder, redirect loop, body decode)
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Errors that can occur during markup extraction
///
/// Bookable-date extraction never fails (unparseable elements are skipped);
/// only the one-time booking-link resolution has a failure mode.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The service page carries no booking-calendar link
    #[error("no booking calendar link found on the service page")]
    BookingLinkNotFound,
}

/// Unified error type for the terminwatch crate
#[derive(Error, Debug)]
pub enum Error {
    /// Fetch errors
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Parse errors
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
