//! Typed errors for the extraction library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so the worker can
//! tell a configuration mistake from a network failure from a bad record.

use thiserror::Error;

/// Errors that abort one extraction run.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Fetching the page failed on every attempt
    #[error("fetching {url} failed after {attempts} attempt(s): {source}")]
    FetchExhausted {
        url: String,
        attempts: u32,
        #[source]
        source: FetchError,
    },

    /// The run was cancelled (shutdown or caller deadline)
    #[error("extraction cancelled")]
    Cancelled,

    /// The seed URL could not be parsed
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// A configured CSS selector does not parse
    #[error("invalid selector for {field}: {selector}")]
    Selector { field: &'static str, selector: String },

    /// The site answered with an anti-bot challenge instead of listings
    #[error("challenge page encountered at {url}")]
    ChallengeDetected { url: String },
}

/// Errors from a single page fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed (connection, TLS, body read)
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// URL does not parse or is not http(s)
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Request exceeded its timeout
    #[error("timeout fetching: {url}")]
    Timeout { url: String },
}

/// Errors from numeric value parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty price string")]
    Empty,

    #[error("no numeric value found in: {0}")]
    NoDigits(String),

    #[error("invalid number: {0}")]
    InvalidNumber(String),
}

/// Why one candidate node did not become a listing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("parsing price: {0}")]
    Price(#[from] ParseError),

    #[error("price must be positive, got {0}")]
    NonPositivePrice(f64),
}

/// Errors from the retry policy.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every attempt failed; carries the last underlying error
    #[error("max retry attempts ({attempts}) exceeded: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: E,
    },

    /// Cancellation was observed before or between attempts
    #[error("retry cancelled")]
    Cancelled,
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;
