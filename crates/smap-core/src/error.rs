//! Error types and handling for smap-core operations.
//!
//! Every fallible operation in the crate returns [`Result<T, Error>`]. Errors
//! are categorized so the top-level sitemap run can log a stable category
//! alongside the message before converting the failure into an
//! unsuccessful [`GenerationOutcome`](crate::GenerationOutcome).
//!
//! ## Error Categories
//!
//! - **URL errors**: the resolver returned something that cannot be turned into
//!   an absolute URL, or a site/request URL is malformed
//! - **Resolution errors**: the URL resolver itself failed for a content node
//! - **Serialization errors**: building the XML document or its metadata failed
//! - **Storage errors**: persisting the generated document failed
//! - **Configuration errors**: invalid or unreadable configuration
//! - **Parse errors**: malformed content-tree documents or enum text
//!
//! Conditions that are part of normal control flow (no matching site, filtered
//! URL, excluded language, cap reached) are never represented as errors.
//!
//! ```rust
//! use smap_core::Error;
//!
//! let err = Error::InvalidUrl("ht!tp://".to_string());
//! assert_eq!(err.category(), "invalid_url");
//! assert!(!err.is_recoverable());
//! ```

use thiserror::Error;

/// The main error type for smap-core operations.
///
/// `Display` provides a short user-facing message; `Debug` keeps the full
/// source chain for logs.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    ///
    /// Covers reading configuration and content-tree files and writing the
    /// generated sitemap. Timeouts and interruptions are considered recoverable.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing operation failed.
    ///
    /// Occurs when a content-tree document or an enum value such as a change
    /// frequency cannot be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Persisting the generated sitemap failed.
    ///
    /// This aborts the whole run; no partial document is ever left behind.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration is invalid or inaccessible.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested node or site does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// URL is malformed or cannot be made absolute.
    ///
    /// ## Common Causes
    ///
    /// - The URL resolver returned an empty or unparsable value
    /// - A configured site URL has no host
    /// - The request's site URL is not absolute
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The URL resolver could not produce a URL for a content node.
    #[error("Resolution failed for node {node}: {reason}")]
    Resolution {
        /// Node that failed to resolve.
        node: u64,
        /// Reason reported by the resolver.
        reason: String,
    },

    /// Serialization failed.
    ///
    /// Covers the XML writer and the JSON metadata sidecar.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error for uncategorized failures.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl Error {
    /// Check if the error might be recoverable by retrying on the next cycle.
    ///
    /// Only transient I/O conditions qualify. A malformed resolver value or a
    /// bad configuration will fail the same way again.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Get the error category as a string identifier.
    ///
    /// Used as a structured field when the top-level run logs a failure.
    ///
    /// - `"io"`, `"parse"`, `"storage"`, `"config"`, `"not_found"`,
    ///   `"invalid_url"`, `"resolution"`, `"serialization"`, `"other"`
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Parse(_) => "parse",
            Self::Storage(_) => "storage",
            Self::Config(_) => "config",
            Self::NotFound(_) => "not_found",
            Self::InvalidUrl(_) => "invalid_url",
            Self::Resolution { .. } => "resolution",
            Self::Serialization(_) => "serialization",
            Self::Other(_) => "other",
        }
    }

    /// Whether this error describes a single content item whose URL could not
    /// be produced, as opposed to a failure of the run as a whole.
    #[must_use]
    pub const fn is_entry_level(&self) -> bool {
        matches!(self, Self::InvalidUrl(_) | Self::Resolution { .. })
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
