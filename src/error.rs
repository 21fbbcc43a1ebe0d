//! Unified error types for chanarchive.
//!
//! This module provides a single [`ArchiveError`] enum covering every failure the
//! archive pipeline can hit, plus the [`FailurePolicy`] that decides which of
//! them end the run.
//!
//! # Error Taxonomy
//!
//! | Variant | Raised by | Default disposition |
//! |---------|-----------|---------------------|
//! | [`Retrieval`](ArchiveError::Retrieval) | page fetch, session open | abort |
//! | [`Content`](ArchiveError::Content) | avatar / attachment download | continue |
//! | [`Serialization`](ArchiveError::Serialization) | final JSON write | abort |
//! | [`Config`](ArchiveError::Config) | run configuration | abort |
//! | [`Io`](ArchiveError::Io) | directory bootstrap | abort |
//!
//! Binary assets are supplementary and the message record is primary, so
//! content failures are logged and skipped while everything structural
//! fails fast.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::store::ContentKind;

/// A specialized [`Result`] type for chanarchive operations.
///
/// # Example
///
/// ```rust
/// use chanarchive::error::Result;
/// use chanarchive::ArchivedMessage;
///
/// fn my_function() -> Result<Vec<ArchivedMessage>> {
///     Ok(vec![])
/// }
/// ```
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// The error type for all chanarchive operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ArchiveError {
    /// An I/O error outside of asset downloads and output writing.
    ///
    /// Typically raised while creating the output directories.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Retrieving data from the platform API failed.
    ///
    /// Fatal: the run aborts and no output file is written.
    #[error("Failed to retrieve {context}: {source}")]
    Retrieval {
        /// What was being retrieved (e.g. "messages of channel 42 before 900")
        context: String,
        /// The underlying failure
        #[source]
        source: RetrievalErrorKind,
    },

    /// Downloading an avatar or attachment failed.
    ///
    /// Non-fatal under the default policy: the record is still archived and the
    /// referenced local file is simply absent.
    #[error("Failed to archive {kind} '{id}': {source}")]
    Content {
        /// Avatar or attachment
        kind: ContentKind,
        /// The content key id (user ID or `<messageID>_<filename>`)
        id: String,
        /// The underlying failure
        #[source]
        source: ContentErrorKind,
    },

    /// Encoding or writing the archive JSON failed.
    #[error("Failed to write archive{}: {source}", path.as_ref().map(|p| format!(" (file: {})", p.display())).unwrap_or_default())]
    Serialization {
        /// The output path, if the failure happened while writing
        path: Option<PathBuf>,
        /// The underlying failure
        #[source]
        source: SerializationErrorKind,
    },

    /// The run configuration is invalid.
    ///
    /// Reported before any network activity.
    #[error("Invalid configuration for {field}: {message}")]
    Config {
        /// The offending setting
        field: &'static str,
        /// Description of what's wrong
        message: String,
    },
}

/// Kinds of retrieval failures.
#[derive(Debug, Error)]
pub enum RetrievalErrorKind {
    /// Transport-level HTTP failure
    #[cfg(feature = "http")]
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    /// The API answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// The API kept rate limiting after all retry attempts
    #[error("still rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },
    /// The API response could not be decoded
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    /// Generic retrieval failure
    #[error("{0}")]
    Other(String),
}

/// Kinds of content download failures.
#[derive(Debug, Error)]
pub enum ContentErrorKind {
    /// Local file system failure while storing the asset
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Transport-level HTTP failure
    #[cfg(feature = "http")]
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    /// The content server answered with a non-success status
    #[error("HTTP status {0}")]
    Status(u16),
    /// The key would not map to a file inside its directory
    #[error("unsafe file name '{0}'")]
    InvalidKey(String),
}

/// Kinds of serialization failures.
#[derive(Debug, Error)]
pub enum SerializationErrorKind {
    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Writing the output file failed
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl ArchiveError {
    /// Creates a retrieval error.
    pub fn retrieval(context: impl Into<String>, source: RetrievalErrorKind) -> Self {
        ArchiveError::Retrieval {
            context: context.into(),
            source,
        }
    }

    /// Creates a content error for the given key.
    pub fn content(kind: ContentKind, id: impl Into<String>, source: ContentErrorKind) -> Self {
        ArchiveError::Content {
            kind,
            id: id.into(),
            source,
        }
    }

    /// Creates a serialization error.
    pub fn serialization(path: Option<PathBuf>, source: SerializationErrorKind) -> Self {
        ArchiveError::Serialization { path, source }
    }

    /// Creates a configuration error.
    pub fn config(field: &'static str, message: impl Into<String>) -> Self {
        ArchiveError::Config {
            field,
            message: message.into(),
        }
    }

    /// Returns `true` if this is a retrieval error.
    pub fn is_retrieval(&self) -> bool {
        matches!(self, ArchiveError::Retrieval { .. })
    }

    /// Returns `true` if this is a content (asset download) error.
    pub fn is_content(&self) -> bool {
        matches!(self, ArchiveError::Content { .. })
    }

    /// Returns `true` if this is a serialization error.
    pub fn is_serialization(&self) -> bool {
        matches!(self, ArchiveError::Serialization { .. })
    }

    /// Returns `true` if this is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, ArchiveError::Config { .. })
    }
}

// ============================================================================
// Failure policy
// ============================================================================

/// What the pipeline does after an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Report the error and keep archiving.
    Continue,
    /// Stop the run and surface the error to the caller.
    Abort,
}

/// Classifies errors into [`Disposition`]s.
///
/// The default ([`FailurePolicy::best_effort`]) continues past content errors
/// and aborts on everything else. [`FailurePolicy::strict`] aborts on every
/// error, including a failed avatar or attachment download.
///
/// ```rust
/// use chanarchive::error::{ArchiveError, Disposition, FailurePolicy, RetrievalErrorKind};
///
/// let err = ArchiveError::retrieval("messages", RetrievalErrorKind::Other("boom".into()));
/// assert_eq!(FailurePolicy::default().classify(&err), Disposition::Abort);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailurePolicy {
    abort_on_content: bool,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self::best_effort()
    }
}

impl FailurePolicy {
    /// Continue past asset download failures.
    pub fn best_effort() -> Self {
        Self {
            abort_on_content: false,
        }
    }

    /// Abort on any failure.
    pub fn strict() -> Self {
        Self {
            abort_on_content: true,
        }
    }

    /// Returns the disposition for `err`.
    pub fn classify(&self, err: &ArchiveError) -> Disposition {
        match err {
            ArchiveError::Content { .. } if !self.abort_on_content => Disposition::Continue,
            _ => Disposition::Abort,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
