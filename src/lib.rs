//! # chanarchive
//!
//! Archives the complete message history of a Discord channel into a local,
//! self-contained snapshot.
//!
//! ## Overview
//!
//! One run walks the channel backward from the newest message (or from a resume
//! point), page by page, until the history is exhausted. Along the way it:
//!
//! - downloads every author's avatar once into `pfps/<authorID>`
//! - downloads every attachment into `<channelID>/<messageID>_<filename>`
//! - maps each message to a fixed archive record ([`ArchivedMessage`])
//!
//! and finally writes all records, oldest first, to `<channelID>.json`.
//!
//! Downloads are idempotent: a file already on disk is never fetched again, so
//! re-running against the same directory only fetches what is missing.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # #[cfg(feature = "http")]
//! # fn main() -> chanarchive::Result<()> {
//! use chanarchive::prelude::*;
//!
//! let config = RunConfig::new("bot-token", "123456789").with_root_dir("archive");
//! config.validate()?;
//! config.prepare_dirs()?;
//!
//! let source = DiscordClient::new(&config)?;
//! let content = HttpFetcher::new(config.connect_timeout, config.request_timeout)?;
//! let summary = ArchivePipeline::new(config, source, content).run()?;
//!
//! println!("{} messages archived", summary.message_count());
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "http"))]
//! # fn main() {}
//! ```
//!
//! ## Module Structure
//!
//! - [`config`] - [`RunConfig`](config::RunConfig) and the on-disk layout
//! - [`source`] - platform types, the [`MessageSource`](source::MessageSource)
//!   and [`ContentFetcher`](source::ContentFetcher) seams, HTTP implementations
//! - [`core`] - content store, page fetcher, transformer, pipeline, JSON output
//! - [`message`] - archive record types
//! - [`progress`] - per-page progress callbacks
//! - [`error`] - [`ArchiveError`], [`Result`] and the failure policy
//! - `cli` - command-line arguments (feature `cli`)
//! - [`prelude`] - convenient re-exports

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod message;
pub mod progress;
pub mod source;

// Re-export the main types at the crate root for convenience
pub use error::{ArchiveError, Result};
pub use message::{ArchivedAttachment, ArchivedMessage, ArchivedReaction};

/// Convenient re-exports for common usage.
///
/// ```rust
/// use chanarchive::prelude::*;
/// ```
pub mod prelude {
    // Archive records
    pub use crate::message::{ArchivedAttachment, ArchivedMessage, ArchivedReaction};

    // Errors and failure handling
    pub use crate::error::{ArchiveError, Disposition, FailurePolicy, Result};

    // Configuration
    pub use crate::config::RunConfig;

    // Core
    pub use crate::core::{
        ArchivePipeline, ArchiveSummary, ContentKey, ContentStore, PageFetcher, archive_record,
        to_json, write_json,
    };

    // Collaborators
    pub use crate::source::{ContentFetcher, MessageSource, RawMessage, Snowflake};
    #[cfg(feature = "http")]
    pub use crate::source::{DiscordClient, HttpFetcher};

    // Progress
    pub use crate::progress::{Progress, ProgressCallback};
}
