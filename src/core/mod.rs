//! The archive core.
//!
//! This module contains:
//! - [`store`] - Idempotent on-disk cache for avatars and attachments
//! - [`fetcher`] - One bounded page of channel history per call
//! - [`transform`] - Raw message → archive record
//! - [`pipeline`] - The cursor loop tying everything together
//! - [`output`] - JSON writer for the final archive
//!
//! # Quick Start
//!
//! ```rust
//! use chanarchive::core::{ArchivePipeline, ContentStore, PageFetcher, archive_record, write_json};
//! ```

pub mod fetcher;
pub mod output;
pub mod pipeline;
pub mod store;
pub mod transform;

pub use fetcher::PageFetcher;
pub use output::{to_json, write_json};
pub use pipeline::{ArchivePipeline, ArchiveSummary, PipelineState};
pub use store::{ContentKey, ContentKind, ContentStore, Ensured, StoreStats};
pub use transform::{RecordTransformer, Transformed, archive_record};
