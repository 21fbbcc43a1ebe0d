//! Progress reporting for archive runs.
//!
//! The pipeline pushes a [`Progress`] snapshot to an optional callback after
//! every page it processes.
//!
//! # Example
//!
//! ```rust
//! use chanarchive::progress::{Progress, ProgressCallback};
//! use std::sync::Arc;
//!
//! let callback: ProgressCallback = Arc::new(|progress| {
//!     println!("page {}: {} messages", progress.pages_fetched, progress.messages_archived);
//! });
//!
//! callback(Progress::new(1, 100, 100));
//! ```

use std::sync::Arc;

use crate::core::store::StoreStats;

/// Snapshot of a running archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Pages fetched so far.
    pub pages_fetched: usize,

    /// Messages in the page just processed.
    pub last_page_len: usize,

    /// Records accumulated so far.
    pub messages_archived: usize,

    /// Assets downloaded so far.
    pub assets_downloaded: usize,

    /// Assets already on disk.
    pub assets_cached: usize,

    /// Assets whose download failed.
    pub assets_failed: usize,
}

impl Progress {
    pub fn new(pages_fetched: usize, last_page_len: usize, messages_archived: usize) -> Self {
        Self {
            pages_fetched,
            last_page_len,
            messages_archived,
            ..Self::default()
        }
    }

    /// Copies the asset counters from the content store.
    #[must_use]
    pub fn with_assets(mut self, stats: StoreStats) -> Self {
        self.assets_downloaded = stats.downloaded;
        self.assets_cached = stats.cached;
        self.assets_failed = stats.failed;
        self
    }

    /// Total assets seen (downloaded, cached or failed).
    pub fn assets_total(&self) -> usize {
        self.assets_downloaded + self.assets_cached + self.assets_failed
    }
}

/// Callback type for receiving progress updates.
pub type ProgressCallback = Arc<dyn Fn(Progress) + Send + Sync>;
