//! The archive pipeline.
//!
//! Walks a channel's history backward one page at a time, transforms every
//! message into an archive record, and writes the records oldest first once
//! the channel is exhausted.
//!
//! ```text
//!            page.len() == page_size
//!              ┌────────────┐
//!              ▼            │
//! start ──► Fetching(cursor) ──► Done ──► write <channelID>.json
//!                  │   page.len() < page_size
//!                  └──► RetrievalError: abort, nothing written
//! ```

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::core::fetcher::PageFetcher;
use crate::core::output::write_json;
use crate::core::store::{ContentStore, StoreStats};
use crate::core::transform::{RecordTransformer, Transformed};
use crate::error::{ArchiveError, Disposition, FailurePolicy, Result, RetrievalErrorKind};
use crate::message::ArchivedMessage;
use crate::progress::{Progress, ProgressCallback};
use crate::source::{ContentFetcher, MessageSource, RawMessage, Snowflake};

/// Pipeline state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    /// More pages may exist before the cursor (`None`: start from the newest).
    Fetching(Option<Snowflake>),
    /// The channel is exhausted.
    Done,
}

impl PipelineState {
    /// State after a full or partial page was fetched.
    pub fn after_page(page: &[RawMessage], page_size: usize) -> Self {
        if page.len() < page_size {
            return PipelineState::Done;
        }
        match page.iter().map(|m| &m.id).min() {
            Some(oldest) => PipelineState::Fetching(Some(oldest.clone())),
            None => PipelineState::Done,
        }
    }
}

/// Outcome of a pipeline run.
#[derive(Debug, Clone)]
pub struct ArchiveSummary {
    /// Archived records, oldest first.
    pub records: Vec<ArchivedMessage>,

    /// Page fetch calls issued.
    pub pages_fetched: usize,

    /// Messages delivered more than once by the source and skipped.
    pub duplicates_skipped: usize,

    /// Content store counters.
    pub assets: StoreStats,

    /// Timestamp of the oldest archived message, if parseable.
    pub oldest: Option<DateTime<Utc>>,

    /// Timestamp of the newest archived message, if parseable.
    pub newest: Option<DateTime<Utc>>,

    /// Where the JSON was written (`None` for [`ArchivePipeline::collect`]).
    pub output_path: Option<PathBuf>,
}

impl ArchiveSummary {
    pub fn message_count(&self) -> usize {
        self.records.len()
    }
}

/// Drives page fetching, transformation and serialization for one channel.
///
/// # Example
///
/// ```rust,no_run
/// # #[cfg(feature = "http")]
/// # fn main() -> chanarchive::Result<()> {
/// use chanarchive::config::RunConfig;
/// use chanarchive::core::ArchivePipeline;
/// use chanarchive::source::{DiscordClient, HttpFetcher};
///
/// let config = RunConfig::new("token", "123456789");
/// let source = DiscordClient::new(&config)?;
/// let fetcher = HttpFetcher::new(config.connect_timeout, config.request_timeout)?;
///
/// let summary = ArchivePipeline::new(config, source, fetcher).run()?;
/// println!("archived {} messages", summary.message_count());
/// # Ok(())
/// # }
/// # #[cfg(not(feature = "http"))]
/// # fn main() {}
/// ```
pub struct ArchivePipeline<S, F> {
    config: RunConfig,
    fetcher: PageFetcher<S>,
    store: ContentStore<F>,
    policy: FailurePolicy,
    progress: Option<ProgressCallback>,
}

impl<S: MessageSource, F: ContentFetcher> ArchivePipeline<S, F> {
    /// Creates a pipeline. The failure policy follows `config.strict`.
    pub fn new(config: RunConfig, source: S, content: F) -> Self {
        let policy = if config.strict {
            FailurePolicy::strict()
        } else {
            FailurePolicy::best_effort()
        };
        let fetcher = PageFetcher::new(source, config.channel_id.clone(), config.page_size);
        Self {
            config,
            fetcher,
            store: ContentStore::new(content),
            policy,
            progress: None,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Archives the whole channel and writes `<channelID>.json`.
    pub fn run(&mut self) -> Result<ArchiveSummary> {
        let mut summary = self.collect()?;
        let path = self.config.output_path();
        write_json(&summary.records, &path)?;
        info!(
            path = %path.display(),
            messages = summary.records.len(),
            "archive written"
        );
        summary.output_path = Some(path);
        Ok(summary)
    }

    /// Archives the whole channel without writing the JSON document.
    ///
    /// Assets are still downloaded.
    pub fn collect(&mut self) -> Result<ArchiveSummary> {
        info!(
            channel = %self.config.channel_id,
            before = self.config.start_before.as_ref().map(Snowflake::as_str).unwrap_or("<newest>"),
            page_size = self.config.page_size,
            "archiving channel"
        );
        self.fetcher.open()?;
        let result = self.fetch_all();
        self.fetcher.close();
        result
    }

    fn fetch_all(&mut self) -> Result<ArchiveSummary> {
        let avatars_dir = self.config.avatars_dir();
        let channel_dir = self.config.channel_dir();
        let page_size = self.fetcher.page_size();
        let calls_before = self.fetcher.calls();

        let mut collected: Vec<(Snowflake, ArchivedMessage)> = Vec::new();
        let mut seen: HashSet<Snowflake> = HashSet::new();
        let mut duplicates_skipped = 0;

        let mut state = PipelineState::Fetching(self.config.start_before.clone());
        while let PipelineState::Fetching(cursor) = state {
            let page = self.fetcher.fetch(cursor.as_ref())?;

            let mut transformer = RecordTransformer::new(&mut self.store, &avatars_dir, &channel_dir);
            for raw in &page {
                if !seen.insert(raw.id.clone()) {
                    debug!(message_id = %raw.id, "skipping duplicate message");
                    duplicates_skipped += 1;
                    continue;
                }
                let Transformed {
                    record,
                    asset_errors,
                } = transformer.transform(raw);
                for err in asset_errors {
                    match self.policy.classify(&err) {
                        Disposition::Continue => {
                            warn!(message_id = %raw.id, error = %err, "asset not archived");
                        }
                        Disposition::Abort => return Err(err),
                    }
                }
                collected.push((raw.id.clone(), record));
            }

            state = PipelineState::after_page(&page, page_size);
            if let (Some(prev), PipelineState::Fetching(Some(next))) = (&cursor, &state) {
                if next >= prev {
                    return Err(ArchiveError::retrieval(
                        format!("messages of channel {}", self.config.channel_id),
                        RetrievalErrorKind::Other(format!(
                            "page before {prev} returned message {next}, which is not older"
                        )),
                    ));
                }
            }

            if let Some(callback) = &self.progress {
                let progress = Progress::new(
                    self.fetcher.calls() - calls_before,
                    page.len(),
                    collected.len(),
                )
                .with_assets(self.store.stats());
                callback(progress);
            }
        }

        // Pages arrive newest first; one stable sort by ID yields oldest first
        // whatever order the source used within a page.
        collected.sort_by(|a, b| a.0.cmp(&b.0));
        let records: Vec<ArchivedMessage> = collected.into_iter().map(|(_, r)| r).collect();

        let (oldest, newest) = timestamp_bounds(&records);
        Ok(ArchiveSummary {
            records,
            pages_fetched: self.fetcher.calls() - calls_before,
            duplicates_skipped,
            assets: self.store.stats(),
            oldest,
            newest,
            output_path: None,
        })
    }
}

fn timestamp_bounds(records: &[ArchivedMessage]) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let parsed = records
        .iter()
        .filter_map(|r| DateTime::parse_from_rfc3339(&r.timestamp).ok())
        .map(|dt| dt.to_utc());
    parsed.fold((None, None), |(lo, hi), ts| {
        (
            Some(lo.map_or(ts, |lo: DateTime<Utc>| lo.min(ts))),
            Some(hi.map_or(ts, |hi: DateTime<Utc>| hi.max(ts))),
        )
    })
}
