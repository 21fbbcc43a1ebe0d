//! Bounded page retrieval.

use tracing::debug;

use crate::error::Result;
use crate::source::{MessageSource, RawMessage, Snowflake};

/// Fetches one page of channel history at a time through a [`MessageSource`].
///
/// Pages come back newest first and hold at most [`page_size`](Self::page_size)
/// messages, all strictly older than the cursor.
pub struct PageFetcher<S> {
    source: S,
    channel_id: String,
    page_size: usize,
    calls: usize,
}

impl<S: MessageSource> PageFetcher<S> {
    pub fn new(source: S, channel_id: impl Into<String>, page_size: usize) -> Self {
        Self {
            source,
            channel_id: channel_id.into(),
            page_size,
            calls: 0,
        }
    }

    /// Opens the underlying session.
    pub fn open(&mut self) -> Result<()> {
        self.source.open()
    }

    /// Closes the underlying session.
    pub fn close(&mut self) {
        self.source.close();
    }

    /// Fetches the page before `cursor` (the newest page when `None`).
    pub fn fetch(&mut self, cursor: Option<&Snowflake>) -> Result<Vec<RawMessage>> {
        self.calls += 1;
        let page = self
            .source
            .fetch_page(&self.channel_id, cursor, self.page_size)?;
        debug!(
            channel = %self.channel_id,
            before = cursor.map(Snowflake::as_str).unwrap_or("<newest>"),
            count = page.len(),
            "fetched page"
        );
        Ok(page)
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of [`fetch`](Self::fetch) calls so far.
    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::RawAuthor;

    struct Recording {
        requests: Vec<(String, Option<String>, usize)>,
    }

    impl MessageSource for Recording {
        fn fetch_page(
            &mut self,
            channel_id: &str,
            before: Option<&Snowflake>,
            limit: usize,
        ) -> Result<Vec<RawMessage>> {
            self.requests.push((
                channel_id.to_string(),
                before.map(|b| b.to_string()),
                limit,
            ));
            let author = RawAuthor::new("1", "A", "0001", "u");
            Ok(vec![RawMessage::new("5", author, "x", "t")])
        }
    }

    #[test]
    fn test_passes_cursor_and_limit() {
        let mut fetcher = PageFetcher::new(Recording { requests: vec![] }, "42", 100);

        fetcher.fetch(None).unwrap();
        fetcher.fetch(Some(&Snowflake::from("900"))).unwrap();

        assert_eq!(fetcher.calls(), 2);
        let source = fetcher.into_inner();
        assert_eq!(source.requests[0], ("42".to_string(), None, 100));
        assert_eq!(
            source.requests[1],
            ("42".to_string(), Some("900".to_string()), 100)
        );
    }
}
