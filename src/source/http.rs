//! Blocking HTTP content fetcher.

use std::io::Write;
use std::time::Duration;

use reqwest::blocking::Client;

use super::ContentFetcher;
use crate::error::{ArchiveError, ContentErrorKind, Result};

/// Downloads avatars and attachments with a plain GET.
///
/// The response body is streamed straight into the sink; nothing is buffered
/// in memory. Non-success statuses are errors and write nothing.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|e| ArchiveError::config("http client", e.to_string()))?;
        Ok(Self { client })
    }
}

impl ContentFetcher for HttpFetcher {
    fn fetch(&self, url: &str, sink: &mut dyn Write) -> std::result::Result<u64, ContentErrorKind> {
        let mut response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(ContentErrorKind::Status(status.as_u16()));
        }
        Ok(response.copy_to(sink)?)
    }
}
