//! Platform-facing types and collaborator traits.
//!
//! The archive core never talks HTTP itself. It reads channel history through a
//! [`MessageSource`] and downloads binary assets through a [`ContentFetcher`].
//! With the `http` feature the crate ships blocking implementations of both:
//!
//! - [`DiscordClient`] - Discord REST API v10
//! - [`HttpFetcher`] - plain GET-and-stream over `reqwest`
//!
//! Tests and alternative platforms plug in their own implementations.

#[cfg(feature = "http")]
pub mod discord;
#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use discord::DiscordClient;
#[cfg(feature = "http")]
pub use http::HttpFetcher;

use std::cmp::Ordering;
use std::fmt;
use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::{ContentErrorKind, Result};

/// A platform ID (message or user).
///
/// Snowflakes are decimal strings whose numeric order is creation order, so
/// ordering compares numerically: shorter strings first, then lexically.
///
/// ```
/// use chanarchive::source::Snowflake;
///
/// assert!(Snowflake::from("99") < Snowflake::from("100"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snowflake(String);

impl Snowflake {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for Snowflake {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Snowflake {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Snowflake {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for Snowflake {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Author identity as delivered by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAuthor {
    pub id: Snowflake,
    /// Display name (username).
    pub name: String,
    pub discriminator: String,
    /// Resolved avatar image URL.
    pub avatar_url: String,
}

impl RawAuthor {
    pub fn new(
        id: impl Into<Snowflake>,
        name: impl Into<String>,
        discriminator: impl Into<String>,
        avatar_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            discriminator: discriminator.into(),
            avatar_url: avatar_url.into(),
        }
    }
}

/// An attachment reference on a raw message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttachment {
    pub filename: String,
    pub url: String,
}

/// A reaction summary on a raw message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReaction {
    pub emoji_name: String,
    pub count: u64,
}

/// A channel message as delivered by the platform client.
///
/// Read-only input to the archive core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub id: Snowflake,
    pub author: RawAuthor,
    pub content: String,
    pub attachments: Vec<RawAttachment>,
    pub reactions: Vec<RawReaction>,
    /// ISO-8601 timestamp string.
    pub timestamp: String,
}

impl RawMessage {
    /// Creates a message without attachments or reactions.
    pub fn new(
        id: impl Into<Snowflake>,
        author: RawAuthor,
        content: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            author,
            content: content.into(),
            attachments: Vec::new(),
            reactions: Vec::new(),
            timestamp: timestamp.into(),
        }
    }

    #[must_use]
    pub fn with_attachment(mut self, filename: impl Into<String>, url: impl Into<String>) -> Self {
        self.attachments.push(RawAttachment {
            filename: filename.into(),
            url: url.into(),
        });
        self
    }

    #[must_use]
    pub fn with_reaction(mut self, emoji_name: impl Into<String>, count: u64) -> Self {
        self.reactions.push(RawReaction {
            emoji_name: emoji_name.into(),
            count,
        });
        self
    }
}

/// Paged channel-history access.
///
/// Implementations own authentication, transport and rate limiting. Every
/// failure is reported as [`ArchiveError::Retrieval`](crate::ArchiveError::Retrieval).
pub trait MessageSource {
    /// Opens the authenticated session.
    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    /// Returns up to `limit` messages of `channel_id` strictly older than
    /// `before` (or the newest ones when `before` is `None`), newest first.
    fn fetch_page(
        &mut self,
        channel_id: &str,
        before: Option<&Snowflake>,
        limit: usize,
    ) -> Result<Vec<RawMessage>>;

    /// Closes the session.
    fn close(&mut self) {}
}

impl<S: MessageSource + ?Sized> MessageSource for Box<S> {
    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn fetch_page(
        &mut self,
        channel_id: &str,
        before: Option<&Snowflake>,
        limit: usize,
    ) -> Result<Vec<RawMessage>> {
        (**self).fetch_page(channel_id, before, limit)
    }

    fn close(&mut self) {
        (**self).close();
    }
}

/// GET-and-stream access to binary content by URL.
pub trait ContentFetcher {
    /// Streams the resource at `url` into `sink`, returning the byte count.
    fn fetch(&self, url: &str, sink: &mut dyn Write) -> std::result::Result<u64, ContentErrorKind>;
}

impl<F: ContentFetcher + ?Sized> ContentFetcher for &F {
    fn fetch(&self, url: &str, sink: &mut dyn Write) -> std::result::Result<u64, ContentErrorKind> {
        (**self).fetch(url, sink)
    }
}

impl<F: ContentFetcher + ?Sized> ContentFetcher for Box<F> {
    fn fetch(&self, url: &str, sink: &mut dyn Write) -> std::result::Result<u64, ContentErrorKind> {
        (**self).fetch(url, sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snowflake_numeric_order() {
        let mut ids: Vec<Snowflake> = ["100", "9", "1000", "99", "101"]
            .into_iter()
            .map(Snowflake::from)
            .collect();
        ids.sort();
        let sorted: Vec<&str> = ids.iter().map(Snowflake::as_str).collect();
        assert_eq!(sorted, vec!["9", "99", "100", "101", "1000"]);
    }

    #[test]
    fn test_snowflake_real_ids() {
        let older = Snowflake::from("780000000000000000");
        let newer = Snowflake::from("1100000000000000000");
        assert!(older < newer);
    }

    #[test]
    fn test_snowflake_serde_transparent() {
        let json = serde_json::to_string(&Snowflake::from("42")).unwrap();
        assert_eq!(json, "\"42\"");
    }

    #[test]
    fn test_raw_message_builder() {
        let author = RawAuthor::new("1", "Alice", "0001", "https://cdn/a.png");
        let msg = RawMessage::new("10", author, "hi", "2021-01-01T00:00:00+00:00")
            .with_attachment("a.png", "https://cdn/att/a.png")
            .with_reaction("👍", 2);
        assert_eq!(msg.attachments.len(), 1);
        assert_eq!(msg.reactions[0].emoji_name, "👍");
        assert_eq!(msg.id.as_str(), "10");
    }
}
