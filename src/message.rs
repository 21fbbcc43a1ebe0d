//! Archive schema types.
//!
//! [`ArchivedMessage`] is the fixed shape every record in `<channelID>.json`
//! conforms to, independent of the platform's native representation.
//!
//! # Example
//!
//! ```
//! use chanarchive::{ArchivedAttachment, ArchivedMessage, ArchivedReaction};
//!
//! let msg = ArchivedMessage::new("1001", "Alice#1234", "look", "2021-01-01T00:00:00+00:00")
//!     .with_attachment(ArchivedAttachment::new("900", "cat.png"))
//!     .with_reaction(ArchivedReaction::new("👍", 2));
//!
//! let json = serde_json::to_string(&msg)?;
//! assert!(json.starts_with(r#"{"attachments":[{"filename":"900_cat.png""#));
//! # Ok::<(), serde_json::Error>(())
//! ```

use serde::{Deserialize, Serialize};

/// An attachment reference stored in the archive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArchivedAttachment {
    /// File name under the channel directory, `<messageID>_<original_filename>`.
    pub filename: String,

    /// File name as it appeared on the platform.
    pub original_filename: String,
}

impl ArchivedAttachment {
    /// Builds the attachment entry for `original_filename` posted in `message_id`.
    ///
    /// The message-ID prefix keeps local names unique across the archive.
    pub fn new(message_id: &str, original_filename: impl Into<String>) -> Self {
        let original_filename = original_filename.into();
        Self {
            filename: local_attachment_name(message_id, &original_filename),
            original_filename,
        }
    }
}

/// Local file name for an attachment: `<messageID>_<filename>`.
pub fn local_attachment_name(message_id: &str, original_filename: &str) -> String {
    format!("{message_id}_{original_filename}")
}

/// A reaction summary stored in the archive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArchivedReaction {
    /// Emoji name.
    pub name: String,

    /// Number of users who reacted.
    pub count: u64,
}

impl ArchivedReaction {
    pub fn new(name: impl Into<String>, count: u64) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

/// One archived message.
///
/// Field order is part of the archive format and matches the serialized key
/// order: `attachments`, `author_id`, `author`, `content`, `reactions`,
/// `timestamp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedMessage {
    /// Attachments, in reverse of the platform's order.
    pub attachments: Vec<ArchivedAttachment>,

    /// Platform user ID of the author.
    pub author_id: String,

    /// Author in the legacy `name#discriminator` form.
    pub author: String,

    /// Text content.
    pub content: String,

    /// Reactions, in reverse of the platform's order.
    pub reactions: Vec<ArchivedReaction>,

    /// ISO-8601 timestamp exactly as delivered by the platform.
    pub timestamp: String,
}

impl ArchivedMessage {
    /// Creates a message without attachments or reactions.
    pub fn new(
        author_id: impl Into<String>,
        author: impl Into<String>,
        content: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            attachments: Vec::new(),
            author_id: author_id.into(),
            author: author.into(),
            content: content.into(),
            reactions: Vec::new(),
            timestamp: timestamp.into(),
        }
    }

    /// Appends an attachment entry.
    #[must_use]
    pub fn with_attachment(mut self, attachment: ArchivedAttachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Appends a reaction entry.
    #[must_use]
    pub fn with_reaction(mut self, reaction: ArchivedReaction) -> Self {
        self.reactions.push(reaction);
        self
    }
}
