//! Raw message → archive record.

use std::path::Path;

use crate::core::store::{ContentKey, ContentStore};
use crate::error::ArchiveError;
use crate::message::{ArchivedAttachment, ArchivedMessage, ArchivedReaction};
use crate::source::{ContentFetcher, RawMessage};

/// Builds the archive record for `raw` without touching the network.
///
/// - `author` is `name#discriminator`
/// - attachments and reactions are listed in reverse of the platform's order,
///   which is the archive format every existing snapshot uses
pub fn archive_record(raw: &RawMessage) -> ArchivedMessage {
    ArchivedMessage {
        attachments: raw
            .attachments
            .iter()
            .rev()
            .map(|att| ArchivedAttachment::new(raw.id.as_str(), att.filename.as_str()))
            .collect(),
        author_id: raw.author.id.to_string(),
        author: format!("{}#{}", raw.author.name, raw.author.discriminator),
        content: raw.content.clone(),
        reactions: raw
            .reactions
            .iter()
            .rev()
            .map(|r| ArchivedReaction::new(r.emoji_name.as_str(), r.count))
            .collect(),
        timestamp: raw.timestamp.clone(),
    }
}

/// A record plus the asset failures hit while building it.
#[derive(Debug)]
pub struct Transformed {
    pub record: ArchivedMessage,
    pub asset_errors: Vec<ArchiveError>,
}

/// Maps raw messages into archive records, archiving their avatar and
/// attachments as a side effect.
///
/// Transformation never fails. Download failures are handed back in
/// [`Transformed::asset_errors`] and the record still names the missing files.
pub struct RecordTransformer<'a, F> {
    store: &'a mut ContentStore<F>,
    avatars_dir: &'a Path,
    channel_dir: &'a Path,
}

impl<'a, F: ContentFetcher> RecordTransformer<'a, F> {
    pub fn new(store: &'a mut ContentStore<F>, avatars_dir: &'a Path, channel_dir: &'a Path) -> Self {
        Self {
            store,
            avatars_dir,
            channel_dir,
        }
    }

    pub fn transform(&mut self, raw: &RawMessage) -> Transformed {
        let mut asset_errors = Vec::new();

        let avatar = ContentKey::avatar(raw.author.id.as_str());
        if let Err(e) = self
            .store
            .ensure(&avatar, &raw.author.avatar_url, self.avatars_dir)
        {
            asset_errors.push(e);
        }

        for att in &raw.attachments {
            let key = ContentKey::attachment(raw.id.as_str(), &att.filename);
            if let Err(e) = self.store.ensure(&key, &att.url, self.channel_dir) {
                asset_errors.push(e);
            }
        }

        Transformed {
            record: archive_record(raw),
            asset_errors,
        }
    }
}
