//! JSON archive writer.

use std::fs;
use std::path::Path;

use crate::error::{ArchiveError, Result, SerializationErrorKind};
use crate::message::ArchivedMessage;

/// Writes records to `output_path` as one compact JSON array.
///
/// The whole document is encoded first and written with a single call, so an
/// encoding failure never touches the file.
///
/// # Format
/// ```json
/// [{"attachments":[],"author_id":"1","author":"Alice#0001","content":"hi","reactions":[],"timestamp":"..."}]
/// ```
pub fn write_json(records: &[ArchivedMessage], output_path: impl AsRef<Path>) -> Result<()> {
    let output_path = output_path.as_ref();
    let json = to_json(records)?;
    fs::write(output_path, json).map_err(|e| {
        ArchiveError::serialization(Some(output_path.to_path_buf()), SerializationErrorKind::Io(e))
    })
}

/// Encodes records as a compact JSON array.
pub fn to_json(records: &[ArchivedMessage]) -> Result<String> {
    serde_json::to_string(records)
        .map_err(|e| ArchiveError::serialization(None, SerializationErrorKind::Json(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{ArchivedAttachment, ArchivedReaction};
    use tempfile::{NamedTempFile, tempdir};

    fn sample() -> Vec<ArchivedMessage> {
        vec![
            ArchivedMessage::new("1", "Alice#0001", "first", "2021-01-01T00:00:00+00:00"),
            ArchivedMessage::new("2", "Bob#0002", "second", "2021-01-01T00:01:00+00:00")
                .with_attachment(ArchivedAttachment::new("99", "a.png"))
                .with_reaction(ArchivedReaction::new("👍", 1)),
        ]
    }

    #[test]
    fn test_to_json_empty() {
        assert_eq!(to_json(&[]).unwrap(), "[]");
    }

    #[test]
    fn test_to_json_is_compact_and_ordered() {
        let json = to_json(&sample()).unwrap();
        assert!(!json.contains('\n'));
        let first = json.find("first").unwrap();
        let second = json.find("second").unwrap();
        assert!(first < second);
        assert!(json.contains(r#""filename":"99_a.png","original_filename":"a.png""#));
    }

    #[test]
    fn test_write_json_round_trips() {
        let temp_file = NamedTempFile::new().unwrap();
        write_json(&sample(), temp_file.path()).unwrap();

        let content = fs::read_to_string(temp_file.path()).unwrap();
        let parsed: Vec<ArchivedMessage> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn test_write_json_unwritable_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("42.json");

        let err = write_json(&sample(), &path).unwrap_err();

        assert!(err.is_serialization());
        assert!(err.to_string().contains("42.json"));
    }
}
