//! Archive writers.
//!
//! - [`write_json`] / [`to_json`] - the `<channelID>.json` array
//!
//! # Example
//!
//! ```rust,no_run
//! use chanarchive::ArchivedMessage;
//! use chanarchive::core::output::write_json;
//!
//! let records = vec![ArchivedMessage::new("1", "Alice#0001", "hi", "2021-01-01T00:00:00+00:00")];
//! write_json(&records, "123.json")?;
//! # Ok::<(), chanarchive::ArchiveError>(())
//! ```

mod json_writer;

pub use json_writer::{to_json, write_json};
