//! Run configuration.
//!
//! [`RunConfig`] holds everything one archive run needs: credentials, the
//! channel, the optional resume point, the output root and the HTTP settings of
//! the shipped collaborators. It is passed explicitly to every component; there
//! is no ambient state.
//!
//! # Example
//!
//! ```rust
//! use chanarchive::config::RunConfig;
//!
//! let config = RunConfig::new("bot-token", "123456789")
//!     .with_start_before("987654321")
//!     .with_root_dir("/tmp/archive");
//!
//! assert!(config.validate().is_ok());
//! assert!(config.output_path().ends_with("123456789.json"));
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ArchiveError, Result};
use crate::source::Snowflake;

/// Messages requested per page (the platform maximum).
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Largest page the platform will return.
pub const MAX_PAGE_SIZE: usize = 100;

/// Directory (under the root) holding one avatar per author.
pub const AVATARS_DIR: &str = "pfps";

pub const DEFAULT_API_URL: &str = "https://discord.com/api/v10";
pub const DEFAULT_CDN_URL: &str = "https://cdn.discordapp.com";

/// Parameters of a single archive run.
#[derive(Clone)]
pub struct RunConfig {
    /// Bot token used to authenticate with the platform.
    pub token: String,

    /// Channel to archive.
    pub channel_id: String,

    /// Resume point: archive only messages older than this one (exclusive).
    pub start_before: Option<Snowflake>,

    /// Root directory of the archive layout (default: current directory).
    pub root_dir: PathBuf,

    /// Messages per page (default: 100).
    pub page_size: usize,

    /// Abort on asset download failures instead of skipping them (default: false).
    pub strict: bool,

    /// TCP connect timeout of the HTTP collaborators (default: 30s).
    pub connect_timeout: Duration,

    /// Whole-request timeout of the HTTP collaborators (default: 300s).
    pub request_timeout: Duration,

    /// Base URL of the platform REST API.
    pub api_url: String,

    /// Base URL of the platform CDN (avatars).
    pub cdn_url: String,
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("token", &"<redacted>")
            .field("channel_id", &self.channel_id)
            .field("start_before", &self.start_before)
            .field("root_dir", &self.root_dir)
            .field("page_size", &self.page_size)
            .field("strict", &self.strict)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("api_url", &self.api_url)
            .field("cdn_url", &self.cdn_url)
            .finish()
    }
}

impl RunConfig {
    /// Creates a configuration with default values for everything but the
    /// credentials and the channel.
    pub fn new(token: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            channel_id: channel_id.into(),
            start_before: None,
            root_dir: PathBuf::from("."),
            page_size: DEFAULT_PAGE_SIZE,
            strict: false,
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(300),
            api_url: DEFAULT_API_URL.to_string(),
            cdn_url: DEFAULT_CDN_URL.to_string(),
        }
    }

    /// Sets the resume point.
    #[must_use]
    pub fn with_start_before(mut self, message_id: impl Into<Snowflake>) -> Self {
        self.start_before = Some(message_id.into());
        self
    }

    /// Sets the root output directory.
    #[must_use]
    pub fn with_root_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.root_dir = dir.into();
        self
    }

    /// Sets the page size.
    #[must_use]
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    /// Sets whether asset failures abort the run.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Sets the HTTP connect and request timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, connect: Duration, request: Duration) -> Self {
        self.connect_timeout = connect;
        self.request_timeout = request;
        self
    }

    /// Overrides the API and CDN base URLs.
    #[must_use]
    pub fn with_endpoints(mut self, api_url: impl Into<String>, cdn_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self.cdn_url = cdn_url.into();
        self
    }

    /// Checks the configuration before any network activity.
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(ArchiveError::config("token", "must not be empty"));
        }
        if self.channel_id.trim().is_empty() {
            return Err(ArchiveError::config("channel", "must not be empty"));
        }
        // The channel ID doubles as a directory and file name.
        if !self.channel_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ArchiveError::config(
                "channel",
                format!("'{}' is not a valid channel ID", self.channel_id),
            ));
        }
        if let Some(before) = &self.start_before {
            if before.as_str().is_empty() {
                return Err(ArchiveError::config("message", "must not be empty"));
            }
            // Cursors are compared numerically.
            if !before.as_str().chars().all(|c| c.is_ascii_digit()) {
                return Err(ArchiveError::config(
                    "message",
                    format!("'{before}' is not a valid message ID"),
                ));
            }
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ArchiveError::config(
                "page_size",
                format!("must be between 1 and {MAX_PAGE_SIZE}, got {}", self.page_size),
            ));
        }
        Ok(())
    }

    /// `<root>/pfps`
    pub fn avatars_dir(&self) -> PathBuf {
        self.root_dir.join(AVATARS_DIR)
    }

    /// `<root>/<channelID>`
    pub fn channel_dir(&self) -> PathBuf {
        self.root_dir.join(&self.channel_id)
    }

    /// `<root>/<channelID>.json`
    pub fn output_path(&self) -> PathBuf {
        self.root_dir.join(format!("{}.json", self.channel_id))
    }

    /// Creates the avatar and channel directories if missing.
    pub fn prepare_dirs(&self) -> Result<()> {
        create_private_dir(&self.avatars_dir())?;
        create_private_dir(&self.channel_dir())?;
        Ok(())
    }
}

/// Creates `dir` (owner-only on Unix) unless it already exists.
pub(crate) fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = RunConfig::new("t", "42");
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.root_dir, PathBuf::from("."));
        assert!(config.start_before.is_none());
        assert!(!config.strict);
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_layout_paths() {
        let config = RunConfig::new("t", "42").with_root_dir("/data");
        assert_eq!(config.avatars_dir(), PathBuf::from("/data/pfps"));
        assert_eq!(config.channel_dir(), PathBuf::from("/data/42"));
        assert_eq!(config.output_path(), PathBuf::from("/data/42.json"));
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        assert!(RunConfig::new("", "42").validate().unwrap_err().is_config());
        assert!(RunConfig::new("t", " ").validate().is_err());
        assert!(RunConfig::new("t", "../etc").validate().is_err());
        assert!(
            RunConfig::new("t", "42")
                .with_start_before("")
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_validate_message_id_must_be_numeric() {
        for bad in ["abc", "12a", "-5", " 900"] {
            let err = RunConfig::new("t", "42")
                .with_start_before(bad)
                .validate()
                .unwrap_err();
            assert!(err.is_config());
            assert!(err.to_string().contains("message"));
        }
        assert!(
            RunConfig::new("t", "42")
                .with_start_before("900")
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_validate_page_size_bounds() {
        assert!(RunConfig::new("t", "42").with_page_size(0).validate().is_err());
        assert!(RunConfig::new("t", "42").with_page_size(101).validate().is_err());
        assert!(RunConfig::new("t", "42").with_page_size(1).validate().is_ok());
        assert!(RunConfig::new("t", "42").with_page_size(100).validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_token() {
        let debug = format!("{:?}", RunConfig::new("super-secret", "42"));
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_prepare_dirs_is_idempotent() {
        let dir = tempdir().unwrap();
        let config = RunConfig::new("t", "42").with_root_dir(dir.path());
        config.prepare_dirs().unwrap();
        config.prepare_dirs().unwrap();
        assert!(config.avatars_dir().is_dir());
        assert!(config.channel_dir().is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_prepare_dirs_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let config = RunConfig::new("t", "42").with_root_dir(dir.path());
        config.prepare_dirs().unwrap();
        let mode = fs::metadata(config.channel_dir()).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0);
    }
}
