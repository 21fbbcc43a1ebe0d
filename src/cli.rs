//! Command-line interface definition using clap.
//!
//! [`Args`] maps one-to-one onto a [`RunConfig`]:
//!
//! ```rust
//! use chanarchive::cli::Args;
//! use clap::Parser;
//!
//! let args = Args::try_parse_from(["chanarchive", "-t", "token", "-c", "42", "-m", "900"])?;
//! let config = args.to_config();
//!
//! assert_eq!(config.channel_id, "42");
//! assert_eq!(config.start_before.as_ref().map(|id| id.as_str()), Some("900"));
//! # Ok::<(), clap::Error>(())
//! ```

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config::{DEFAULT_API_URL, DEFAULT_CDN_URL, RunConfig};

/// Archive the full history of a Discord channel, with attachments and
/// avatars, into <CHANNEL_ID>.json.
#[derive(Parser, Debug, Clone)]
#[command(name = "chanarchive")]
#[command(version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    chanarchive -t $TOKEN -c 123456789012345678
    chanarchive -t $TOKEN -c 123456789012345678 -m 987654321098765432
    CHANARCHIVE_TOKEN=... chanarchive -c 123456789012345678 -o backups/ --strict")]
pub struct Args {
    /// Bot token
    #[arg(short, long, env = "CHANARCHIVE_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Channel to archive
    #[arg(short, long, value_name = "CHANNEL_ID")]
    pub channel: String,

    /// Only archive messages older than this one
    #[arg(short, long, value_name = "MESSAGE_ID")]
    pub message: Option<String>,

    /// Directory holding pfps/, <CHANNEL_ID>/ and <CHANNEL_ID>.json
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Messages requested per page
    #[arg(long, value_name = "N", default_value_t = 100, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub page_size: u8,

    /// Abort when an avatar or attachment cannot be downloaded
    #[arg(long)]
    pub strict: bool,

    /// Log more (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(long, hide = true, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    #[arg(long, hide = true, default_value = DEFAULT_CDN_URL)]
    pub cdn_url: String,
}

impl Args {
    /// Builds the run configuration.
    pub fn to_config(&self) -> RunConfig {
        let mut config = RunConfig::new(self.token.clone(), self.channel.clone())
            .with_root_dir(self.output_dir.clone())
            .with_page_size(usize::from(self.page_size))
            .with_strict(self.strict)
            .with_endpoints(self.api_url.clone(), self.cdn_url.clone());
        if let Some(message) = &self.message {
            config = config.with_start_before(message.as_str());
        }
        config
    }

    /// Default log filter for the verbosity flag.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}
