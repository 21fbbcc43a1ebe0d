//! Discord REST client.
//!
//! Blocking implementation of [`MessageSource`] against the Discord HTTP API
//! (v10). Only the three calls the archiver needs are implemented:
//!
//! - `GET /users/@me` - validates the bot token when the session opens
//! - `GET /channels/{id}/messages?limit=N&before=ID` - one page of history
//! - avatar URLs on the CDN, resolved while decoding messages
//!
//! Rate limits (HTTP 429) are waited out using the advertised `retry_after`
//! and the request is retried a bounded number of times.

use std::thread;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, RETRY_AFTER};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{MessageSource, RawAttachment, RawAuthor, RawMessage, RawReaction, Snowflake};
use crate::config::RunConfig;
use crate::error::{ArchiveError, Result, RetrievalErrorKind};

/// Attempts per request before a rate limit becomes an error.
pub const RATE_LIMIT_ATTEMPTS: u32 = 5;

/// Longest single wait honoured for a rate limit.
const MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(60);

/// Error bodies are cut to this many characters in error messages.
const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
struct WireUser {
    id: String,
    username: String,
    #[serde(default)]
    discriminator: Option<String>,
    #[serde(default)]
    avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireAttachment {
    filename: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct WireEmoji {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireReaction {
    count: u64,
    emoji: WireEmoji,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    id: String,
    #[serde(default)]
    content: String,
    timestamp: String,
    author: WireUser,
    #[serde(default)]
    attachments: Vec<WireAttachment>,
    #[serde(default)]
    reactions: Vec<WireReaction>,
}

#[derive(Debug, Deserialize)]
struct RateLimitBody {
    retry_after: f64,
}

/// Blocking Discord API client.
pub struct DiscordClient {
    client: Client,
    auth_header: String,
    api_url: String,
    cdn_url: String,
    max_attempts: u32,
}

impl DiscordClient {
    /// Builds a client from the run configuration (token, endpoints, timeouts).
    pub fn new(config: &RunConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(format!(
                "DiscordBot (chanarchive, {})",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| ArchiveError::config("http client", e.to_string()))?;

        Ok(Self {
            client,
            auth_header: format!("Bot {}", config.token),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            cdn_url: config.cdn_url.trim_end_matches('/').to_string(),
            max_attempts: RATE_LIMIT_ATTEMPTS,
        })
    }

    /// Sets how many times a rate-limited request is attempted.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        context: &str,
    ) -> Result<T> {
        let url = format!("{}{}", self.api_url, path);
        let mut attempts = 0;
        loop {
            attempts += 1;
            let response = self
                .client
                .get(&url)
                .header(AUTHORIZATION, &self.auth_header)
                .query(query)
                .send()
                .map_err(|e| ArchiveError::retrieval(context, RetrievalErrorKind::Http(e)))?;

            let status = response.status();
            let retry_header = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response
                .text()
                .map_err(|e| ArchiveError::retrieval(context, RetrievalErrorKind::Http(e)))?;

            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempts >= self.max_attempts {
                    return Err(ArchiveError::retrieval(
                        context,
                        RetrievalErrorKind::RateLimited { attempts },
                    ));
                }
                let wait = rate_limit_delay(retry_header.as_deref(), &body);
                warn!(attempt = attempts, wait_ms = wait.as_millis() as u64, "rate limited");
                thread::sleep(wait);
                continue;
            }

            if !status.is_success() {
                return Err(ArchiveError::retrieval(
                    context,
                    RetrievalErrorKind::Status {
                        status: status.as_u16(),
                        body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
                    },
                ));
            }

            return serde_json::from_str(&body)
                .map_err(|e| ArchiveError::retrieval(context, RetrievalErrorKind::Decode(e)));
        }
    }

    fn decode_message(&self, msg: WireMessage) -> RawMessage {
        let discriminator = msg.author.discriminator.unwrap_or_else(|| "0".to_string());
        let avatar = avatar_url(
            &self.cdn_url,
            &msg.author.id,
            &discriminator,
            msg.author.avatar.as_deref(),
        );
        RawMessage {
            id: Snowflake::from(msg.id),
            author: RawAuthor::new(msg.author.id, msg.author.username, discriminator, avatar),
            content: msg.content,
            attachments: msg
                .attachments
                .into_iter()
                .map(|a| RawAttachment {
                    filename: a.filename,
                    url: a.url,
                })
                .collect(),
            reactions: msg
                .reactions
                .into_iter()
                .map(|r| RawReaction {
                    emoji_name: r.emoji.name.unwrap_or_default(),
                    count: r.count,
                })
                .collect(),
            timestamp: msg.timestamp,
        }
    }
}

impl MessageSource for DiscordClient {
    fn open(&mut self) -> Result<()> {
        let me: WireUser = self.get_json("/users/@me", &[], "session (GET /users/@me)")?;
        debug!(user = %me.username, id = %me.id, "session opened");
        Ok(())
    }

    fn fetch_page(
        &mut self,
        channel_id: &str,
        before: Option<&Snowflake>,
        limit: usize,
    ) -> Result<Vec<RawMessage>> {
        let limit = limit.to_string();
        let mut query = vec![("limit", limit.as_str())];
        if let Some(before) = before {
            query.push(("before", before.as_str()));
        }
        let context = match before {
            Some(before) => format!("messages of channel {channel_id} before {before}"),
            None => format!("messages of channel {channel_id}"),
        };

        let page: Vec<WireMessage> =
            self.get_json(&format!("/channels/{channel_id}/messages"), &query, &context)?;
        Ok(page.into_iter().map(|m| self.decode_message(m)).collect())
    }
}

/// CDN URL of a user's avatar.
///
/// Animated avatars (hash prefixed `a_`) are served as GIF. Users without an
/// avatar get one of the default embed avatars.
pub fn avatar_url(cdn_url: &str, user_id: &str, discriminator: &str, avatar: Option<&str>) -> String {
    let cdn = cdn_url.trim_end_matches('/');
    match avatar.filter(|hash| !hash.is_empty()) {
        Some(hash) if hash.starts_with("a_") => format!("{cdn}/avatars/{user_id}/{hash}.gif"),
        Some(hash) => format!("{cdn}/avatars/{user_id}/{hash}.png"),
        None => format!(
            "{cdn}/embed/avatars/{}.png",
            default_avatar_index(user_id, discriminator)
        ),
    }
}

/// Legacy users pick by discriminator, migrated users (discriminator "0") by ID.
fn default_avatar_index(user_id: &str, discriminator: &str) -> u64 {
    match discriminator.parse::<u64>() {
        Ok(d) if d != 0 => d % 5,
        _ => user_id.parse::<u64>().map(|id| (id >> 22) % 6).unwrap_or(0),
    }
}

/// How long to wait after a 429, from the `Retry-After` header or the JSON body.
fn rate_limit_delay(header: Option<&str>, body: &str) -> Duration {
    let secs = header
        .and_then(|h| h.trim().parse::<f64>().ok())
        .or_else(|| {
            serde_json::from_str::<RateLimitBody>(body)
                .ok()
                .map(|b| b.retry_after)
        })
        .filter(|s| s.is_finite() && *s >= 0.0)
        .unwrap_or(1.0)
        .min(MAX_RATE_LIMIT_WAIT.as_secs_f64());
    Duration::from_secs_f64(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CDN: &str = "https://cdn.discordapp.com";

    #[test]
    fn test_avatar_url_static() {
        assert_eq!(
            avatar_url(CDN, "80351110224678912", "1337", Some("8342729096ea3675442027381ff50dfe")),
            "https://cdn.discordapp.com/avatars/80351110224678912/8342729096ea3675442027381ff50dfe.png"
        );
    }

    #[test]
    fn test_avatar_url_animated() {
        assert_eq!(
            avatar_url(CDN, "1", "0001", Some("a_abc")),
            "https://cdn.discordapp.com/avatars/1/a_abc.gif"
        );
    }

    #[test]
    fn test_avatar_url_default_by_discriminator() {
        assert_eq!(
            avatar_url(CDN, "1", "1337", None),
            "https://cdn.discordapp.com/embed/avatars/2.png"
        );
        assert_eq!(
            avatar_url(CDN, "1", "1337", Some("")),
            "https://cdn.discordapp.com/embed/avatars/2.png"
        );
    }

    #[test]
    fn test_avatar_url_default_for_migrated_user() {
        let id = 80_351_110_224_678_912_u64;
        let expected = (id >> 22) % 6;
        assert_eq!(
            avatar_url(CDN, &id.to_string(), "0", None),
            format!("https://cdn.discordapp.com/embed/avatars/{expected}.png")
        );
    }

    #[test]
    fn test_avatar_url_trims_trailing_slash() {
        assert_eq!(
            avatar_url("http://localhost:9000/", "1", "0001", Some("h")),
            "http://localhost:9000/avatars/1/h.png"
        );
    }

    #[test]
    fn test_rate_limit_delay_sources() {
        assert_eq!(rate_limit_delay(Some("2"), ""), Duration::from_secs(2));
        assert_eq!(
            rate_limit_delay(None, r#"{"message":"You are being rate limited.","retry_after":0.5,"global":false}"#),
            Duration::from_millis(500)
        );
        assert_eq!(rate_limit_delay(None, "garbage"), Duration::from_secs(1));
        assert_eq!(rate_limit_delay(Some("9999"), ""), MAX_RATE_LIMIT_WAIT);
    }

    #[test]
    fn test_wire_message_decoding() {
        let json = r#"{
            "id": "1100",
            "channel_id": "42",
            "content": "hello",
            "timestamp": "2021-05-01T10:00:00.000000+00:00",
            "author": {"id": "7", "username": "Name", "discriminator": "1234", "avatar": null},
            "attachments": [{"id": "5", "filename": "cat.png", "size": 10, "url": "https://cdn/cat.png"}],
            "reactions": [{"count": 2, "me": false, "emoji": {"id": null, "name": "👍"}}],
            "pinned": false
        }"#;
        let msg: WireMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.author.discriminator.as_deref(), Some("1234"));
        assert_eq!(msg.attachments[0].filename, "cat.png");
        assert_eq!(msg.reactions[0].emoji.name.as_deref(), Some("👍"));
    }

    #[test]
    fn test_wire_message_minimal() {
        let json = r#"{"id": "1", "timestamp": "t", "author": {"id": "7", "username": "n"}}"#;
        let msg: WireMessage = serde_json::from_str(json).unwrap();
        assert!(msg.content.is_empty());
        assert!(msg.attachments.is_empty());
        assert!(msg.reactions.is_empty());
    }
}
