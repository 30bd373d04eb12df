//! Configuration for the friendwatch binary.
//!
//! All settings come from environment variables. Credentials are required;
//! everything else has a default matching a plain working-directory
//! deployment under cron.

use std::path::PathBuf;
use std::time::Duration;

use friendwatch_core::monitor::DEFAULT_FETCH_TIMEOUT;
use friendwatch_core::notify::{DEFAULT_MAX_MESSAGE_LEN, DEFAULT_SEND_TIMEOUT};
use friendwatch_core::templates::{DEFAULT_DETAIL_LISTING_LIMIT, DEFAULT_PROFILE_PREFIX};

use crate::error::WatchError;

/// Complete runtime configuration.
#[derive(Clone)]
pub struct WatchConfig {
    /// Steam Web API settings.
    pub steam: SteamConfig,
    /// Telegram Bot API settings.
    pub telegram: TelegramConfig,
    /// Path to the YAML roster.
    pub roster_file: PathBuf,
    /// Path to the persisted friend-count snapshot.
    pub state_file: PathBuf,
    /// Path to the first-run marker.
    pub init_marker_file: PathBuf,
    /// Deadline for each account's fetch.
    pub fetch_timeout: Duration,
    /// Deadline for each Telegram message.
    pub send_timeout: Duration,
    /// Maximum characters per Telegram message.
    pub max_message_len: usize,
    /// Largest roster for which the first run lists every account.
    pub detail_listing_limit: usize,
    /// Prefix turned into a profile link by appending the account id.
    pub profile_url_prefix: String,
    /// Optional directory of `<name>.j2` template overrides.
    pub templates_dir: Option<PathBuf>,
}

/// Steam Web API connection settings.
#[derive(Clone)]
pub struct SteamConfig {
    /// Base URL (e.g. `http://api.steampowered.com`).
    pub api_url: String,
    /// Web API key.
    pub api_key: String,
}

/// Telegram Bot API connection settings.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Base URL (e.g. `https://api.telegram.org`).
    pub api_url: String,
    /// Bot token.
    pub bot_token: String,
    /// Destination chat identifier.
    pub chat_id: String,
}

// Secrets stay out of logs and panic messages.
impl std::fmt::Debug for SteamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SteamConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_url", &self.api_url)
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl std::fmt::Debug for WatchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchConfig")
            .field("steam", &self.steam)
            .field("telegram", &self.telegram)
            .field("roster_file", &self.roster_file)
            .field("state_file", &self.state_file)
            .field("init_marker_file", &self.init_marker_file)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("send_timeout", &self.send_timeout)
            .field("max_message_len", &self.max_message_len)
            .field("detail_listing_limit", &self.detail_listing_limit)
            .field("profile_url_prefix", &self.profile_url_prefix)
            .field("templates_dir", &self.templates_dir)
            .finish()
    }
}

impl WatchConfig {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `STEAM_API_KEY` -- Steam Web API key
    /// - `TELEGRAM_BOT_TOKEN` -- bot token used for `sendMessage`
    /// - `TELEGRAM_CHAT_ID` -- destination chat
    ///
    /// Optional variables:
    /// - `STEAM_API_URL` -- default `http://api.steampowered.com`
    /// - `TELEGRAM_API_URL` -- default `https://api.telegram.org`
    /// - `ROSTER_FILE` -- default `roster.yaml`
    /// - `STATE_FILE` -- default `friend_counts.json`
    /// - `INIT_MARKER_FILE` -- default `.initialized`
    /// - `FETCH_TIMEOUT_MS` -- per-account deadline (default 10000)
    /// - `SEND_TIMEOUT_MS` -- per-message delivery deadline (default 10000)
    /// - `MAX_MESSAGE_LEN` -- characters per message, must be positive (default 4000)
    /// - `DETAIL_LISTING_LIMIT` -- first-run listing cutoff (default 50)
    /// - `PROFILE_URL_PREFIX` -- default `steamcommunity.com/profiles/`
    /// - `TEMPLATES_DIR` -- template override directory (unset by default)
    pub fn from_env() -> Result<Self, WatchError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// [`from_env`](Self::from_env) passes the process environment; tests
    /// pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, WatchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| WatchError::Config(format!("missing required env var {name}")))
        };
        let optional = |name: &str, default: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_owned())
        };

        let steam = SteamConfig {
            api_url: trim_slash(optional("STEAM_API_URL", "http://api.steampowered.com")),
            api_key: required("STEAM_API_KEY")?,
        };
        let telegram = TelegramConfig {
            api_url: trim_slash(optional("TELEGRAM_API_URL", "https://api.telegram.org")),
            bot_token: required("TELEGRAM_BOT_TOKEN")?,
            chat_id: required("TELEGRAM_CHAT_ID")?,
        };

        let fetch_timeout_ms: u64 =
            optional("FETCH_TIMEOUT_MS", &DEFAULT_FETCH_TIMEOUT.as_millis().to_string())
                .parse()
                .map_err(|e| WatchError::Config(format!("invalid FETCH_TIMEOUT_MS: {e}")))?;

        let send_timeout_ms: u64 =
            optional("SEND_TIMEOUT_MS", &DEFAULT_SEND_TIMEOUT.as_millis().to_string())
                .parse()
                .map_err(|e| WatchError::Config(format!("invalid SEND_TIMEOUT_MS: {e}")))?;

        let max_message_len: usize =
            optional("MAX_MESSAGE_LEN", &DEFAULT_MAX_MESSAGE_LEN.to_string())
                .parse()
                .map_err(|e| WatchError::Config(format!("invalid MAX_MESSAGE_LEN: {e}")))?;
        if max_message_len == 0 {
            return Err(WatchError::Config(
                "invalid MAX_MESSAGE_LEN: must be greater than zero".to_owned(),
            ));
        }

        let detail_listing_limit: usize =
            optional("DETAIL_LISTING_LIMIT", &DEFAULT_DETAIL_LISTING_LIMIT.to_string())
                .parse()
                .map_err(|e| WatchError::Config(format!("invalid DETAIL_LISTING_LIMIT: {e}")))?;

        Ok(Self {
            steam,
            telegram,
            roster_file: PathBuf::from(optional("ROSTER_FILE", "roster.yaml")),
            state_file: PathBuf::from(optional("STATE_FILE", "friend_counts.json")),
            init_marker_file: PathBuf::from(optional("INIT_MARKER_FILE", ".initialized")),
            fetch_timeout: Duration::from_millis(fetch_timeout_ms),
            send_timeout: Duration::from_millis(send_timeout_ms),
            max_message_len,
            detail_listing_limit,
            profile_url_prefix: optional("PROFILE_URL_PREFIX", DEFAULT_PROFILE_PREFIX),
            templates_dir: lookup("TEMPLATES_DIR")
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_owned()
}
