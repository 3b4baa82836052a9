//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::{AppError, Result};

/// Keychain service name under which credentials are stored.
const KEYRING_SERVICE: &str = "purge-relay";

/// Nested Slack configuration for Socket Mode connectivity.
///
/// Tokens are loaded at runtime via OS keychain or environment variables,
/// not from the TOML config file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SlackConfig {
    /// Channel names the bot accepts commands in.
    pub restricted_channels: Vec<String>,
    /// App-level token used for Socket Mode (populated at runtime).
    #[serde(skip)]
    pub app_token: String,
    /// Bot user token used for posting messages (populated at runtime).
    #[serde(skip)]
    pub bot_token: String,
}

/// Cache provider settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CloudflareConfig {
    /// Human-readable zone name, resolved to a zone id on first use.
    pub zone: String,
    /// Account email; when set, the API key is sent as `X-Auth-Key`.
    #[serde(default)]
    pub email: Option<String>,
    /// Base URL of the v4 API.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// API key or token (populated at runtime).
    #[serde(skip)]
    pub api_key: String,
}

fn default_api_base() -> String {
    "https://api.cloudflare.com/client/v4".into()
}

/// Timing and sizing knobs for the confirmation store and batch queue.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct RelayConfig {
    /// Interval between batch drains.
    #[serde(default = "default_drain_interval")]
    pub drain_interval_seconds: u64,
    /// Capacity of the confirmed-action channel.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Maximum URIs accepted in one clear request.
    #[serde(default = "default_max_uris")]
    pub max_uris: usize,
    /// Age after which an unconfirmed request lapses; 0 means never.
    #[serde(default = "default_pending_ttl")]
    pub pending_ttl_seconds: u64,
    /// Deadline applied to each remote purge call.
    #[serde(default = "default_purge_timeout")]
    pub purge_timeout_seconds: u64,
    /// Interval between sweeps of expired pending requests.
    #[serde(default = "default_expiry_sweep")]
    pub expiry_sweep_seconds: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            drain_interval_seconds: default_drain_interval(),
            queue_capacity: default_queue_capacity(),
            max_uris: default_max_uris(),
            pending_ttl_seconds: default_pending_ttl(),
            purge_timeout_seconds: default_purge_timeout(),
            expiry_sweep_seconds: default_expiry_sweep(),
        }
    }
}

impl RelayConfig {
    /// Drain tick period.
    #[must_use]
    pub fn drain_interval(&self) -> Duration {
        Duration::from_secs(self.drain_interval_seconds)
    }

    /// Pending-request lifetime, or `None` when expiry is disabled.
    #[must_use]
    pub fn pending_ttl(&self) -> Option<Duration> {
        (self.pending_ttl_seconds > 0).then(|| Duration::from_secs(self.pending_ttl_seconds))
    }

    /// Per-call purge deadline.
    #[must_use]
    pub fn purge_timeout(&self) -> Duration {
        Duration::from_secs(self.purge_timeout_seconds)
    }

    /// Expiry sweep period.
    #[must_use]
    pub fn expiry_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.expiry_sweep_seconds)
    }
}

fn default_drain_interval() -> u64 {
    5
}

fn default_queue_capacity() -> usize {
    10
}

fn default_max_uris() -> usize {
    30
}

fn default_pending_ttl() -> u64 {
    600
}

fn default_purge_timeout() -> u64 {
    30
}

fn default_expiry_sweep() -> u64 {
    60
}

fn default_http_port() -> u16 {
    3000
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Slack connectivity settings.
    pub slack: SlackConfig,
    /// Cache provider settings.
    pub cloudflare: CloudflareConfig,
    /// Slack user names allowed to issue commands.
    pub authorised_users: Vec<String>,
    /// HTTP port for the health endpoint; 0 disables it.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Batch and confirmation tuning.
    #[serde(default)]
    pub relay: RelayConfig,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and validate it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load Slack and cache provider credentials from OS keychain with
    /// env-var fallback.
    ///
    /// `CF_EMAIL`, when set, overrides the configured account email.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if neither keychain nor env vars provide
    /// a required credential.
    pub async fn load_credentials(&mut self) -> Result<()> {
        self.slack.app_token = load_credential("slack_app_token", "SLACK_APP_TOKEN").await?;
        self.slack.bot_token = load_credential("slack_bot_token", "SLACK_BOT_TOKEN").await?;
        self.cloudflare.api_key = load_credential("cf_token", "CF_TOKEN").await?;
        if let Ok(email) = env::var("CF_EMAIL") {
            if !email.is_empty() {
                self.cloudflare.email = Some(email);
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.slack.restricted_channels.is_empty() {
            return Err(AppError::Config(
                "slack.restricted_channels must not be empty".into(),
            ));
        }

        if self.authorised_users.is_empty() {
            return Err(AppError::Config(
                "authorised_users must not be empty".into(),
            ));
        }

        if self.cloudflare.zone.trim().is_empty() {
            return Err(AppError::Config("cloudflare.zone must not be empty".into()));
        }

        if self.relay.drain_interval_seconds == 0 {
            return Err(AppError::Config(
                "relay.drain_interval_seconds must be greater than zero".into(),
            ));
        }

        if self.relay.queue_capacity == 0 {
            return Err(AppError::Config(
                "relay.queue_capacity must be greater than zero".into(),
            ));
        }

        if self.relay.max_uris == 0 {
            return Err(AppError::Config(
                "relay.max_uris must be greater than zero".into(),
            ));
        }

        if self.relay.purge_timeout_seconds == 0 {
            return Err(AppError::Config(
                "relay.purge_timeout_seconds must be greater than zero".into(),
            ));
        }

        if self.relay.expiry_sweep_seconds == 0 {
            return Err(AppError::Config(
                "relay.expiry_sweep_seconds must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

/// Load a single credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<String> {
    let key = keyring_key.to_owned();

    // keyring is synchronous I/O.
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(value),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    match env::var(env_key) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(AppError::Config(format!(
            "credential {keyring_key} not found in keychain or {env_key} env var"
        ))),
    }
}
