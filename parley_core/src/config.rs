//! Startup configuration.
//!
//! Everything the server needs is read once from the process environment
//! into a [`SlackConfig`] and handed to the dispatcher. Nothing reads the
//! environment after startup.

use std::collections::BTreeSet;
use std::env;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

pub const BOT_TOKEN_VAR: &str = "SLACK_BOT_TOKEN";
pub const TEAM_ID_VAR: &str = "SLACK_TEAM_ID";
pub const CHANNEL_IDS_VAR: &str = "SLACK_CHANNEL_IDS";

pub const DEFAULT_API_BASE: &str = "https://slack.com/api";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    MissingVar(&'static str),
    #[error("invalid api base url `{0}`: must start with http:// or https://")]
    InvalidApiBase(String),
}

#[derive(Clone, Debug)]
pub struct SlackConfig {
    bot_token: SecretString,
    pub team_id: String,
    /// Channels `slack_list_channels` may surface. `None` means no filtering.
    pub channel_ids: Option<BTreeSet<String>>,
    pub api_base: String,
}

impl SlackConfig {
    pub fn new(bot_token: impl Into<String>, team_id: impl Into<String>) -> Self {
        Self {
            bot_token: SecretString::from(bot_token.into()),
            team_id: team_id.into(),
            channel_ids: None,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Load from `SLACK_BOT_TOKEN`, `SLACK_TEAM_ID` and the optional
    /// `SLACK_CHANNEL_IDS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let bot_token = read(BOT_TOKEN_VAR).ok_or(ConfigError::MissingVar(BOT_TOKEN_VAR))?;
        let team_id = read(TEAM_ID_VAR).ok_or(ConfigError::MissingVar(TEAM_ID_VAR))?;

        let mut config = Self::new(bot_token, team_id.trim());
        config.channel_ids = read(CHANNEL_IDS_VAR).and_then(|raw| parse_channel_ids(&raw));
        Ok(config)
    }

    pub fn with_channel_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = ids.into_iter().map(Into::into).collect();
        self.channel_ids = (!set.is_empty()).then_some(set);
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Result<Self, ConfigError> {
        let api_base = api_base.into();
        if !api_base.starts_with("http://") && !api_base.starts_with("https://") {
            return Err(ConfigError::InvalidApiBase(api_base));
        }
        self.api_base = api_base.trim_end_matches('/').to_string();
        Ok(self)
    }

    pub fn bot_token(&self) -> &str {
        self.bot_token.expose_secret()
    }

    pub fn allows_channel(&self, id: &str) -> bool {
        self.channel_ids
            .as_ref()
            .map_or(true, |allowed| allowed.contains(id))
    }
}

/// Split a comma separated id list, trimming entries and dropping blanks.
/// Returns `None` when nothing usable remains.
pub fn parse_channel_ids(raw: &str) -> Option<BTreeSet<String>> {
    let ids: BTreeSet<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();
    (!ids.is_empty()).then_some(ids)
}
