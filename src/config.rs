// Bot configuration, read from the environment (optionally via `.env`).

use crate::core::archive::ThreadRefreshConfig;
use crate::core::game::{GameNaming, DEFAULT_FEEDBACK_FORM_URL};
use crate::infra::platform::DEFAULT_UPLOAD_LIMIT_BYTES;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing {0} environment variable")]
    Missing(&'static str),

    #[error("{name} must be a number, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    pub command_prefix: String,
    pub data_dir: PathBuf,
    pub home_guild_id: u64,
    pub mod_role_id: u64,
    pub archive_category_id: u64,
    pub archive_guild_id: u64,
    pub log_channel_id: Option<u64>,
    /// Users who may run OffServerArchive without the moderator role.
    pub privileged_user_ids: Vec<u64>,
    pub thread_refresh: ThreadRefreshConfig,
    pub feedback_form_url: String,
    pub upload_limit_bytes: u64,
    pub naming: GameNaming,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));
        let id = |name: &'static str| required(name).and_then(|v| parse_number(name, &v));
        let optional_id = |name: &'static str| get(name).map(|v| parse_number(name, &v)).transpose();
        let id_list = |name: &'static str| parse_id_list(name, &get(name).unwrap_or_default());

        let defaults = GameNaming::default();
        let naming = GameNaming {
            game_channel: get("GAME_CHANNEL_FORMAT").unwrap_or(defaults.game_channel),
            kibitz_channel: get("KIBITZ_CHANNEL_FORMAT").unwrap_or(defaults.kibitz_channel),
            game_role: get("GAME_ROLE_FORMAT").unwrap_or(defaults.game_role),
            kibitz_role: get("KIBITZ_ROLE_FORMAT").unwrap_or(defaults.kibitz_role),
            st_role: get("ST_ROLE_FORMAT").unwrap_or(defaults.st_role),
        };

        Ok(Self {
            token: required("DISCORD_TOKEN")?,
            command_prefix: get("COMMAND_PREFIX").unwrap_or_else(|| "!".to_string()),
            data_dir: PathBuf::from(get("DATA_DIR").unwrap_or_else(|| "data".to_string())),
            home_guild_id: id("HOME_GUILD_ID")?,
            mod_role_id: id("MOD_ROLE_ID")?,
            archive_category_id: id("ARCHIVE_CATEGORY_ID")?,
            archive_guild_id: id("ARCHIVE_GUILD_ID")?,
            log_channel_id: optional_id("LOG_CHANNEL_ID")?,
            privileged_user_ids: id_list("PRIVILEGED_USER_IDS")?,
            thread_refresh: ThreadRefreshConfig {
                category_ids: id_list("THREAD_REFRESH_CATEGORY_IDS")?,
                excluded_channel_ids: id_list("THREAD_REFRESH_EXCLUDED_CHANNEL_IDS")?,
            },
            feedback_form_url: get("FEEDBACK_FORM_URL")
                .unwrap_or_else(|| DEFAULT_FEEDBACK_FORM_URL.to_string()),
            upload_limit_bytes: optional_id("UPLOAD_LIMIT_BYTES")?
                .unwrap_or(DEFAULT_UPLOAD_LIMIT_BYTES),
            naming,
        })
    }

    pub fn thread_store_path(&self) -> PathBuf {
        self.data_dir.join("thread_archival.json")
    }

    pub fn town_square_path(&self) -> PathBuf {
        self.data_dir.join("townsquares.json")
    }
}

fn parse_number(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidNumber {
            name,
            value: value.to_string(),
        })
}

fn parse_id_list(name: &'static str, value: &str) -> Result<Vec<u64>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|x| !x.is_empty())
        .map(|x| parse_number(name, x))
        .collect()
}
