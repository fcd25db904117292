use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::api::PRIMARY_CALENDAR_ID;
use crate::error::SyncError;

/// Directory name used under the platform config and state directories
pub const APP_DIR: &str = "trello-gcal-sync";

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "TRELLO_GCAL_SYNC";

const REDACTED: &str = "(configured)";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub trello: TrelloConfig,
    #[serde(default)]
    pub google: GoogleConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Board service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrelloConfig {
    /// Board whose list is synced
    #[serde(default)]
    pub board_id: Option<String>,
    /// Application key from https://trello.com/app-key
    #[serde(default)]
    pub app_key: Option<String>,
    /// User token authorizing the application
    #[serde(default)]
    pub app_token: Option<String>,
    /// Name of the list to sync (default: TODO)
    #[serde(default = "default_list_name")]
    pub list_name: String,
}

fn default_list_name() -> String {
    "TODO".to_string()
}

impl Default for TrelloConfig {
    fn default() -> Self {
        Self {
            board_id: None,
            app_key: None,
            app_token: None,
            list_name: default_list_name(),
        }
    }
}

/// Calendar service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    /// Sent as the User-Agent on calendar requests
    #[serde(default = "default_application_name")]
    pub application_name: String,
    /// Client secret JSON downloaded from the Google Cloud console
    #[serde(default)]
    pub client_secret_path: Option<PathBuf>,
    /// Where the OAuth token is persisted between runs
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,
}

fn default_calendar_id() -> String {
    PRIMARY_CALENDAR_ID.to_string()
}

fn default_application_name() -> String {
    "TrelloGcalSyncer".to_string()
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            calendar_id: default_calendar_id(),
            application_name: default_application_name(),
            client_secret_path: None,
            credentials_path: None,
        }
    }
}

impl GoogleConfig {
    /// Client secret location, defaulting to the user's config directory
    pub fn client_secret_path(&self) -> PathBuf {
        self.client_secret_path.clone().unwrap_or_else(|| {
            Config::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("clientsecret.json")
        })
    }

    /// Credential store location, defaulting to ~/.credentials/
    pub fn credentials_path(&self) -> PathBuf {
        self.credentials_path.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".credentials")
                .join("calendar-trello-gcal-syncer.json")
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Comment text that marks a card as already synced
    #[serde(default = "default_marker_text")]
    pub marker_text: String,
}

fn default_marker_text() -> String {
    "Added to GCal".to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            marker_text: default_marker_text(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to log to a file under the state directory instead of stderr
    #[serde(default)]
    pub to_file: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: false,
        }
    }
}

/// Board settings after validation, every required value present
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTrello {
    pub board_id: String,
    pub app_key: String,
    pub app_token: String,
    pub list_name: String,
    pub marker_text: String,
}

impl Config {
    /// ~/.config/trello-gcal-sync/ (platform equivalent elsewhere)
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR))
    }

    /// Path to the optional user config file
    pub fn user_config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get absolute path to logs directory
    pub fn logs_path() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("logs")
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Start with embedded defaults so only credentials have to be supplied
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        // User config in ~/.config/trello-gcal-sync/
        if let Some(user_config) = Self::user_config_path() {
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment variables: TRELLO_GCAL_SYNC_<SECTION>__<KEY>. Values stay
        // strings: board ids and keys are hex and must not be coerced into numbers.
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Check every value a sync run needs, failing on the first one missing
    pub fn validate(&self) -> Result<ValidatedTrello, SyncError> {
        Ok(ValidatedTrello {
            board_id: required("trello.board_id", self.trello.board_id.as_deref())?,
            app_key: required("trello.app_key", self.trello.app_key.as_deref())?,
            app_token: required("trello.app_token", self.trello.app_token.as_deref())?,
            list_name: required("trello.list_name", Some(&self.trello.list_name))?,
            marker_text: required("sync.marker_text", Some(&self.sync.marker_text))?,
        })
    }

    /// Copy safe to print, with secrets masked
    pub fn redacted(&self) -> Config {
        let mut copy = self.clone();
        let mask = |value: &mut Option<String>| {
            if value.as_deref().is_some_and(|v| !v.is_empty()) {
                *value = Some(REDACTED.to_string());
            }
        };
        mask(&mut copy.trello.app_key);
        mask(&mut copy.trello.app_token);
        copy
    }

    /// Render as TOML for display
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config to TOML")
    }
}

fn required(key: &str, value: Option<&str>) -> Result<String, SyncError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(SyncError::missing_config(key)),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trello: TrelloConfig::default(),
            google: GoogleConfig::default(),
            sync: SyncConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
