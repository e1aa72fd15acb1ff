use std::time::Duration;

use config::{Config, File, FileFormat};
pub use config::ConfigError;
use serde::Deserialize;

use crate::api::SideEncoding;
use crate::deploy::PollPolicy;
use crate::grid::{GridTemplate, Stance};

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Settings {
    /// Bot-orchestration service connection
    #[serde(default)]
    pub api: ApiConfig,
    /// What to deploy and where
    #[serde(default)]
    pub deploy: DeployConfig,
    /// Status polling policy
    #[serde(default)]
    pub poll: PollConfig,
    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
    /// Overrides for the shared grid template
    #[serde(default)]
    pub template: GridTemplate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the Hummingbot API (e.g. "http://localhost:8000")
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_username")]
    pub username: String,
    /// In production, load this from ENV (APP__API__PASSWORD) only
    #[serde(default = "default_password")]
    pub password: String,
    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Wire convention for the `side` field: "trade_type" (short = 2) or "signed" (short = -1)
    #[serde(default)]
    pub side_encoding: SideEncoding,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            username: default_username(),
            password: default_password(),
            timeout_secs: default_timeout_secs(),
            side_encoding: SideEncoding::default(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_password() -> String {
    "admin".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeployConfig {
    /// Instrument to trade (e.g., "ERA-USDT")
    #[serde(default = "default_trading_pair")]
    pub trading_pair: String,
    /// Candle interval used for the price history
    #[serde(default = "default_candle_interval")]
    pub candle_interval: String,
    /// Number of candles requested
    #[serde(default = "default_max_records")]
    pub max_records: u32,
    /// Bot instance to deploy
    #[serde(default = "default_instance_name")]
    pub instance_name: String,
    /// Credentials profile the bot trades under
    #[serde(default = "default_credentials_profile")]
    pub credentials_profile: String,
    #[serde(default = "default_aggressive_side")]
    pub aggressive_side: Stance,
    #[serde(default = "default_conservative_side")]
    pub conservative_side: Stance,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            trading_pair: default_trading_pair(),
            candle_interval: default_candle_interval(),
            max_records: default_max_records(),
            instance_name: default_instance_name(),
            credentials_profile: default_credentials_profile(),
            aggressive_side: default_aggressive_side(),
            conservative_side: default_conservative_side(),
        }
    }
}

fn default_trading_pair() -> String {
    "ERA-USDT".to_string()
}

fn default_candle_interval() -> String {
    "1m".to_string()
}

fn default_max_records() -> u32 {
    60
}

fn default_instance_name() -> String {
    "double_grid_bot".to_string()
}

fn default_credentials_profile() -> String {
    "master_account".to_string()
}

fn default_aggressive_side() -> Stance {
    Stance::Long
}

fn default_conservative_side() -> Stance {
    Stance::Short
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    /// Seconds between status checks
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Give up after this many status checks (unset = no limit)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: Option<u32>,
    /// Give up after this many seconds of polling (unset = no limit)
    #[serde(default)]
    pub deadline_secs: Option<u64>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            max_attempts: default_max_attempts(),
            deadline_secs: None,
        }
    }
}

fn default_interval_secs() -> u64 {
    5
}

fn default_max_attempts() -> Option<u32> {
    Some(120)
}

impl PollConfig {
    pub fn policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(self.interval_secs),
            max_attempts: self.max_attempts,
            deadline: self.deadline_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LogConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    /// Load settings from a configuration file
    pub fn new(config_path: &str) -> Result<Self, ConfigError> {
        Self::build(Config::builder().add_source(File::with_name(config_path)))
    }

    /// Load settings from defaults and `APP__` environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::build(Config::builder())
    }

    /// Load settings from TOML text
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Self::build(Config::builder().add_source(File::from_str(contents, FileFormat::Toml)))
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let s = builder
            // Add environment variables (overrides file)
            // e.g. APP__API__PASSWORD=...
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
