use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use validator::{Validate, ValidationError};

use crate::models::MatchConfig;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct Settings {
    #[serde(default)]
    #[validate(nested)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub batch: BatchSettings,
    #[serde(default)]
    #[validate(nested)]
    pub demo: DemoSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_wait_bounds"))]
pub struct MatchingSettings {
    #[serde(default = "default_cooldown_secs")]
    #[validate(range(min = 0))]
    pub cooldown_secs: i64,
    #[serde(default = "default_min_wait_secs")]
    pub min_wait_secs: u16,
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u16,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown_secs(),
            min_wait_secs: default_min_wait_secs(),
            max_wait_secs: default_max_wait_secs(),
        }
    }
}

impl MatchingSettings {
    pub fn to_match_config(&self) -> MatchConfig {
        MatchConfig {
            cooldown_secs: self.cooldown_secs,
            min_wait_secs: self.min_wait_secs,
            max_wait_secs: self.max_wait_secs,
        }
    }
}

fn default_cooldown_secs() -> i64 { 600 }
fn default_min_wait_secs() -> u16 { 20 }
fn default_max_wait_secs() -> u16 { 300 }

fn validate_wait_bounds(settings: &MatchingSettings) -> Result<(), ValidationError> {
    if settings.max_wait_secs < settings.min_wait_secs {
        return Err(ValidationError::new("max_wait_below_min_wait"));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchSettings {
    #[serde(default = "default_true")]
    pub parallel: bool,
    /// Fixed seed for reproducible tie-breaks
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            parallel: true,
            seed: None,
        }
    }
}

fn default_true() -> bool { true }

/// Inputs for the demo binary
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DemoSettings {
    #[serde(default = "default_pool_size")]
    #[validate(range(min = 1, max = 100000))]
    pub pool_size: usize,
    #[serde(default = "default_seeker_id")]
    #[validate(length(min = 1))]
    pub seeker_id: String,
    #[serde(default = "default_seeker_user_id")]
    #[validate(length(min = 1))]
    pub seeker_user_id: String,
    #[serde(default = "default_mic_count")]
    pub mic_count: u16,
    #[serde(default = "default_audience_count")]
    pub audience_count: u16,
    #[serde(default = "default_wait_seconds")]
    pub wait_seconds: u16,
    /// Number of generated seekers for the batch run, 0 skips it
    #[serde(default)]
    pub batch_seekers: usize,
    #[serde(default = "default_top_n")]
    #[validate(range(min = 1))]
    pub top_n: usize,
    #[serde(default = "default_output")]
    pub output: String,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            seeker_id: default_seeker_id(),
            seeker_user_id: default_seeker_user_id(),
            mic_count: default_mic_count(),
            audience_count: default_audience_count(),
            wait_seconds: default_wait_seconds(),
            batch_seekers: 0,
            top_n: default_top_n(),
            output: default_output(),
            seed: None,
        }
    }
}

fn default_pool_size() -> usize { 100 }
fn default_seeker_id() -> String { "current".to_string() }
fn default_seeker_user_id() -> String { "user123".to_string() }
fn default_mic_count() -> u16 { 3 }
fn default_audience_count() -> u16 { 50 }
fn default_wait_seconds() -> u16 { 80 }
fn default_top_n() -> usize { 5 }
fn default_output() -> String { "text".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with COHOST_)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., COHOST__MATCHING__COOLDOWN_SECS -> matching.cooldown_secs
            .add_source(env_source())
            .build()?;

        Self::finish(settings)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(env_source())
            .build()?;

        Self::finish(settings)
    }

    fn finish(config: Config) -> Result<Self, ConfigError> {
        let settings: Settings = config.try_deserialize()?;
        settings
            .validate()
            .map_err(|e| ConfigError::Message(format!("Invalid settings: {}", e)))?;
        Ok(settings)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("COHOST")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
