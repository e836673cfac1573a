use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use super::ThrottleLimits;
use crate::engine::policy::PolicyKind;

/// Provides the default value for state_key.
fn default_state_key() -> String {
    "notification_states".to_string()
}

/// Application configuration for geonotify.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Database URL for the SQLite key-value store.
    pub database_url: String,

    /// Key under which the notification state document is stored.
    #[serde(default = "default_state_key")]
    pub state_key: String,

    /// Which notification policy to apply.
    #[serde(default)]
    pub policy: PolicyKind,

    /// Limits used by the full throttling policy.
    #[serde(default)]
    pub throttle: ThrottleLimits,

    /// Path to the location definitions file.
    #[serde(skip_deserializing)]
    pub locations_config_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            state_key: default_state_key(),
            policy: PolicyKind::default(),
            throttle: ThrottleLimits::default(),
            locations_config_path: PathBuf::new(),
        }
    }
}

impl AppConfig {
    /// Creates a new `AppConfig` by reading `app.yaml` from the configuration
    /// directory, overridden by `GEONOTIFY__*` environment variables.
    pub fn new(config_dir: Option<&str>) -> Result<Self, ConfigError> {
        let config_dir_str = config_dir.unwrap_or("configs");
        let s = Config::builder()
            .add_source(File::with_name(&format!("{}/app.yaml", config_dir_str)))
            .add_source(Environment::with_prefix("GEONOTIFY").separator("__"))
            .build()?;
        let mut config: Self = s.try_deserialize()?;

        config.locations_config_path = Path::new(config_dir_str).join("locations.yaml");

        Ok(config)
    }

    /// Creates a new `AppConfigBuilder` for testing purposes.
    #[cfg(test)]
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

/// A builder for creating `AppConfig` instances for testing.
#[cfg(test)]
#[derive(Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

#[cfg(test)]
impl AppConfigBuilder {
    pub fn database_url(mut self, url: &str) -> Self {
        self.config.database_url = url.to_string();
        self
    }

    pub fn policy(mut self, policy: PolicyKind) -> Self {
        self.config.policy = policy;
        self
    }

    pub fn max_daily_notifications(mut self, max: u32) -> Self {
        self.config.throttle.max_daily_notifications = max;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}
