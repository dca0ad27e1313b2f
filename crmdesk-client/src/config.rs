use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::query::{QueryOptions, RetryPolicy};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub cache: CacheSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_login_path")]
    pub login_path: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            timeout_secs: default_timeout_secs(),
            login_path: default_login_path(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_login_path() -> String {
    "/login".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    Memory,
    Keyring,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SessionSettings {
    #[serde(default)]
    pub backend: SessionBackend,
    pub token: Option<String>,
    pub tenant_id: Option<String>,
    pub environment: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheSettings {
    #[serde(default = "default_gc_time_secs")]
    pub gc_time_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_secs")]
    pub retry_max_delay_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            gc_time_secs: default_gc_time_secs(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_secs: default_retry_max_delay_secs(),
        }
    }
}

fn default_gc_time_secs() -> u64 {
    300
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

fn default_retry_max_delay_secs() -> u64 {
    30
}

impl CacheSettings {
    /// Base options for every query; retry bounds are clamped by `RetryPolicy`
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions::default()
            .with_gc_time(Duration::from_secs(self.gc_time_secs))
            .with_retry(RetryPolicy::new(
                self.max_retries,
                Duration::from_millis(self.retry_base_delay_ms),
                Duration::from_secs(self.retry_max_delay_secs),
            ))
    }
}

const DEFAULT_CONFIG: &str = r#"
[api]
base_url = "http://localhost:8000/api"
timeout_secs = 30
login_path = "/login"

[session]
# "memory" keeps the session for this process only, "keyring" uses the OS keychain
backend = "memory"
# token = "your-access-token"
# tenant_id = "your-tenant"
# environment = "production"

[cache]
gc_time_secs = 300
max_retries = 2
retry_base_delay_ms = 1000
retry_max_delay_secs = 30
"#;

impl ClientConfig {
    /// Loads the user config file, writing a default one first if missing
    pub fn load() -> Result<(Self, PathBuf), ConfigError> {
        let config_path = get_config_path();

        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        if !config_path.exists() {
            std::fs::write(&config_path, DEFAULT_CONFIG).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
        }

        let config = Self::load_from(&config_path)?;
        Ok((config, config_path))
    }

    /// Loads `path`, then applies `CRMDESK__SECTION__KEY` environment overrides
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::from(path.to_path_buf()))
            .add_source(Environment::with_prefix("CRMDESK").separator("__"))
            .build()?;

        builder.try_deserialize()
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("crmdesk").join("client.toml")
    } else {
        PathBuf::from("client.toml")
    }
}
