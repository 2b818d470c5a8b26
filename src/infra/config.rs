//! Configuration loading from TOML files
//!
//! Config file is selected via `--config <path>` (default: config/dev.toml).

use anyhow::{bail, Context};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.himama.com";

#[derive(Debug, Clone, Deserialize)]
pub struct HiMamaSection {
    pub email: String,
    pub password: String,
    pub child_id: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("himama-bridge/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollSection {
    /// Seconds between queries (15 minutes by default)
    #[serde(default = "default_poll_interval_secs")]
    pub interval_secs: u64,
}

impl Default for PollSection {
    fn default() -> Self {
        Self { interval_secs: default_poll_interval_secs() }
    }
}

fn default_poll_interval_secs() -> u64 {
    900
}

#[derive(Debug, Clone, Deserialize)]
pub struct MqttSection {
    #[serde(default = "default_mqtt_host")]
    pub host: String,
    #[serde(default = "default_mqtt_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Prefix for every published topic
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,
    #[serde(default = "default_client_id")]
    pub client_id: String,
}

impl Default for MqttSection {
    fn default() -> Self {
        Self {
            host: default_mqtt_host(),
            port: default_mqtt_port(),
            username: None,
            password: None,
            topic_prefix: default_topic_prefix(),
            client_id: default_client_id(),
        }
    }
}

fn default_mqtt_host() -> String {
    "localhost".to_string()
}

fn default_mqtt_port() -> u16 {
    1883
}

fn default_topic_prefix() -> String {
    "himama".to_string()
}

fn default_client_id() -> String {
    "himama-bridge".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    pub himama: HiMamaSection,
    #[serde(default)]
    pub poll: PollSection,
    #[serde(default)]
    pub mqtt: MqttSection,
}

/// Remote site connection settings, everything `Session` needs
#[derive(Debug, Clone, PartialEq)]
pub struct SiteConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: Duration::from_secs(default_request_timeout_secs()),
            user_agent: default_user_agent(),
        }
    }
}

/// Account login and the child whose reports are queried
#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub child_id: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .field("child_id", &self.child_id)
            .finish()
    }
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    credentials: Credentials,
    site: SiteConfig,
    poll_interval_secs: u64,
    mqtt_host: String,
    mqtt_port: u16,
    mqtt_username: Option<String>,
    mqtt_password: Option<String>,
    mqtt_topic_prefix: String,
    mqtt_client_id: String,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        let mqtt = MqttSection::default();
        Self {
            credentials: Credentials {
                email: String::new(),
                password: String::new(),
                child_id: String::new(),
            },
            site: SiteConfig::default(),
            poll_interval_secs: default_poll_interval_secs(),
            mqtt_host: mqtt.host,
            mqtt_port: mqtt.port,
            mqtt_username: mqtt.username,
            mqtt_password: mqtt.password,
            mqtt_topic_prefix: mqtt.topic_prefix,
            mqtt_client_id: mqtt.client_id,
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        let config = Self {
            credentials: Credentials {
                email: toml_config.himama.email,
                password: toml_config.himama.password,
                child_id: toml_config.himama.child_id,
            },
            site: SiteConfig {
                base_url: toml_config.himama.base_url.trim_end_matches('/').to_string(),
                request_timeout: Duration::from_secs(toml_config.himama.request_timeout_secs),
                user_agent: toml_config.himama.user_agent,
            },
            poll_interval_secs: toml_config.poll.interval_secs,
            mqtt_host: toml_config.mqtt.host,
            mqtt_port: toml_config.mqtt.port,
            mqtt_username: toml_config.mqtt.username,
            mqtt_password: toml_config.mqtt.password,
            mqtt_topic_prefix: toml_config.mqtt.topic_prefix.trim_end_matches('/').to_string(),
            mqtt_client_id: toml_config.mqtt.client_id,
            config_file: path.display().to_string(),
        };

        config
            .validate()
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Account fields must be non-empty strings
    pub fn validate(&self) -> anyhow::Result<()> {
        let required = [
            ("himama.email", &self.credentials.email),
            ("himama.password", &self.credentials.password),
            ("himama.child_id", &self.credentials.child_id),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                bail!("{} must not be empty", name);
            }
        }
        if self.poll_interval_secs == 0 {
            bail!("poll.interval_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    pub fn poll_interval_secs(&self) -> u64 {
        self.poll_interval_secs
    }

    pub fn mqtt_host(&self) -> &str {
        &self.mqtt_host
    }

    pub fn mqtt_port(&self) -> u16 {
        self.mqtt_port
    }

    pub fn mqtt_username(&self) -> Option<&str> {
        self.mqtt_username.as_deref()
    }

    pub fn mqtt_password(&self) -> Option<&str> {
        self.mqtt_password.as_deref()
    }

    pub fn mqtt_topic_prefix(&self) -> &str {
        &self.mqtt_topic_prefix
    }

    pub fn mqtt_client_id(&self) -> &str {
        &self.mqtt_client_id
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method for tests to set credentials
    #[cfg(test)]
    pub fn with_credentials(mut self, email: &str, password: &str, child_id: &str) -> Self {
        self.credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
            child_id: child_id.to_string(),
        };
        self
    }
}
