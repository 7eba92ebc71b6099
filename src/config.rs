//! Configuration management with hierarchical overrides.
//!
//! Precedence, lowest to highest:
//! 1. Embedded defaults
//! 2. System configuration file (/etc/framewire/config.yaml)
//! 3. User configuration file (~/.config/framewire/config.yaml)
//! 4. Environment variables ({COMPONENT}_*)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration format: {0}")]
    InvalidFormat(#[from] serde_yaml::Error),

    #[error("IO error reading configuration: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration validation failed: {message}")]
    ValidationError { message: String },
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Config {
    /// Broker connection configuration
    pub broker: BrokerConfig,
    /// Publish behavior configuration
    pub publish: PublishConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Broker connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BrokerConfig {
    /// Broker hostname or address
    pub host: String,
    /// Broker port
    pub port: u16,
    /// MQTT keep-alive interval in seconds
    pub keep_alive_secs: u64,
    /// Client identifier; generated when not set
    pub client_id: Option<String>,
    /// Connection establishment timeout in milliseconds
    pub connect_timeout_ms: u64,
}

/// Publish behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublishConfig {
    /// Default topic to publish frames to
    pub topic: String,
    /// How long to wait for a broker acknowledgment, in milliseconds
    pub ack_timeout_ms: u64,
    /// Largest envelope the publisher will hand to the broker, in bytes
    pub max_payload_bytes: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, human)
    pub format: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 1883,
            keep_alive_secs: 60,
            client_id: None,
            connect_timeout_ms: 5000,
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            topic: "demo/packet".to_owned(),
            ack_timeout_ms: 5000,
            max_payload_bytes: 16 * 1024 * 1024,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "human".to_owned(),
        }
    }
}

/// Configuration loader with hierarchical override support.
pub struct ConfigLoader {
    component: String,
}

impl ConfigLoader {
    /// Create a new configuration loader for the specified component.
    pub fn new(component: &str) -> Self {
        Self {
            component: component.to_owned(),
        }
    }

    /// Load configuration with hierarchical overrides.
    pub fn load(&self) -> Result<Config, ConfigError> {
        let mut config = Config::default();

        if let Ok(system_config) = Self::load_file(PathBuf::from("/etc/framewire/config.yaml")) {
            config = system_config;
        }

        if let Ok(user_config) = Self::load_user_config() {
            config = user_config;
        }

        config = self.apply_env_overrides(config);

        Self::validate(&config)?;
        Ok(config)
    }

    fn load_user_config() -> Result<Config, ConfigError> {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_owned());
        Self::load_file(PathBuf::from(home).join(".config/framewire/config.yaml"))
    }

    fn load_file(path: PathBuf) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound { path });
        }
        let content = std::fs::read_to_string(&path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply environment variable overrides using the component name as a
    /// prefix, e.g. component `framewire-pub` reads `FRAMEWIRE_PUB_BROKER_HOST`.
    ///
    /// Parsing failures for numeric values leave the existing value
    /// unchanged.
    fn apply_env_overrides(&self, mut config: Config) -> Config {
        let prefix = self.component.to_uppercase().replace('-', "_");

        if let Ok(val) = std::env::var(format!("{prefix}_BROKER_HOST")) {
            config.broker.host = val;
        }

        if let Ok(val) = std::env::var(format!("{prefix}_BROKER_PORT")) {
            if let Ok(port) = val.parse() {
                config.broker.port = port;
            }
        }

        if let Ok(val) = std::env::var(format!("{prefix}_CLIENT_ID")) {
            config.broker.client_id = Some(val);
        }

        if let Ok(val) = std::env::var(format!("{prefix}_TOPIC")) {
            config.publish.topic = val;
        }

        if let Ok(val) = std::env::var(format!("{prefix}_ACK_TIMEOUT_MS")) {
            if let Ok(timeout) = val.parse() {
                config.publish.ack_timeout_ms = timeout;
            }
        }

        if let Ok(val) = std::env::var(format!("{prefix}_LOG_LEVEL")) {
            config.logging.level = val;
        }

        config
    }

    /// Validate the final configuration.
    fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.broker.port == 0 {
            return Err(ConfigError::ValidationError {
                message: "broker.port must be greater than 0".to_owned(),
            });
        }

        if config.publish.topic.is_empty() {
            return Err(ConfigError::ValidationError {
                message: "publish.topic must not be empty".to_owned(),
            });
        }

        if config.publish.ack_timeout_ms == 0 {
            return Err(ConfigError::ValidationError {
                message: "publish.ack_timeout_ms must be greater than 0".to_owned(),
            });
        }

        if config.publish.max_payload_bytes == 0 {
            return Err(ConfigError::ValidationError {
                message: "publish.max_payload_bytes must be greater than 0".to_owned(),
            });
        }

        Ok(())
    }
}
