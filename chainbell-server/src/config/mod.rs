//! Configuration module for chainbell-server.
//!
//! Handles loading configuration from the TOML file, CLI overrides and
//! environment variables.

pub mod file;

use crate::config::file::FileConfig;
use chainbell_core::address;
use chainbell_core::notify::{NotificationConfig, RetryPolicy};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Read the TOML file, apply CLI overrides and validate.
    pub fn load(&self) -> Result<FileConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        self.load_str(&config_content)
    }

    fn load_str(&self, content: &str) -> Result<FileConfig, ConfigError> {
        let mut file_config: FileConfig = toml::from_str(content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        validate(&file_config)?;
        Ok(file_config)
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    if config.delivery.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "delivery.max_attempts must be at least 1".to_string(),
        ));
    }
    if config.delivery.batch_size == 0 {
        return Err(ConfigError::ValidationError(
            "delivery.batch_size must be at least 1".to_string(),
        ));
    }
    if let Some(program_id) = &config.program.program_id
        && !address::is_well_formed(program_id)
    {
        return Err(ConfigError::ValidationError(format!(
            "program.program_id is not a valid address: {program_id}"
        )));
    }
    if config.webhook.signing_secret.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "webhook.signing_secret must not be empty".to_string(),
        ));
    }
    Ok(())
}

impl FileConfig {
    pub fn notification_config(&self) -> NotificationConfig {
        NotificationConfig {
            retry: RetryPolicy {
                max_attempts: self.delivery.max_attempts,
                base_delay: Duration::from_millis(self.delivery.base_delay_ms),
                max_delay: Duration::from_millis(self.delivery.max_delay_ms),
            },
            batch_size: self.delivery.batch_size,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.delivery.request_timeout_secs)
    }
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader() -> ConfigLoader {
        ConfigLoader::new("unused.toml", None)
    }

    #[test]
    fn test_listen_override() {
        let listen: SocketAddr = "127.0.0.1:9999".parse().unwrap();
        let config = ConfigLoader::new("unused.toml", Some(listen))
            .load_str("[webhook]\nsigning_secret = \"s\"\n")
            .unwrap();
        assert_eq!(config.server.listen, listen);
    }

    #[test]
    fn test_rejects_zero_attempts() {
        let err = loader()
            .load_str("[delivery]\nmax_attempts = 0\n[webhook]\nsigning_secret = \"s\"\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_rejects_zero_batch_size() {
        let err = loader()
            .load_str("[delivery]\nbatch_size = 0\n[webhook]\nsigning_secret = \"s\"\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_rejects_invalid_program_id() {
        let err = loader()
            .load_str("[program]\nprogram_id = \"0xdeadbeef\"\n[webhook]\nsigning_secret = \"s\"\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_accepts_valid_program_id() {
        let config = loader()
            .load_str(
                "[program]\nprogram_id = \"Fg6PaFpoGXkYsidMpWTK6W2BeZ7FEfcYkg476zPFsLnS\"\n[webhook]\nsigning_secret = \"s\"\n",
            )
            .unwrap();
        assert_eq!(
            config.program.program_id.as_deref(),
            Some("Fg6PaFpoGXkYsidMpWTK6W2BeZ7FEfcYkg476zPFsLnS")
        );
    }

    #[test]
    fn test_rejects_empty_secret() {
        let err = loader()
            .load_str("[webhook]\nsigning_secret = \"  \"\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_notification_config_mapping() {
        let config = loader()
            .load_str("[delivery]\nbase_delay_ms = 500\n[webhook]\nsigning_secret = \"s\"\n")
            .unwrap();
        let notification = config.notification_config();
        assert_eq!(notification.retry.max_attempts, 3);
        assert_eq!(notification.retry.base_delay, Duration::from_millis(500));
        assert_eq!(notification.batch_size, 5);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }
}
