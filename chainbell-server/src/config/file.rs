//! TOML file configuration structures.
//!
//! These structs directly map to the `chainbell.toml` file format. Every
//! section is optional except `[webhook]`.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub program: ProgramConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    pub webhook: WebhookConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
            log_format: LogFormat::default(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// The on-chain program whose logs are ingested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramConfig {
    /// Program id, used when a batch does not name its program.
    #[serde(default)]
    pub program_id: Option<String>,
    /// Decimals of the traded token's mint.
    #[serde(default = "default_token_decimals")]
    pub token_decimals: u32,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            program_id: None,
            token_decimals: default_token_decimals(),
        }
    }
}

fn default_token_decimals() -> u32 {
    chainbell_core::decoder::DEFAULT_TOKEN_DECIMALS
}

/// Delivery retry and concurrency settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            batch_size: default_batch_size(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    60_000
}

fn default_batch_size() -> usize {
    chainbell_core::notify::DEFAULT_BATCH_SIZE
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Webhook channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// HMAC key for the `Chainbell-Signature` header.
    pub signing_secret: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parsing() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"
log_format = "json"

[program]
program_id = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin"
token_decimals = 6

[delivery]
max_attempts = 5
base_delay_ms = 250
batch_size = 10

[webhook]
signing_secret = "whsec"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.server.log_format, LogFormat::Json);
        assert_eq!(config.program.token_decimals, 6);
        assert_eq!(config.delivery.max_attempts, 5);
        assert_eq!(config.delivery.base_delay_ms, 250);
        assert_eq!(config.delivery.batch_size, 10);
        assert_eq!(config.delivery.request_timeout_secs, 30);
        assert_eq!(config.webhook.signing_secret, "whsec");
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: FileConfig = toml::from_str("[webhook]\nsigning_secret = \"s\"\n").unwrap();
        assert_eq!(config.server.listen.port(), 8080);
        assert_eq!(config.server.log_format, LogFormat::Text);
        assert_eq!(config.program.program_id, None);
        assert_eq!(config.program.token_decimals, 9);
        assert_eq!(config.delivery.max_attempts, 3);
        assert_eq!(config.delivery.base_delay_ms, 1000);
        assert_eq!(config.delivery.batch_size, 5);
    }

    #[test]
    fn test_webhook_section_is_required() {
        assert!(toml::from_str::<FileConfig>("[server]\n").is_err());
    }
}
