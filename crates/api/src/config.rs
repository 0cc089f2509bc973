use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use diligence::DEFAULT_MAX_ROUNDS;
use ingest::MAX_DECK_BYTES;
use model::ModelConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub gemini: ModelConfig,
    pub diligence: DiligenceConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty, // Human-readable, for local runs
    Json,   // One JSON object per line
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub max_upload_bytes: usize,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiligenceConfig {
    pub max_verification_rounds: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON file holding user settings such as the API key
    pub settings_path: PathBuf,
    pub export_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_addr: "0.0.0.0:3000".to_string(),
                // Multipart framing on top of the deck itself
                max_upload_bytes: MAX_DECK_BYTES + 1024 * 1024,
                log_format: LogFormat::Pretty,
            },
            gemini: ModelConfig::default(),
            diligence: DiligenceConfig {
                max_verification_rounds: DEFAULT_MAX_ROUNDS,
            },
            storage: StorageConfig {
                settings_path: PathBuf::from("data/settings.json"),
                export_dir: PathBuf::from("data/memos"),
            },
        }
    }
}

impl AppConfig {
    /// Defaults overridden by environment variables (and `.env`).
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::default();

        if let Some(addr) = env_var("BIND_ADDR") {
            config.server.bind_addr = addr;
        }
        if let Some(format) = env_var("LOG_FORMAT") {
            config.server.log_format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" | "text" => LogFormat::Pretty,
                other => anyhow::bail!("LOG_FORMAT must be 'json' or 'pretty', got '{}'", other),
            };
        }
        if let Some(rounds) = env_var("MAX_VERIFICATION_ROUNDS") {
            config.diligence.max_verification_rounds = rounds
                .parse()
                .context("MAX_VERIFICATION_ROUNDS must be a non-negative integer")?;
        }
        if let Some(path) = env_var("SETTINGS_PATH") {
            config.storage.settings_path = PathBuf::from(path);
        }
        if let Some(dir) = env_var("MEMO_EXPORT_DIR") {
            config.storage.export_dir = PathBuf::from(dir);
        }
        config.gemini = ModelConfig::from_env();

        Ok(config)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind_addr, "0.0.0.0:3000");
        assert!(config.server.max_upload_bytes > MAX_DECK_BYTES);
        assert_eq!(config.diligence.max_verification_rounds, DEFAULT_MAX_ROUNDS);
        assert_eq!(config.server.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_log_format_serde() {
        let value = serde_json::to_value(LogFormat::Json).unwrap();
        assert_eq!(value, "json");
    }
}
