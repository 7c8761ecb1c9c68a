use config::{Config as ConfigLoader, ConfigError, Environment, File};
use relay_transform::{QwenCliConfig, ZThinkingConfig};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub qwen_cli: QwenCliConfig,
    #[serde(default)]
    pub z_thinking: ZThinkingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables, e.g. RELAY_QWEN_CLI__TOKEN_URL or RELAY_LOGGING__LEVEL
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("RELAY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Load config from a specific path, still honouring environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("RELAY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_config_structure() {
        let toml = r#"
            [logging]
            level = "debug"
            format = "json"

            [qwen_cli]
            credentials_path = "/srv/relay/oauth_creds.json"
            token_url = "http://localhost:8080/token"

            [z_thinking]
            request_thinking_tokens = false
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.logging.format, "json");
        assert_eq!(
            config.qwen_cli.credentials_path(),
            PathBuf::from("/srv/relay/oauth_creds.json")
        );
        assert_eq!(config.qwen_cli.token_url, "http://localhost:8080/token");
        assert_eq!(
            config.qwen_cli.client_id,
            relay_transform::config::QWEN_CLIENT_ID
        );
        assert!(!config.z_thinking.request_thinking_tokens);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.qwen_cli, QwenCliConfig::default());
        assert!(config.z_thinking.request_thinking_tokens);
    }
}
