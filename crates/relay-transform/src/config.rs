// Configuration layer for transformer plugins
// This module provides a factory pattern for creating plugins from configuration

use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::Result;
use crate::traits::Transformer;
use crate::transformers::{QwenCliTransformer, ZThinkingTransformer};

pub const QWEN_TOKEN_URL: &str = "https://chat.qwen.ai/api/v1/oauth2/token";
pub const QWEN_CLIENT_ID: &str = "f0304373b74a44d2b584a3fb70ca9e56";
pub const QWEN_USER_AGENT: &str = "QwenCode/v22.12.0 (darwin; arm64)";

/// Type of transformer plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransformerKind {
    QwenCli,
    ZThinking,
}

impl TransformerKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::QwenCli => "qwen-cli",
            Self::ZThinking => "z-thinking",
        }
    }
}

/// Configuration for the Qwen OAuth request decorator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QwenCliConfig {
    /// Credential file (defaults to ~/.qwen/oauth_creds.json)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_path: Option<PathBuf>,
    pub token_url: String,
    pub client_id: String,
    pub user_agent: String,
}

impl Default for QwenCliConfig {
    fn default() -> Self {
        Self {
            credentials_path: None,
            token_url: QWEN_TOKEN_URL.to_string(),
            client_id: QWEN_CLIENT_ID.to_string(),
            user_agent: QWEN_USER_AGENT.to_string(),
        }
    }
}

impl QwenCliConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = Some(path.into());
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Configured credential file, or the default under the user's home
    pub fn credentials_path(&self) -> PathBuf {
        self.credentials_path
            .clone()
            .unwrap_or_else(default_credentials_path)
    }
}

/// `<home>/.qwen/oauth_creds.json`, relative to the working directory when no home is known
pub fn default_credentials_path() -> PathBuf {
    UserDirs::new()
        .map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf())
        .join(".qwen")
        .join("oauth_creds.json")
}

/// Configuration for the reasoning-to-thinking rewriter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZThinkingConfig {
    /// Set `thinking_tokens: true` on outbound requests
    pub request_thinking_tokens: bool,
}

impl Default for ZThinkingConfig {
    fn default() -> Self {
        Self {
            request_thinking_tokens: true,
        }
    }
}

/// Plugin-specific configuration, tagged by plugin name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TransformerConfig {
    QwenCli(QwenCliConfig),
    ZThinking(ZThinkingConfig),
}

impl TransformerConfig {
    pub fn qwen_cli() -> Self {
        Self::QwenCli(QwenCliConfig::default())
    }

    pub fn z_thinking() -> Self {
        Self::ZThinking(ZThinkingConfig::default())
    }

    pub fn kind(&self) -> TransformerKind {
        match self {
            Self::QwenCli(_) => TransformerKind::QwenCli,
            Self::ZThinking(_) => TransformerKind::ZThinking,
        }
    }
}

/// Factory for creating transformer plugins from configuration
pub struct TransformerFactory;

impl TransformerFactory {
    pub fn create(config: TransformerConfig) -> Result<Arc<dyn Transformer>> {
        match config {
            TransformerConfig::QwenCli(qwen_config) => {
                let transformer = QwenCliTransformer::from_config(&qwen_config)?;
                Ok(Arc::new(transformer))
            }
            TransformerConfig::ZThinking(z_config) => {
                Ok(Arc::new(ZThinkingTransformer::new(z_config)))
            }
        }
    }
}
