// Qwen CLI OAuth adapter
// Lets the router reuse the credentials the Qwen CLI stores on disk.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use serde_json::Value;

use crate::auth::CredentialStore;
use crate::config::{QwenCliConfig, TransformerKind};
use crate::error::Result;
use crate::normalize::normalize_messages;
use crate::traits::{ProviderInfo, RequestConfig, RequestTransform, Transformer};

/// Decorates outbound requests with a fresh Qwen OAuth bearer token and
/// normalizes message content into the block form Qwen expects.
pub struct QwenCliTransformer {
    credentials: Arc<CredentialStore>,
    user_agent: HeaderValue,
}

impl QwenCliTransformer {
    pub fn new(credentials: Arc<CredentialStore>, user_agent: &str) -> Result<Self> {
        Ok(Self {
            credentials,
            user_agent: HeaderValue::from_str(user_agent)?,
        })
    }

    pub fn from_config(config: &QwenCliConfig) -> Result<Self> {
        let store = CredentialStore::from_config(config)?;
        Self::new(Arc::new(store), &config.user_agent)
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    /// Build the outbound body and headers. Does not send anything.
    pub async fn decorate(&self, mut request: Value) -> Result<RequestTransform> {
        let access_token = match self.credentials.ensure_fresh().await? {
            Some(credential) => credential.access_token,
            None => {
                tracing::warn!(
                    "No Qwen OAuth credentials at {}; sending empty bearer token",
                    self.credentials.path().display()
                );
                String::new()
            }
        };

        if let Some(fields) = request.as_object_mut() {
            let streaming = fields.get("stream").and_then(Value::as_bool).unwrap_or(false);
            if streaming {
                fields.insert(
                    "stream_options".to_string(),
                    serde_json::json!({ "include_usage": true }),
                );
            }

            if let Some(messages) = fields.remove("messages") {
                fields.insert("messages".to_string(), normalize_messages(messages));
            }
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", access_token))?,
        );
        headers.insert(USER_AGENT, self.user_agent.clone());

        Ok(RequestTransform {
            body: request,
            config: RequestConfig { headers },
        })
    }
}

#[async_trait]
impl Transformer for QwenCliTransformer {
    fn name(&self) -> &str {
        TransformerKind::QwenCli.name()
    }

    async fn transform_request_in(
        &self,
        request: Value,
        _provider: &ProviderInfo,
    ) -> Result<RequestTransform> {
        self.decorate(request).await
    }
}
