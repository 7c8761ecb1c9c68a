use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::response::PluginResponse;

/// Upstream provider the router selected for a request.
/// Plugins receive it for context; neither shipped plugin inspects it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    #[serde(default)]
    pub api_base_url: String,
    #[serde(default)]
    pub models: Vec<String>,
}

impl ProviderInfo {
    pub fn new(name: impl Into<String>, api_base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            api_base_url: api_base_url.into(),
            models: Vec::new(),
        }
    }
}

/// Extra transport settings for the outbound call
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    pub headers: HeaderMap,
}

/// Result of `transform_request_in`: the body to send plus transport settings
#[derive(Debug, Clone)]
pub struct RequestTransform {
    pub body: Value,
    pub config: RequestConfig,
}

impl RequestTransform {
    /// Body passed through with no extra headers
    pub fn body_only(body: Value) -> Self {
        Self {
            body,
            config: RequestConfig::default(),
        }
    }
}

/// Plugin contract between the router and a vendor adapter.
///
/// Both hooks may suspend (disk, network, stream setup). The router calls
/// `transform_request_in` before sending and `transform_response_out` on
/// whatever comes back, streaming or not.
#[async_trait]
pub trait Transformer: Send + Sync {
    /// Stable plugin name used in router configuration
    fn name(&self) -> &str;

    /// Reshape an outbound chat completion request
    async fn transform_request_in(
        &self,
        request: Value,
        provider: &ProviderInfo,
    ) -> Result<RequestTransform> {
        let _ = provider;
        Ok(RequestTransform::body_only(request))
    }

    /// Reshape an inbound response; identity by default
    async fn transform_response_out(&self, response: PluginResponse) -> Result<PluginResponse> {
        Ok(response)
    }
}
