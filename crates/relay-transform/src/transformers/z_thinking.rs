// Reasoning-to-thinking adapter
// The vendor reports reasoning as `reasoning_content`; clients downstream
// expect a `thinking: {content}` object instead.

use async_trait::async_trait;
use reqwest::header::CONTENT_LENGTH;
use serde_json::Value;

use crate::config::{TransformerKind, ZThinkingConfig};
use crate::error::Result;
use crate::response::{PluginResponse, ResponseBody};
use crate::streaming::{rewrite_json_body, rewrite_sse_stream};
use crate::traits::{ProviderInfo, RequestTransform, Transformer};

#[derive(Debug, Clone, Default)]
pub struct ZThinkingTransformer {
    config: ZThinkingConfig,
}

impl ZThinkingTransformer {
    pub fn new(config: ZThinkingConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Transformer for ZThinkingTransformer {
    fn name(&self) -> &str {
        TransformerKind::ZThinking.name()
    }

    async fn transform_request_in(
        &self,
        mut request: Value,
        _provider: &ProviderInfo,
    ) -> Result<RequestTransform> {
        if self.config.request_thinking_tokens {
            if let Some(fields) = request.as_object_mut() {
                fields.insert("thinking_tokens".to_string(), Value::Bool(true));
            }
        }
        Ok(RequestTransform::body_only(request))
    }

    async fn transform_response_out(&self, response: PluginResponse) -> Result<PluginResponse> {
        rewrite_response(response).await
    }
}

/// Rewrite reasoning fields in a response according to its content type.
///
/// `application/json` bodies are buffered and rewritten once, anything
/// declaring a `stream` type is rewritten event by event, and every other
/// response is returned as-is. Rewritten bodies drop `Content-Length`, since
/// the upstream value no longer matches.
pub async fn rewrite_response(response: PluginResponse) -> Result<PluginResponse> {
    let content_type = response.content_type().unwrap_or_default().to_string();

    if content_type.contains("application/json") {
        tracing::debug!("Rewriting reasoning in JSON body");
        let PluginResponse { status, mut headers, body } = response;
        headers.remove(CONTENT_LENGTH);
        let rewritten = rewrite_json_body(&body.collect().await?)?;
        Ok(PluginResponse::new(status, headers, ResponseBody::Full(rewritten)))
    } else if content_type.contains("stream") {
        tracing::debug!("Rewriting reasoning in event stream ({})", content_type);
        let PluginResponse { status, mut headers, body } = response;
        headers.remove(CONTENT_LENGTH);
        let rewritten = rewrite_sse_stream(body.into_stream());
        Ok(PluginResponse::new(status, headers, ResponseBody::Stream(rewritten)))
    } else {
        Ok(response)
    }
}
