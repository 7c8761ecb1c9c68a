use std::time::Duration;

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Result, TransformError};

/// Successful reply from the token endpoint
#[derive(Deserialize)]
pub struct TokenResponse {
    pub access_token: String,

    /// Seconds until the new access token expires
    pub expires_in: i64,

    /// Rotated refresh token, if the vendor sends one. Not used.
    #[serde(default)]
    pub refresh_token: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Minimal client for the refresh-token grant
#[derive(Debug, Clone)]
pub struct OAuthClient {
    http_client: reqwest::Client,
    token_url: String,
    client_id: String,
}

impl OAuthClient {
    pub fn new(token_url: impl Into<String>, client_id: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            token_url: token_url.into(),
            client_id: client_id.into(),
        })
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// The body is form-encoded while the declared content type stays
    /// `application/json`; the endpoint has always been called this way.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenResponse> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        tracing::debug!("Refreshing OAuth token at {}", self.token_url);

        // form() only sets a content type when none is present
        let response = self
            .http_client
            .post(&self.token_url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("OAuth refresh failed: status={}", status);
            return Err(TransformError::OAuthRejected { status, body });
        }

        let token: TokenResponse = response.json().await?;
        tracing::info!(
            "OAuth token refreshed, expires in {} seconds",
            token.expires_in
        );

        Ok(token)
    }
}
