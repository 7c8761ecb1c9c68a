use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::oauth::TokenResponse;

/// Tokens are treated as expired this long before the server says they are.
pub const EXPIRY_SAFETY_MARGIN_MS: i64 = 60_000;

/// OAuth credential record, in the on-disk `oauth_creds.json` layout.
///
/// Fields the token endpoint returns beyond the three we use (`token_type`,
/// `resource_url`, ...) are kept in `extra` and written back untouched.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(default)]
    pub access_token: String,

    #[serde(default)]
    pub refresh_token: String,

    /// Expiry as epoch milliseconds, already reduced by the safety margin.
    /// A record without one never counts as expired.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<i64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Credential {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expiry_date: i64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expiry_date: Some(expiry_date),
            extra: Map::new(),
        }
    }

    /// Build the record stored after a successful refresh.
    ///
    /// The refresh token used for the call is kept even if the endpoint sent
    /// back a different one, and `expires_in` is folded into `expiry_date`.
    pub fn from_token_response(
        response: TokenResponse,
        refresh_token: impl Into<String>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        let expiry_date = issued_at
            .timestamp_millis()
            .saturating_add(response.expires_in.saturating_mul(1000))
            .saturating_sub(EXPIRY_SAFETY_MARGIN_MS);

        Self {
            access_token: response.access_token,
            refresh_token: refresh_token.into(),
            expiry_date: Some(expiry_date),
            extra: response.extra,
        }
    }

    pub fn expiry_instant(&self) -> Option<DateTime<Utc>> {
        self.expiry_date.and_then(DateTime::from_timestamp_millis)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date
            .is_some_and(|expiry| expiry < now.timestamp_millis())
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expiry_date", &self.expiry_date)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}
