use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /proxytoken`; carries no parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyTokenRequest {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyTokenResponse {
    #[serde(rename = "ProxyToken")]
    pub proxy_token: String,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
}
