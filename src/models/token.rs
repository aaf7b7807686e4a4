use serde::{Deserialize, Serialize};

const GRANT_TYPE: &str = "client_credentials";

/// Body posted to the upstream token endpoint in direct mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRequest {
    pub client_id: String,
    pub secret_key: String,
    pub grant_type: String,
}

impl TokenRequest {
    pub fn new(client_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            secret_key: secret_key.into(),
            grant_type: GRANT_TYPE.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    /// Reported lifetime in seconds. Informational only: the client keeps
    /// its own refresh window.
    pub expires_in: i64,
    pub scope: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_request_always_carries_grant_type() {
        let json = serde_json::to_value(TokenRequest::new("id", "secret")).unwrap();
        assert_eq!(json["grant_type"], "client_credentials");
        assert_eq!(json["client_id"], "id");
        assert_eq!(json["secret_key"], "secret");
    }
}
