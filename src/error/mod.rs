//! Error taxonomy shared by the client and the proxy.
//!
//! Every outbound call ends either with a decoded value or with one of the
//! [`LatteError`] variants. The HTTP status code, when one exists, is stored
//! on the variant at construction time and never changed afterwards.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum LatteError {
    /// Error reported by the upstream address API.
    #[error("api call failed ({error_code}): {message}")]
    ApiCallFailed {
        request_id: Uuid,
        error_code: String,
        message: String,
        status: Option<u16>,
    },

    /// Error reported by the proxy server.
    #[error("proxy error ({error_code}): {}", .message.as_deref().unwrap_or(""))]
    ProxyError {
        error_code: String,
        message: Option<String>,
        status: Option<u16>,
    },

    /// 4xx whose body matched neither known error shape.
    #[error("unknown client error")]
    UnknownClientError {
        #[source]
        cause: serde_json::Error,
        status: Option<u16>,
    },

    /// 5xx whose body matched neither known error shape.
    #[error("unknown server error")]
    UnknownServerError {
        #[source]
        cause: serde_json::Error,
        status: Option<u16>,
    },

    #[error("network timeout")]
    NetworkTimeout,

    #[error("no internet connection")]
    NoInternetConnection,

    #[error("unknown error")]
    Unknown {
        #[source]
        cause: Option<BoxError>,
        status: Option<u16>,
    },
}

impl LatteError {
    pub fn unknown(cause: impl Into<BoxError>) -> Self {
        Self::Unknown {
            cause: Some(cause.into()),
            status: None,
        }
    }

    pub fn unexpected_status(status: u16) -> Self {
        Self::Unknown {
            cause: None,
            status: Some(status),
        }
    }

    /// HTTP status the error was classified from, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiCallFailed { status, .. }
            | Self::ProxyError { status, .. }
            | Self::UnknownClientError { status, .. }
            | Self::UnknownServerError { status, .. }
            | Self::Unknown { status, .. } => *status,
            Self::NetworkTimeout | Self::NoInternetConnection => None,
        }
    }

    /// Machine-readable code, present only on API-reported errors.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::ApiCallFailed { error_code, .. } | Self::ProxyError { error_code, .. } => {
                Some(error_code)
            }
            _ => None,
        }
    }
}

/// Error body emitted by the proxy.
///
/// Exactly two fields; a body carrying anything else (for example the
/// upstream's `request_id`) does not match this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProxyErrorBody {
    pub error_code: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl ProxyErrorBody {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: Some(message.into()),
        }
    }

    pub fn into_error(self, status: u16) -> LatteError {
        LatteError::ProxyError {
            error_code: self.error_code,
            message: self.message,
            status: Some(status),
        }
    }
}

/// Error body emitted by the upstream address API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCallFailedBody {
    pub request_id: Uuid,
    pub error_code: String,
    pub message: String,
}

impl ApiCallFailedBody {
    pub fn into_error(self, status: u16) -> LatteError {
        LatteError::ApiCallFailed {
            request_id: self.request_id,
            error_code: self.error_code,
            message: self.message,
            status: Some(status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_is_reported_per_variant() {
        let err = ProxyErrorBody::new("401-0002", "bad").into_error(401);
        assert_eq!(err.status_code(), Some(401));
        assert_eq!(err.error_code(), Some("401-0002"));

        assert_eq!(LatteError::NetworkTimeout.status_code(), None);
        assert_eq!(LatteError::unexpected_status(302).status_code(), Some(302));
        assert_eq!(LatteError::unknown("boom").status_code(), None);
    }

    #[test]
    fn proxy_error_body_rejects_extra_fields() {
        let body = r#"{"request_id":"6f1c1a8e-3f1e-4b43-9d55-0c6a2d6c2b11","error_code":"400-1000","message":"bad"}"#;
        assert!(serde_json::from_str::<ProxyErrorBody>(body).is_err());
        assert!(serde_json::from_str::<ApiCallFailedBody>(body).is_ok());
    }

    #[test]
    fn proxy_error_body_message_is_optional() {
        let body: ProxyErrorBody = serde_json::from_str(r#"{"error_code":"500-0001"}"#).unwrap();
        assert_eq!(body.message, None);
    }

    #[test]
    fn display_includes_code_and_message() {
        let err = ApiCallFailedBody {
            request_id: Uuid::nil(),
            error_code: "404-1001".into(),
            message: "not found".into(),
        }
        .into_error(404);
        let text = err.to_string();
        assert!(text.contains("404-1001"));
        assert!(text.contains("not found"));
    }
}
