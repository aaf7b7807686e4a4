use std::fmt;
use std::sync::Arc;

use reqwest::Url;

use crate::client::credentials::CredentialsProvider;
use crate::error::LatteError;
use crate::utils::constants::{ADDRESS_ZIP_PATH, SEARCH_CODE_PATH, TOKEN_PATH};

/// Where a [`Latte`](crate::client::Latte) client sends its requests.
///
/// `Direct` talks to the upstream API and holds the client secret. `Proxy`
/// talks to a latte proxy, optionally attaching credentials obtained from a
/// [`CredentialsProvider`].
#[derive(Clone)]
pub enum ConnectionInfo {
    Direct {
        host: String,
        client_id: String,
        secret_key: String,
        forwarded_for: String,
    },
    Proxy {
        host: String,
        credentials_provider: Option<Arc<dyn CredentialsProvider>>,
    },
}

impl ConnectionInfo {
    pub fn direct(
        host: impl Into<String>,
        client_id: impl Into<String>,
        secret_key: impl Into<String>,
        forwarded_for: impl Into<String>,
    ) -> Self {
        Self::Direct {
            host: host.into(),
            client_id: client_id.into(),
            secret_key: secret_key.into(),
            forwarded_for: forwarded_for.into(),
        }
    }

    pub fn proxy(host: impl Into<String>) -> Self {
        Self::Proxy {
            host: host.into(),
            credentials_provider: None,
        }
    }

    /// Attaches a credentials provider. Has no effect on `Direct`.
    pub fn with(self, provider: Arc<dyn CredentialsProvider>) -> Self {
        match self {
            Self::Proxy { host, .. } => Self::Proxy {
                host,
                credentials_provider: Some(provider),
            },
            direct @ Self::Direct { .. } => direct,
        }
    }

    pub fn host(&self) -> &str {
        match self {
            Self::Direct { host, .. } | Self::Proxy { host, .. } => host,
        }
    }

    pub fn token_path(&self) -> &'static str {
        TOKEN_PATH
    }

    pub fn search_code_path(&self) -> &'static str {
        SEARCH_CODE_PATH
    }

    pub fn address_zip_path(&self) -> &'static str {
        ADDRESS_ZIP_PATH
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self, Self::Proxy { .. })
    }

    pub(crate) fn token_url(&self) -> String {
        self.join(self.token_path())
    }

    pub(crate) fn address_zip_url(&self) -> String {
        self.join(self.address_zip_path())
    }

    /// Search URL with `code` appended as one percent-encoded path segment.
    pub(crate) fn search_code_url(&self, code: &str) -> Result<Url, LatteError> {
        let mut url = Url::parse(&self.join(self.search_code_path())).map_err(LatteError::unknown)?;
        url.path_segments_mut()
            .map_err(|_| LatteError::unknown(format!("'{}' cannot carry a path", self.host())))?
            .pop_if_empty()
            .push(code);
        Ok(url)
    }

    fn join(&self, path: &str) -> String {
        format!("{}{}", self.host().trim_end_matches('/'), path)
    }
}

impl fmt::Debug for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct {
                host,
                client_id,
                forwarded_for,
                ..
            } => f
                .debug_struct("Direct")
                .field("host", host)
                .field("client_id", client_id)
                .field("secret_key", &"<redacted>")
                .field("forwarded_for", forwarded_for)
                .finish(),
            Self::Proxy {
                host,
                credentials_provider,
            } => f
                .debug_struct("Proxy")
                .field("host", host)
                .field("credentials_provider", &credentials_provider.is_some())
                .finish(),
        }
    }
}
