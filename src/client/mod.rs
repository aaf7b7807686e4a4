//! Client side of the address API: connection targets, bearer-token caching,
//! proxy credentials, and classification of every HTTP outcome.

pub mod classifier;
pub mod connection;
pub mod credentials;
pub mod latte;
pub mod token_cache;

pub use classifier::{classify, execute_catching, relocate};
pub use connection::ConnectionInfo;
pub use credentials::{Credentials, CredentialsProvider, DefaultCredentialsProvider};
pub use latte::Latte;
pub use token_cache::{BearerToken, TokenCache, DEFAULT_TOKEN_VALIDITY};
