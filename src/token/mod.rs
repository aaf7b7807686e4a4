//! Opaque access tokens issued by the proxy to its own callers.

pub mod generator;
pub mod validator;

pub use generator::TokenGenerator;
pub use validator::{IssuedTokenValidator, PrefixValidator};
