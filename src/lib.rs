//! # latte
//!
//! Client for the digital address lookup API plus a proxy that keeps the
//! upstream secret server-side.
//!
//! Modules:
//! - `client`: `Latte` client, bearer-token cache, proxy credentials, response classification
//! - `error`: error taxonomy shared by client and proxy
//! - `models`: JSON payloads
//! - `cache`: expiring key/value backends for issued proxy tokens
//! - `token`: proxy token issuance and verification
//! - `server`: axum proxy: auth gate, rate limiting, routes
//! - `config`: service configuration loading and validation

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod helpers;
pub mod models;
pub mod observability;
pub mod server;
pub mod token;
pub mod utils;

#[cfg(test)]
pub mod tests;

pub use crate::client::{ConnectionInfo, CredentialsProvider, DefaultCredentialsProvider, Latte};
pub use crate::config::settings::ServiceConfig;
pub use crate::error::LatteError;
