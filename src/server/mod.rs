pub mod auth;
pub mod error;
pub mod rate_limit;
pub mod routes;
#[allow(clippy::module_inception)]
pub mod server;
