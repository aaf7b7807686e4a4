//! Shared constants and invariants

pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5000;

pub const DEFAULT_API_KEY_HEADER: &str = "X-API-KEY";
pub const DEFAULT_PROXY_TOKEN_TTL_SECONDS: u64 = 300;
pub const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 60;

pub const DEFAULT_LIMIT_TOKEN: u32 = 60;
pub const DEFAULT_LIMIT_PERIOD_SECONDS: u64 = 300;

pub const DEFAULT_METRICS_PATH: &str = "/metrics";

/// Upper bound for configured lifetimes and periods (one year).
pub const MAX_DURATION_SECONDS: u64 = 365 * 24 * 60 * 60;

// Proxy routes
pub const PROXY_TOKEN_PATH: &str = "/proxytoken";
pub const TOKEN_PATH: &str = "/api/v1/j/token";
pub const ADDRESS_ZIP_PATH: &str = "/api/v1/addresszip";

macro_rules! search_code_path {
    () => {
        "/api/v1/searchcode"
    };
}
pub const SEARCH_CODE_PATH: &str = search_code_path!();
pub const SEARCH_CODE_ROUTE: &str = concat!(search_code_path!(), "/{code}");

/// Path prefixes owned by the proxy API.
pub const RESERVED_PATHS: [&str; 2] = [PROXY_TOKEN_PATH, "/api/"];

// Error codes emitted by the proxy
pub const ERR_HEADER_NOT_PROVIDED: &str = "401-0001";
pub const ERR_VALIDATION_FAILED: &str = "401-0002";
pub const ERR_AUTH_OTHER: &str = "401-0003";
pub const ERR_RATE_LIMITED: &str = "429-0001";
pub const ERR_INTERNAL: &str = "500-0001";
pub const ERR_BAD_GATEWAY: &str = "502-0001";
pub const ERR_GATEWAY_TIMEOUT: &str = "504-0001";
