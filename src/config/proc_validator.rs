//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Covers server, logging, metrics, rate limit, upstream, proxy token and
//!   cache sections

use http::HeaderName;
use tracing::{error, info};

use crate::config::settings::{
    CacheBackendKind, CacheConfig, ProxyTokenConfig, ServiceConfig, SettingsConfig, UpstreamConfig,
};
use crate::utils::constants::{MAX_DURATION_SECONDS, RESERVED_PATHS};

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    validate_upstream(&cfg.upstream, &mut errors);
    validate_proxy_token(&cfg.proxy_token, &mut errors);
    validate_cache(&cfg.cache, &mut errors);

    if errors.is_empty() {
        info!("config valid");
        Ok(())
    } else {
        error!("configuration validation errors ({}):", errors.len());
        for e in &errors {
            error!(" - {}", e);
        }
        Err(errors)
    }
}

/// SETTINGS VALIDATION
fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if settings.server.host.trim().is_empty() {
        errors.push(format!("settings.server.host '{}' must be valid", settings.server.host));
    }
    if settings.server.port.parse::<u16>().is_err() {
        errors.push(format!(
            "settings.server.port '{}' must be an integer in range 0-65535",
            settings.server.port
        ));
    }

    // metrics endpoint start with '/' and must not shadow an API route
    let metrics = &settings.metrics;
    if !metrics.path.starts_with('/') {
        errors.push(format!("settings.metrics.path '{}' must start with '/'", metrics.path));
    }
    if metrics.is_enabled && RESERVED_PATHS.iter().any(|p| metrics.path.starts_with(p)) {
        errors.push(format!(
            "settings.metrics.path '{}' collides with an API route",
            metrics.path
        ));
    }

    if let Some(limit) = &settings.limit {
        if limit.token == 0 {
            errors.push("settings.limit.token must be > 0".to_string());
        }
        if limit.period_seconds == 0 || limit.period_seconds > MAX_DURATION_SECONDS {
            errors.push(format!(
                "settings.limit.period_seconds must be in range 1-{}",
                MAX_DURATION_SECONDS
            ));
        }
    }

    // logging level
    if let Some(logging) = &settings.logging {
        let valid = ["trace", "debug", "info", "warn", "error"];
        if !valid.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' invalid; allowed: {:?}",
                logging.level, valid
            ));
        }
    }
}

fn validate_upstream(upstream: &UpstreamConfig, errors: &mut Vec<String>) {
    let endpoint = upstream.endpoint.trim();
    if endpoint.is_empty() {
        errors.push("upstream.endpoint cannot be empty".to_string());
    } else if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        errors.push(format!(
            "upstream.endpoint '{}' must start with http:// or https://",
            upstream.endpoint
        ));
    } else if reqwest::Url::parse(endpoint).is_err() {
        errors.push(format!("upstream.endpoint '{}' is not a valid URL", upstream.endpoint));
    }
    if upstream.client_id.trim().is_empty() {
        errors.push("upstream.client_id cannot be empty".to_string());
    }
    if upstream.secret_key.trim().is_empty() {
        errors.push("upstream.secret_key cannot be empty".to_string());
    }
    if upstream.timeout_ms == 0 || upstream.timeout_ms > MAX_DURATION_SECONDS * 1000 {
        errors.push(format!(
            "upstream.timeout_ms must be in range 1-{}",
            MAX_DURATION_SECONDS * 1000
        ));
    }
}

fn validate_proxy_token(proxy_token: &ProxyTokenConfig, errors: &mut Vec<String>) {
    if HeaderName::from_bytes(proxy_token.header_name.as_bytes()).is_err() {
        errors.push(format!(
            "proxy_token.header_name '{}' is not a valid header name",
            proxy_token.header_name
        ));
    }
    if proxy_token.ttl_seconds == 0 || proxy_token.ttl_seconds > MAX_DURATION_SECONDS {
        errors.push(format!(
            "proxy_token.ttl_seconds must be in range 1-{}",
            MAX_DURATION_SECONDS
        ));
    }
}

fn validate_cache(cache: &CacheConfig, errors: &mut Vec<String>) {
    if cache.sweep_interval_seconds == 0 || cache.sweep_interval_seconds > MAX_DURATION_SECONDS {
        errors.push(format!(
            "cache.sweep_interval_seconds must be in range 1-{}",
            MAX_DURATION_SECONDS
        ));
    }
    if cache.backend == CacheBackendKind::Redis {
        if !cfg!(feature = "redis") {
            errors.push("cache.backend 'redis' requires the 'redis' feature".to_string());
        }
        match cache.redis_url.as_deref().map(str::trim) {
            None | Some("") => errors.push("cache.redis_url is required for the redis backend".to_string()),
            Some(url) if !(url.starts_with("redis://") || url.starts_with("rediss://")) => errors.push(format!(
                "cache.redis_url '{}' must start with redis:// or rediss://",
                url
            )),
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(extra: &str) -> ServiceConfig {
        let yaml = format!(
            r#"
settings:
  server:
    host: 127.0.0.1
    port: "8080"
upstream:
  endpoint: https://upstream.example.test
  client_id: id
  secret_key: key
{}
"#,
            extra
        );
        serde_yaml::from_str(&yaml).unwrap()
    }

    #[test]
    fn minimal_config_is_valid() {
        assert!(validate_service_config(&config("")).is_ok());
    }

    #[test]
    fn lifetimes_beyond_a_year_are_rejected() {
        let cfg = config(
            "proxy_token:\n  ttl_seconds: 10000000000000\ncache:\n  sweep_interval_seconds: 10000000000000",
        );
        let errors = validate_service_config(&cfg).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("proxy_token.ttl_seconds"));
        assert!(errors[1].starts_with("cache.sweep_interval_seconds"));
    }

    #[test]
    fn one_year_is_the_inclusive_bound() {
        let mut cfg = config("");
        cfg.proxy_token.ttl_seconds = MAX_DURATION_SECONDS;
        cfg.settings.limit = Some(crate::config::settings::LimitConfig {
            token: 1,
            period_seconds: MAX_DURATION_SECONDS,
        });
        assert!(validate_service_config(&cfg).is_ok());

        cfg.settings.limit = Some(crate::config::settings::LimitConfig {
            token: 1,
            period_seconds: MAX_DURATION_SECONDS + 1,
        });
        let errors = validate_service_config(&cfg).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("settings.limit.period_seconds"));
    }
}
