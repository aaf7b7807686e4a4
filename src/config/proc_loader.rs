use std::path::Path;
use std::sync::LazyLock;

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use tracing::{debug, error};

use crate::config::proc_validator;
use crate::config::settings::{LimitConfig, LoggingConfig, ServiceConfig};
use crate::observability::metrics::get_metrics;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{(\w+)(?::([^\}]*))?\}").expect("env var pattern is valid"));

/// Load and validate config from YAML file
pub async fn file_to_config(path: &Path) -> Result<ServiceConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("cannot read config file '{}'", path.display()))?;

    let expanded = expand_env_vars(&content);
    parse_config(expanded).await
}

pub async fn parse_config(content: String) -> Result<ServiceConfig> {
    let mut service_config: ServiceConfig = serde_yaml::from_str(&content).inspect_err(|e| {
        error!("parse config error: {}", e);
    })?;

    // Apply defaults
    if service_config.settings.logging.is_none() {
        service_config.settings.logging = Some(LoggingConfig::default());
    }
    if service_config.settings.limit.is_none() {
        service_config.settings.limit = Some(LimitConfig::default());
    }

    debug!("validation config ...");
    if let Err(errors) = proc_validator::validate_service_config(&service_config) {
        if let Ok(metrics) = get_metrics().await {
            metrics.config_validation_errors.inc_by(errors.len() as u64);
        }
        return Err(anyhow!(
            "config is not valid, total errors: {}\n{}",
            errors.len(),
            errors.join("\n")
        ));
    }

    Ok(service_config)
}

/// Replaces `${VAR}` and `${VAR:default}` with the environment value, the
/// default, or an empty string.
pub fn expand_env_vars(input: &str) -> String {
    ENV_VAR
        .replace_all(input, |caps: &regex::Captures| {
            let var = &caps[1];
            let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            std::env::var(var).unwrap_or_else(|_| default.to_string())
        })
        .to_string()
}
