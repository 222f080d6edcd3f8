//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Fails once with every problem listed

use anyhow::{bail, Result};
use tracing::{error, info};
use url::Url;

use crate::config::exchange::{ExchangeConfig, ServiceConfig, ValueSource};
use crate::config::settings::SettingsConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

pub fn validate_service_config(cfg: &ServiceConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    validate_exchange(&cfg.exchange, &mut errors);

    if errors.is_empty() {
        info!("config valid");
        Ok(())
    } else {
        error!("configuration validation errors ({}):", errors.len());
        for e in &errors {
            error!(" - {}", e);
        }
        bail!(
            "config is not valid, total errors:{}, \n{}",
            errors.len(),
            errors.join("\n")
        )
    }
}

/// SETTINGS VALIDATION
fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if settings.http.timeout_ms == 0 {
        errors.push("settings.http.timeout_ms must be > 0".to_string());
    }

    if let Some(logging) = &settings.logging {
        let level = logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' must be one of {:?}",
                logging.level, LOG_LEVELS
            ));
        }
    }
}

/// EXCHANGE VALIDATION
fn validate_exchange(exchange: &ExchangeConfig, errors: &mut Vec<String>) {
    match Url::parse(&exchange.token_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(format!(
            "exchange.token_url scheme '{}' must be http or https",
            url.scheme()
        )),
        Err(e) => errors.push(format!(
            "exchange.token_url '{}' is not a valid URL: {}",
            exchange.token_url, e
        )),
    }

    validate_value_source("exchange.client_id", &exchange.client_id, errors);
    if let Some(secret) = &exchange.client_secret {
        validate_value_source("exchange.client_secret", secret, errors);
    }
    for (key, source) in &exchange.params {
        if key.is_empty() {
            errors.push("exchange.params contains an empty key".to_string());
        }
        validate_value_source(&format!("exchange.params['{}']", key), source, errors);
    }
    for reserved in ["client_id", "client_secret"] {
        if exchange.params.contains_key(reserved) {
            errors.push(format!(
                "exchange.params must not set '{}'; use exchange.{} and auth_style",
                reserved, reserved
            ));
        }
    }
}

fn validate_value_source(ctx: &str, source: &ValueSource, errors: &mut Vec<String>) {
    match source {
        ValueSource::Literal { value } if value.is_empty() && ctx == "exchange.client_id" => {
            errors.push(format!("{}.value must not be empty", ctx));
        }
        ValueSource::FromEnv { from_env } if from_env.trim().is_empty() => {
            errors.push(format!("{}.from_env must name a variable", ctx));
        }
        ValueSource::FromFile { path } if path.trim().is_empty() => {
            errors.push(format!("{}.path must not be empty", ctx));
        }
        _ => {}
    }
}
