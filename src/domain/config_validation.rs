//! Configuration validation.
//!
//! Every key is optional; a key that is present must hold a usable value.

use crate::domain::error::TradeflowError;
use crate::domain::pair::resolve_pair;
use crate::domain::sizing::parse_decimal;
use crate::ports::config_port::ConfigPort;

pub const STORE_BACKENDS: [&str; 3] = ["file", "sqlite", "memory"];

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), TradeflowError> {
    validate_store(config)?;
    validate_balance(config)?;
    validate_sizing(config)?;
    validate_calendar(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> TradeflowError {
    TradeflowError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_store(config: &dyn ConfigPort) -> Result<(), TradeflowError> {
    if let Some(backend) = config.get_string("store", "backend") {
        let backend = backend.trim().to_lowercase();
        if !STORE_BACKENDS.contains(&backend.as_str()) {
            return Err(invalid(
                "store",
                "backend",
                format!("unknown backend '{}', expected one of file, sqlite, memory", backend),
            ));
        }
    }
    if let Some(path) = config.get_string("store", "path") {
        if path.trim().is_empty() {
            return Err(invalid("store", "path", "path must not be empty"));
        }
    }
    Ok(())
}

/// A present numeric key must parse and lie in `(0, max]`.
fn validate_positive(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    max: Option<f64>,
) -> Result<(), TradeflowError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(());
    };
    let value = parse_decimal(&raw)
        .ok_or_else(|| invalid(section, key, format!("{} must be a number", key)))?;
    if value <= 0.0 {
        return Err(invalid(section, key, format!("{} must be positive", key)));
    }
    if let Some(max) = max {
        if value > max {
            return Err(invalid(section, key, format!("{} must be at most {}", key, max)));
        }
    }
    Ok(())
}

fn validate_balance(config: &dyn ConfigPort) -> Result<(), TradeflowError> {
    validate_positive(config, "account", "balance", None)
}

fn validate_sizing(config: &dyn ConfigPort) -> Result<(), TradeflowError> {
    if let Some(pair) = config.get_string("sizing", "default_pair") {
        if resolve_pair(&pair).is_none() {
            return Err(invalid("sizing", "default_pair", format!("unknown pair '{}'", pair)));
        }
    }
    validate_positive(config, "sizing", "default_risk_pct", Some(100.0))?;
    validate_positive(config, "sizing", "high_risk_pct", Some(100.0))?;
    Ok(())
}

fn validate_calendar(config: &dyn ConfigPort) -> Result<(), TradeflowError> {
    if let Some(url) = config.get_string("calendar", "base_url") {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(invalid(
                "calendar",
                "base_url",
                "base_url must start with http:// or https://",
            ));
        }
    }
    Ok(())
}
