//! Resolved runtime settings.

use std::path::PathBuf;

use super::config_validation::validate_config;
use super::error::TradeflowError;
use super::pair::{ForexPair, default_pair, resolve_pair};
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_STORE_PATH: &str = "./tradeflow-data";
pub const DEFAULT_RISK_PCT: f64 = 1.0;
pub const DEFAULT_HIGH_RISK_PCT: f64 = 2.0;
pub const DEFAULT_CALENDAR_URL: &str = "https://financialmodelingprep.com/api/v3/economic_calendar";

/// Placeholder key shipped in sample configs; never sent upstream.
const DEMO_API_KEY: &str = "demo";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    File,
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub backend: StoreBackend,
    pub store_path: PathBuf,
    pub account_balance: Option<f64>,
    pub default_pair: &'static ForexPair,
    pub default_risk_pct: f64,
    pub high_risk_pct: f64,
    pub calendar_api_key: Option<String>,
    pub calendar_base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            account_balance: None,
            default_pair: default_pair(),
            default_risk_pct: DEFAULT_RISK_PCT,
            high_risk_pct: DEFAULT_HIGH_RISK_PCT,
            calendar_api_key: None,
            calendar_base_url: DEFAULT_CALENDAR_URL.to_string(),
        }
    }
}

impl Settings {
    /// Validate `config` and resolve every setting, defaulting absent keys.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TradeflowError> {
        validate_config(config)?;
        let defaults = Settings::default();

        let backend = match config
            .get_string("store", "backend")
            .map(|b| b.trim().to_lowercase())
            .as_deref()
        {
            Some("sqlite") => StoreBackend::Sqlite,
            Some("memory") => StoreBackend::Memory,
            _ => StoreBackend::File,
        };

        Ok(Self {
            backend,
            store_path: config
                .get_string("store", "path")
                .map(PathBuf::from)
                .unwrap_or(defaults.store_path),
            account_balance: config
                .has_key("account", "balance")
                .then(|| config.get_double("account", "balance", 0.0)),
            default_pair: config
                .get_string("sizing", "default_pair")
                .and_then(|p| resolve_pair(&p))
                .unwrap_or(defaults.default_pair),
            default_risk_pct: config.get_double("sizing", "default_risk_pct", DEFAULT_RISK_PCT),
            high_risk_pct: config.get_double("sizing", "high_risk_pct", DEFAULT_HIGH_RISK_PCT),
            calendar_api_key: config
                .get_string("calendar", "api_key")
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            calendar_base_url: config
                .get_string("calendar", "base_url")
                .map(|u| u.trim().to_string())
                .unwrap_or(defaults.calendar_base_url),
        })
    }

    /// The API key to use upstream, if live data is enabled.
    pub fn live_calendar_key(&self) -> Option<&str> {
        self.calendar_api_key
            .as_deref()
            .filter(|k| *k != DEMO_API_KEY)
    }
}
