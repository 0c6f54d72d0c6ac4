//! INI file configuration adapter.

use crate::domain::error::TradeflowError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TradeflowError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| TradeflowError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, TradeflowError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| TradeflowError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    /// Built-in defaults only.
    pub fn empty() -> Self {
        Self { config: Ini::new() }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[store]
backend = file
path = /var/lib/tradeflow

[sizing]
default_pair = EURUSD
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("store", "path"),
            Some("/var/lib/tradeflow".to_string())
        );
        assert_eq!(
            adapter.get_string("sizing", "default_pair"),
            Some("EURUSD".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[account]\nbalance = 100\n").unwrap();
        assert_eq!(adapter.get_string("account", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
        assert!(adapter.has_key("account", "balance"));
        assert!(!adapter.has_key("account", "missing"));
    }

    #[test]
    fn get_double_returns_value() {
        let adapter = FileConfigAdapter::from_string("[account]\nbalance = 10000.5\n").unwrap();
        assert_eq!(adapter.get_double("account", "balance", 0.0), 10000.5);
    }

    #[test]
    fn get_double_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[sizing]\n").unwrap();
        assert_eq!(adapter.get_double("sizing", "high_risk_pct", 2.0), 2.0);
    }

    #[test]
    fn get_double_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[sizing]\ndefault_risk_pct = lots\n").unwrap();
        assert_eq!(adapter.get_double("sizing", "default_risk_pct", 1.0), 1.0);
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[calendar]\napi_key = secret\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("calendar", "api_key"),
            Some("secret".to_string())
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(TradeflowError::ConfigParse { .. })));
    }

    #[test]
    fn empty_adapter_has_no_keys() {
        let adapter = FileConfigAdapter::empty();
        assert_eq!(adapter.get_string("store", "backend"), None);
        assert_eq!(adapter.get_double("account", "balance", 1.5), 1.5);
    }
}
