//! User settings, stored as `config.json` in the data directory.

use serde::{Deserialize, Serialize};

use super::paths::LedgerPaths;
use crate::error::LedgerError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// SQLite file name, relative to the data directory unless absolute
    #[serde(default = "default_database_file")]
    pub database_file: String,

    /// Keep the budget across restarts
    #[serde(default = "default_persist_budget")]
    pub persist_budget: bool,

    /// Prefix for displayed amounts; empty keeps output currency-agnostic
    #[serde(default)]
    pub currency_symbol: String,

    /// Widest bar in the text chart, in characters
    #[serde(default = "default_chart_width")]
    pub chart_width: usize,
}

fn default_database_file() -> String {
    "expenses.db".to_string()
}

fn default_persist_budget() -> bool {
    true
}

fn default_chart_width() -> usize {
    40
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_file: default_database_file(),
            persist_budget: default_persist_budget(),
            currency_symbol: String::new(),
            chart_width: default_chart_width(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or write defaults if the file doesn't exist
    pub fn load_or_create(paths: &LedgerPaths) -> Result<Self, LedgerError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)?;
            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                LedgerError::Config(format!(
                    "failed to parse {}: {}",
                    settings_path.display(),
                    e
                ))
            })?;
            Ok(settings)
        } else {
            let settings = Settings::default();
            settings.save(paths)?;
            Ok(settings)
        }
    }

    pub fn save(&self, paths: &LedgerPaths) -> Result<(), LedgerError> {
        paths.ensure_directories()?;
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.settings_file(), contents)?;
        Ok(())
    }

    pub fn format_amount(&self, amount: f64) -> String {
        format!("{}{:.2}", self.currency_symbol, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.database_file, "expenses.db");
        assert!(settings.persist_budget);
        assert_eq!(settings.chart_width, 40);
        assert_eq!(settings.format_amount(12.5), "12.50");
    }

    #[test]
    fn test_load_creates_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());

        let settings = Settings::load_or_create(&paths).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(paths.settings_file().exists());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());

        let settings = Settings {
            persist_budget: false,
            currency_symbol: "€".to_string(),
            ..Settings::default()
        };
        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert!(!loaded.persist_budget);
        assert_eq!(loaded.format_amount(3.0), "€3.00");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), r#"{ "chart_width": 12 }"#).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.chart_width, 12);
        assert_eq!(loaded.database_file, "expenses.db");
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), "not json").unwrap();

        let err = Settings::load_or_create(&paths).unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }
}
