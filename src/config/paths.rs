//! Path resolution for the ledger's data directory.
//!
//! 1. `EXPENSE_LEDGER_DATA_DIR` environment variable (if set)
//! 2. The platform data directory from `directories`
//!    (`~/.local/share/expense-ledger` on Linux)

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::error::LedgerError;

pub const DATA_DIR_ENV: &str = "EXPENSE_LEDGER_DATA_DIR";

#[derive(Debug, Clone)]
pub struct LedgerPaths {
    base_dir: PathBuf,
}

impl LedgerPaths {
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined and no override is set.
    pub fn new() -> Result<Self, LedgerError> {
        Self::resolve(std::env::var_os(DATA_DIR_ENV))
    }

    /// `override_dir` wins over the platform default
    fn resolve(override_dir: Option<OsString>) -> Result<Self, LedgerError> {
        let base_dir = match override_dir {
            Some(custom) => PathBuf::from(custom),
            None => ProjectDirs::from("", "", "expense-ledger")
                .map(|dirs| dirs.data_dir().to_path_buf())
                .ok_or_else(|| {
                    LedgerError::Config("could not determine a data directory".into())
                })?,
        };

        Ok(Self { base_dir })
    }

    /// Useful for testing
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    pub fn log_file(&self) -> PathBuf {
        self.base_dir.join("expense-ledger.log")
    }

    /// Relative database names resolve against the base directory
    pub fn database_file(&self, name: &str) -> PathBuf {
        let path = Path::new(name);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn ensure_directories(&self) -> Result<(), LedgerError> {
        std::fs::create_dir_all(&self.base_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_custom_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.base_dir(), temp_dir.path());
        assert_eq!(paths.settings_file(), temp_dir.path().join("config.json"));
        assert_eq!(
            paths.database_file("expenses.db"),
            temp_dir.path().join("expenses.db")
        );
    }

    #[test]
    fn test_absolute_database_path_kept() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let absolute = temp_dir.path().join("elsewhere").join("ledger.db");

        assert_eq!(paths.database_file(absolute.to_str().unwrap()), absolute);
    }

    #[test]
    fn test_override_dir_wins() {
        let temp_dir = TempDir::new().unwrap();

        let paths = LedgerPaths::resolve(Some(temp_dir.path().into())).unwrap();
        assert_eq!(paths.base_dir(), temp_dir.path());
    }

    #[test]
    fn test_platform_default_without_override() {
        // No home directory in some sandboxes; only check the shape when one exists
        if let Ok(paths) = LedgerPaths::resolve(None) {
            assert!(paths.base_dir().to_string_lossy().contains("expense-ledger"));
        }
    }

    #[test]
    fn test_ensure_directories() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().join("nested").join("ledger"));

        paths.ensure_directories().unwrap();
        assert!(paths.base_dir().exists());
    }
}
