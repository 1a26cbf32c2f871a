//! Path management for the finance planner
//!
//! ## Path Resolution Order
//!
//! 1. `FINANCE_PLANNER_DIR` environment variable (if set)
//! 2. `<home>/finance_planner`

use std::path::PathBuf;

use directories::BaseDirs;

use crate::error::FinanceError;

/// Environment variable overriding the storage directory
pub const DATA_DIR_ENV: &str = "FINANCE_PLANNER_DIR";

/// Manages all paths used by the finance planner
#[derive(Debug, Clone)]
pub struct FinancePaths {
    /// Base directory for all finance planner data
    base_dir: PathBuf,
}

impl FinancePaths {
    /// Create a new FinancePaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, FinanceError> {
        let base_dir = match std::env::var(DATA_DIR_ENV) {
            Ok(custom) if !custom.is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create FinancePaths with a custom base directory
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the SQLite database used by the relational backend
    pub fn database_file(&self) -> PathBuf {
        self.base_dir.join("finance.db")
    }

    /// Get the directory holding the flat-file backend's documents
    pub fn profiles_dir(&self) -> PathBuf {
        self.base_dir.join("profiles")
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<(), FinanceError> {
        std::fs::create_dir_all(&self.base_dir).map_err(|e| {
            FinanceError::Config(format!("Failed to create storage directory: {}", e))
        })?;

        std::fs::create_dir_all(self.profiles_dir()).map_err(|e| {
            FinanceError::Config(format!("Failed to create profiles directory: {}", e))
        })?;

        Ok(())
    }
}

fn resolve_default_path() -> Result<PathBuf, FinanceError> {
    let dirs = BaseDirs::new()
        .ok_or_else(|| FinanceError::Config("Could not determine home directory".into()))?;
    Ok(dirs.home_dir().join("finance_planner"))
}
