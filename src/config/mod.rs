//! Configuration module for the finance planner
//!
//! - Storage directory resolution
//! - Persisted settings (backend selection, log level)

pub mod paths;
pub mod settings;

pub use paths::FinancePaths;
pub use settings::{BackendKind, Settings};
