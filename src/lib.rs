//! Finance planner - profile-based transaction tracking
//!
//! Profiles own labeled, tagged monetary transactions. The core guarantees a
//! profile's transactions stay valid and queryable whichever storage backend
//! is active.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Storage directory and persisted settings
//! - `error`: Error taxonomy
//! - `models`: Profiles, transactions and the transaction collection
//! - `validate`: Field-level validation
//! - `storage`: Repository contract with SQLite and JSON backends
//! - `services`: Business logic layer
//! - `display`: Terminal tables
//! - `cli`: Command handlers
//! - `logging`: Diagnostic subscriber set-up
//!
//! # Example
//!
//! ```rust,ignore
//! use finance_planner::config::{FinancePaths, Settings};
//! use finance_planner::services::ProfileService;
//! use finance_planner::storage::Storage;
//!
//! let paths = FinancePaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Storage::open(&paths, settings.backend)?;
//! let profile = ProfileService::new(&storage).load_or_create_profile("alice")?;
//! ```

pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;
pub mod validate;

pub use error::{ErrorKind, FinanceError, FinanceResult};
