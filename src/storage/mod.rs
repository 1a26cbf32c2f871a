//! Storage layer for the finance planner
//!
//! Two interchangeable backends implement the repository contract: a
//! relational one (SQLite) and a flat-file one (JSON documents). The backend
//! is chosen once at startup and handed to the service as a [`Storage`].

pub mod file_io;
pub mod json;
pub mod repository;
pub mod sqlite;

pub use file_io::{read_json, write_json_atomic};
pub use json::JsonStorage;
pub use repository::{ProfileRepository, TransactionRepository, Work};
pub use sqlite::SqliteStorage;

use std::sync::Arc;

use tracing::info;

use crate::config::{BackendKind, FinancePaths};
use crate::error::FinanceResult;

/// Shared handle to a profile repository
pub type SharedProfileRepository = Arc<dyn ProfileRepository + Send + Sync>;

/// Shared handle to a transaction repository
pub type SharedTransactionRepository = Arc<dyn TransactionRepository + Send + Sync>;

/// The pair of repositories a service works against
#[derive(Clone)]
pub struct Storage {
    pub profiles: SharedProfileRepository,
    pub transactions: SharedTransactionRepository,
}

impl Storage {
    /// Pair up two repositories
    pub fn new(profiles: SharedProfileRepository, transactions: SharedTransactionRepository) -> Self {
        Self {
            profiles,
            transactions,
        }
    }

    /// Open the configured backend inside the storage directory
    pub fn open(paths: &FinancePaths, backend: BackendKind) -> FinanceResult<Self> {
        paths.ensure_directories()?;
        info!(backend = %backend, dir = %paths.base_dir().display(), "opening storage");
        match backend {
            BackendKind::Sqlite => Ok(Self::sqlite(SqliteStorage::open(paths.database_file())?)),
            BackendKind::Json => Ok(Self::json(JsonStorage::open(paths.profiles_dir())?)),
        }
    }

    /// Both repositories served by one SQLite database
    pub fn sqlite(storage: SqliteStorage) -> Self {
        let storage = Arc::new(storage);
        Self::new(storage.clone(), storage)
    }

    /// Both repositories served by one document directory
    pub fn json(storage: JsonStorage) -> Self {
        let storage = Arc::new(storage);
        Self::new(storage.clone(), storage)
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("tags_embedded", &self.transactions.tags_embedded())
            .finish()
    }
}
