//! Core data models for the finance planner
//!
//! Pure data plus the concurrency-safe transaction container. No I/O.

pub mod collection;
pub mod ids;
pub mod profile;
pub mod transaction;

pub use collection::{RangeFn, TransactionCollection};
pub use ids::{ProfileId, TransactionId};
pub use profile::Profile;
pub use transaction::Transaction;
