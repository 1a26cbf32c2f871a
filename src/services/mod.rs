//! Service layer for the finance planner
//!
//! Business logic sits between adapters and storage. Adapters call only the
//! services; services call only the validator and the repositories.

pub mod profile;

pub use profile::{ProfileService, ProfileStats, TransactionPatch};
