//! Repository contract shared by every storage backend
//!
//! The traits carry no `Send + Sync` bound: [`TransactionRepository::atomically`]
//! hands its work a borrowed, transaction-scoped view. Shared handles add the
//! bound (see `storage::Storage`).
//!
//! Backends must produce identical domain objects from identical logical
//! content. "Not found" is always reported as `UnknownProfile` /
//! `UnknownTransaction`, never as a storage failure, so callers can branch
//! on it.

use crate::error::FinanceResult;
use crate::models::{Profile, ProfileId, Transaction, TransactionId};

/// Profile persistence
pub trait ProfileRepository {
    /// Load a profile by id. Transactions are not attached.
    fn load_by_id(&self, id: &ProfileId) -> FinanceResult<Profile>;

    /// Load a profile by its unique name. Transactions are not attached.
    fn load_by_name(&self, name: &str) -> FinanceResult<Profile>;

    /// Insert a new profile. Fails with `DuplicateProfile` if the name is taken.
    fn create(&self, profile: &Profile) -> FinanceResult<()>;

    /// Update the profile row identified by `profile.id`
    fn update(&self, profile: &Profile) -> FinanceResult<()>;
}

/// A unit of work run by [`TransactionRepository::atomically`]
pub type Work<'a> = dyn FnMut(&dyn TransactionRepository) -> FinanceResult<()> + 'a;

/// Transaction persistence, including the tag sub-relation
pub trait TransactionRepository {
    /// Load a transaction with its row fields. Tags are only populated when
    /// [`tags_embedded`](Self::tags_embedded) is true.
    fn load_by_id(&self, id: &TransactionId) -> FinanceResult<Transaction>;

    /// Load every transaction owned by `profile_id` in insertion order
    fn load_all_for_profile(&self, profile_id: &ProfileId) -> FinanceResult<Vec<Transaction>>;

    /// Insert the transaction row. Fails with `UnknownProfile` if the owning
    /// profile does not exist.
    fn create(&self, transaction: &Transaction) -> FinanceResult<()>;

    /// Update the transaction row identified by `transaction.id`
    fn update(&self, transaction: &Transaction) -> FinanceResult<()>;

    /// Tags of a transaction in insertion order
    fn load_tags(&self, id: &TransactionId) -> FinanceResult<Vec<String>>;

    /// Append tags. A tag already present on the transaction is kept once.
    fn add_tags(&self, id: &TransactionId, tags: &[String]) -> FinanceResult<()>;

    /// Remove every tag of a transaction
    fn clear_tags(&self, id: &TransactionId) -> FinanceResult<()>;

    /// Whether loaded transactions already carry their tags
    fn tags_embedded(&self) -> bool {
        false
    }

    /// Run `work` so that either all of its writes land or none do
    fn atomically(&self, work: &mut Work<'_>) -> FinanceResult<()>;
}
