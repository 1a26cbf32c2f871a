//! Profile service
//!
//! Orchestrates the validator and the repositories: load-or-create, loading a
//! profile together with its transactions and their tags, and multi-step
//! transaction writes. Every transaction write (row plus tags) runs as one
//! unit of work.

use tracing::{debug, info, warn};

use crate::error::{ErrorKind, FinanceError, FinanceResult};
use crate::models::{Profile, ProfileId, Transaction, TransactionId};
use crate::storage::Storage;
use crate::validate::{validate_profile, validate_transaction};

/// Service for profile and transaction management
pub struct ProfileService<'a> {
    storage: &'a Storage,
}

/// Partial update of a transaction.
///
/// An empty label, a zero amount or an empty tag list leave the stored
/// value untouched.
#[derive(Debug, Clone, Default)]
pub struct TransactionPatch {
    pub label: String,
    pub amount: i64,
    pub tags: Vec<String>,
}

impl TransactionPatch {
    fn apply(self, transaction: &mut Transaction) {
        if !self.label.is_empty() {
            transaction.label = self.label;
        }
        if self.amount != 0 {
            transaction.amount = self.amount;
        }
        if !self.tags.is_empty() {
            transaction.tags = self.tags;
        }
    }
}

/// Aggregates over a profile's transactions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileStats {
    /// End balance
    pub sum: i64,
    /// Total of positive amounts
    pub incoming: i64,
    /// Total of negative amounts
    pub outgoing: i64,
    pub count: usize,
}

impl<'a> ProfileService<'a> {
    /// Create a new profile service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Load a profile by ID, with all its transactions
    pub fn load_profile_by_id(&self, id: &ProfileId) -> FinanceResult<Profile> {
        let profile = self.storage.profiles.load_by_id(id)?;
        self.attach_transactions(profile)
    }

    /// Load a profile by name, with all its transactions
    pub fn load_profile_by_name(&self, name: &str) -> FinanceResult<Profile> {
        let profile = self.storage.profiles.load_by_name(name)?;
        self.attach_transactions(profile)
    }

    /// Load a profile by ID or, failing that, by name
    pub fn load_profile(&self, id_or_name: &str) -> FinanceResult<Profile> {
        match self.load_profile_by_id(&ProfileId::from(id_or_name)) {
            Err(e) if e.is_not_found() => self.load_profile_by_name(id_or_name),
            other => other,
        }
    }

    fn attach_transactions(&self, profile: Profile) -> FinanceResult<Profile> {
        let repo = &self.storage.transactions;
        let mut transactions = repo.load_all_for_profile(&profile.id)?;

        if !repo.tags_embedded() {
            for transaction in &mut transactions {
                transaction.tags = repo.load_tags(&transaction.id)?;
            }
        }

        debug!(
            profile = %profile.name,
            count = transactions.len(),
            "loaded transactions"
        );
        profile.transactions.add(transactions);
        Ok(profile)
    }

    /// Load the named profile, creating an empty one if it does not exist
    pub fn load_or_create_profile(&self, name: &str) -> FinanceResult<Profile> {
        match self.load_profile_by_name(name) {
            Ok(profile) => Ok(profile),
            Err(e) if e.kind() == ErrorKind::UnknownProfile => {
                match self.create_profile(Profile::new(name)) {
                    Ok(profile) => Ok(profile),
                    Err(e) if e.kind() == ErrorKind::DuplicateProfile => {
                        // Lost a race with a concurrent creator
                        warn!(profile = name, "profile created concurrently, reloading");
                        self.load_profile_by_name(name)
                    }
                    Err(e) => Err(e),
                }
            }
            Err(e) => Err(e.context("could not load profile: ")),
        }
    }

    /// Create a profile. Transactions attached to it are not persisted.
    pub fn create_profile(&self, mut profile: Profile) -> FinanceResult<Profile> {
        if profile.id.is_empty() {
            profile.id = ProfileId::generate();
        }
        validate_profile(&profile)?;
        self.storage.profiles.create(&profile)?;
        info!(profile = %profile.name, id = %profile.id, "created profile");
        Ok(profile)
    }

    /// Update a profile's own fields. Transactions are not affected.
    pub fn update_profile(&self, profile: &Profile) -> FinanceResult<()> {
        validate_profile(profile)?;
        self.storage.profiles.update(profile)?;
        info!(profile = %profile.name, id = %profile.id, "updated profile");
        Ok(())
    }

    /// Give the named profile a new name
    pub fn rename_profile(&self, name: &str, new_name: &str) -> FinanceResult<Profile> {
        let mut profile = self.load_profile_by_name(name)?;
        profile.name = new_name.to_string();
        self.update_profile(&profile)?;
        Ok(profile)
    }

    /// Load a single transaction with its tags
    pub fn load_transaction(&self, id: &TransactionId) -> FinanceResult<Transaction> {
        let repo = &self.storage.transactions;
        let mut transaction = repo.load_by_id(id)?;
        if !repo.tags_embedded() {
            transaction.tags = repo.load_tags(id)?;
        }
        Ok(transaction)
    }

    /// Create a transaction for the profile named by `transaction.profile_id`.
    ///
    /// Assigns an ID if absent. The row and its tags are written together or
    /// not at all.
    pub fn create_transaction(&self, mut transaction: Transaction) -> FinanceResult<Transaction> {
        if transaction.id.is_empty() {
            transaction.id = TransactionId::generate();
        }
        validate_transaction(&transaction)?;

        self.storage.transactions.atomically(&mut |repo| {
            repo.create(&transaction)?;
            repo.add_tags(&transaction.id, &transaction.tags)
        })?;

        info!(
            id = %transaction.id,
            profile_id = %transaction.profile_id,
            amount = transaction.amount,
            "created transaction"
        );
        Ok(transaction)
    }

    /// Create a transaction owned by `profile` and append it to the
    /// profile's loaded collection
    pub fn add_transaction(
        &self,
        profile: &Profile,
        transaction: Transaction,
    ) -> FinanceResult<Transaction> {
        let created = self.create_transaction(transaction.for_profile(profile.id.clone()))?;
        profile.transactions.push(created.clone());
        Ok(created)
    }

    /// Replace a stored transaction's row and tag set
    pub fn update_transaction(&self, transaction: &Transaction) -> FinanceResult<()> {
        validate_transaction(transaction)?;

        self.storage.transactions.atomically(&mut |repo| {
            repo.update(transaction)?;
            repo.clear_tags(&transaction.id)?;
            repo.add_tags(&transaction.id, &transaction.tags)
        })?;

        info!(id = %transaction.id, "updated transaction");
        Ok(())
    }

    /// Patch a transaction that must belong to the named profile
    pub fn update_transaction_for_profile(
        &self,
        profile_name: &str,
        id: &TransactionId,
        patch: TransactionPatch,
    ) -> FinanceResult<Transaction> {
        let profile = self.storage.profiles.load_by_name(profile_name)?;
        let mut transaction = self.load_transaction(id)?;
        if transaction.profile_id != profile.id {
            return Err(FinanceError::UnknownTransaction(format!(
                "transaction {} does not belong to profile {}",
                id, profile.name
            )));
        }

        patch.apply(&mut transaction);
        self.update_transaction(&transaction)?;
        Ok(transaction)
    }

    /// Balance and totals of a loaded profile
    pub fn stats(&self, profile: &Profile) -> ProfileStats {
        let transactions = &profile.transactions;
        ProfileStats {
            sum: transactions.sum(),
            incoming: transactions.subset(Transaction::is_inflow).sum(),
            outgoing: transactions.subset(Transaction::is_outflow).sum(),
            count: transactions.len(),
        }
    }
}
