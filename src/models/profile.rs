//! Profile model
//!
//! A named owner of a set of transactions.

use std::fmt;
use std::sync::Arc;

use super::collection::TransactionCollection;
use super::ids::ProfileId;

/// A single profile, for which transactions can be recorded
#[derive(Debug, Clone, Default)]
pub struct Profile {
    /// Unique identifier, immutable once assigned
    pub id: ProfileId,

    /// Unique human lookup key
    pub name: String,

    /// Transactions loaded alongside the profile
    pub transactions: Arc<TransactionCollection>,
}

impl Profile {
    /// Create a new, unassigned profile with no transactions
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Same identity (ID and name) as `other`
    pub fn same_identity(&self, other: &Profile) -> bool {
        self.id == other.id && self.name == other.name
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
