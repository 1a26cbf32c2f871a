//! Transaction model
//!
//! A labeled, tagged, signed monetary movement belonging to one profile.
//! Amounts are integer minor units (e.g. cents).

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{ProfileId, TransactionId};

/// A single transaction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier, assigned by the service before persistence
    pub id: TransactionId,

    /// The profile this transaction belongs to
    pub profile_id: ProfileId,

    pub label: String,

    /// Amount in minor units (positive for inflow, negative for outflow)
    pub amount: i64,

    /// Tags this transaction can be grouped by, in insertion order
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Transaction {
    /// Create a new, unassigned transaction
    pub fn new(label: impl Into<String>, amount: i64) -> Self {
        Self {
            label: label.into(),
            amount,
            ..Self::default()
        }
    }

    /// Returns a copy with the given label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Returns a copy with the given amount
    pub fn with_amount(mut self, amount: i64) -> Self {
        self.amount = amount;
        self
    }

    /// Returns a copy with the given tags appended
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Returns a copy owned by the given profile
    pub fn for_profile(mut self, profile_id: ProfileId) -> Self {
        self.profile_id = profile_id;
        self
    }

    /// Check if this is an inflow (positive amount)
    pub fn is_inflow(&self) -> bool {
        self.amount > 0
    }

    /// Check if this is an outflow (negative amount)
    pub fn is_outflow(&self) -> bool {
        self.amount < 0
    }

}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.label, self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let txn = Transaction::new("Salary", 250000).with_tags(["income", "monthly"]);
        assert_eq!(txn.label, "Salary");
        assert_eq!(txn.amount, 250000);
        assert_eq!(txn.tags, vec!["income", "monthly"]);
        assert!(txn.id.is_empty());
        assert!(txn.is_inflow());
        assert!(!txn.is_outflow());
    }

    #[test]
    fn test_with_tags_appends() {
        let txn = Transaction::new("Rent", -80000)
            .with_tags(["a"])
            .with_tags(vec!["b".to_string()]);
        assert_eq!(txn.tags, vec!["a", "b"]);
    }

    #[test]
    fn test_missing_tags_deserialize_empty() {
        let txn: Transaction =
            serde_json::from_str(r#"{"id":"t","profile_id":"p","label":"x","amount":5}"#).unwrap();
        assert!(txn.tags.is_empty());
    }
}
