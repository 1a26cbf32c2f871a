//! Field-level validation
//!
//! Runs before every repository write; the service never persists data that
//! fails these checks.

use crate::error::{FinanceError, FinanceResult};
use crate::models::{Profile, Transaction};

/// Validate the given profile
pub fn validate_profile(profile: &Profile) -> FinanceResult<()> {
    if profile.id.is_empty() {
        return Err(FinanceError::InvalidProfileId("missing profile id".into()));
    }
    if profile.name.is_empty() {
        return Err(FinanceError::InvalidName("missing profile name".into()));
    }
    Ok(())
}

/// Validate the given transaction
pub fn validate_transaction(transaction: &Transaction) -> FinanceResult<()> {
    if transaction.id.is_empty() {
        return Err(FinanceError::InvalidTransactionId(
            "missing transaction id".into(),
        ));
    }
    if transaction.label.is_empty() {
        return Err(FinanceError::InvalidLabel("missing transaction label".into()));
    }
    if transaction.amount == 0 {
        return Err(FinanceError::InvalidAmount(
            "transaction amount must not be 0".into(),
        ));
    }
    validate_tags(&transaction.tags)
}

/// Every tag must be non-empty; duplicates are allowed
pub fn validate_tags(tags: &[String]) -> FinanceResult<()> {
    match tags.iter().position(|t| t.is_empty()) {
        Some(index) => Err(FinanceError::invalid_tag(index)),
        None => Ok(()),
    }
}
