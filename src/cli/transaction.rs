//! Transaction CLI commands
//!
//! Implements the add, update and list commands on top of the profile service.

use clap::Args;

use crate::display::{format_profile_transactions, format_transaction_details};
use crate::error::FinanceResult;
use crate::models::{Transaction, TransactionId};
use crate::services::{ProfileService, TransactionPatch};
use crate::storage::Storage;

/// Arguments for `add-transaction`
#[derive(Args, Debug)]
pub struct AddTransactionArgs {
    /// Profile to interact with (created if missing)
    #[arg(short, long)]
    pub profile: String,
    /// Transaction label
    #[arg(short, long)]
    pub label: String,
    /// Amount in minor units (negative for outflow)
    #[arg(short, long, allow_negative_numbers = true)]
    pub amount: i64,
    /// Tag to group the transaction by (repeatable)
    #[arg(short, long = "tag", value_name = "TAG", alias = "tags")]
    pub tags: Vec<String>,
}

/// Arguments for `update-transaction`
#[derive(Args, Debug)]
pub struct UpdateTransactionArgs {
    /// Profile the transaction belongs to
    #[arg(short, long)]
    pub profile: String,
    /// Transaction ID
    #[arg(long)]
    pub id: String,
    /// New label
    #[arg(short, long)]
    pub label: Option<String>,
    /// New amount in minor units
    #[arg(short, long, allow_negative_numbers = true)]
    pub amount: Option<i64>,
    /// Replacement tag set (repeatable)
    #[arg(short, long = "tag", value_name = "TAG", alias = "tags")]
    pub tags: Vec<String>,
}

/// Arguments for `list-transactions`
#[derive(Args, Debug)]
pub struct ListTransactionsArgs {
    /// Profile to interact with
    #[arg(short, long)]
    pub profile: String,
}

/// Handle `add-transaction`
pub fn handle_add_transaction(storage: &Storage, args: AddTransactionArgs) -> FinanceResult<()> {
    let service = ProfileService::new(storage);
    let profile = service.load_or_create_profile(&args.profile)?;

    let transaction = Transaction::new(args.label, args.amount).with_tags(args.tags);
    let created = service.add_transaction(&profile, transaction)?;

    println!("Added transaction to '{}'", profile.name);
    print!("{}", format_transaction_details(&created));
    Ok(())
}

/// Handle `update-transaction`
pub fn handle_update_transaction(
    storage: &Storage,
    args: UpdateTransactionArgs,
) -> FinanceResult<()> {
    let service = ProfileService::new(storage);
    let patch = TransactionPatch {
        label: args.label.unwrap_or_default(),
        amount: args.amount.unwrap_or_default(),
        tags: args.tags,
    };

    let updated =
        service.update_transaction_for_profile(&args.profile, &TransactionId::from(args.id), patch)?;

    println!("Updated transaction");
    print!("{}", format_transaction_details(&updated));
    Ok(())
}

/// Handle `list-transactions`
pub fn handle_list_transactions(
    storage: &Storage,
    args: ListTransactionsArgs,
) -> FinanceResult<()> {
    let service = ProfileService::new(storage);
    let profile = service.load_profile_by_name(&args.profile)?;
    print!("{}", format_profile_transactions(&profile));
    Ok(())
}
