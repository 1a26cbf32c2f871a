//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod profile;
pub mod transaction;

pub use profile::{handle_rename_profile, handle_stats, RenameProfileArgs, StatsArgs};
pub use transaction::{
    handle_add_transaction, handle_list_transactions, handle_update_transaction,
    AddTransactionArgs, ListTransactionsArgs, UpdateTransactionArgs,
};
