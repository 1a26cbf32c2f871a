//! Display formatting for terminal output

pub mod transaction;

pub use transaction::{
    format_amount, format_profile_transactions, format_stats, format_transaction_details,
    format_transaction_table,
};
