//! Transaction display formatting
//!
//! Tables for terminal output. Amounts are integer minor units and are shown
//! with two decimal places, without a currency symbol.

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::{Profile, Transaction, TransactionCollection};
use crate::services::ProfileStats;

#[derive(Tabled)]
struct TransactionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Tags")]
    tags: String,
}

impl TransactionRow {
    fn from_transaction(txn: &Transaction) -> Self {
        Self {
            id: txn.id.to_string(),
            label: txn.label.clone(),
            amount: format_magnitude(txn.amount),
            tags: txn.tags.join(", "),
        }
    }
}

/// Format minor units as a decimal amount, e.g. `-80000` as `-800.00`
pub fn format_amount(minor_units: i64) -> String {
    let sign = if minor_units < 0 { "-" } else { "" };
    format!("{}{}", sign, format_magnitude(minor_units))
}

/// Format the absolute value of minor units, e.g. `-80000` as `800.00`
fn format_magnitude(minor_units: i64) -> String {
    let abs = minor_units.unsigned_abs();
    format!("{}.{:02}", abs / 100, abs % 100)
}

/// Render a titled table of transactions with a total row.
///
/// Amounts are shown unsigned; the title says which direction they go.
pub fn format_transaction_table(title: &str, transactions: &TransactionCollection) -> String {
    let mut rows: Vec<TransactionRow> = transactions
        .all()
        .iter()
        .map(|t| TransactionRow::from_transaction(t))
        .collect();
    rows.push(TransactionRow {
        id: String::new(),
        label: "Total".to_string(),
        amount: format_magnitude(transactions.sum()),
        tags: String::new(),
    });

    let mut table = Table::new(rows);
    table.with(Style::modern());
    format!("{}:\n{}\n", title, table)
}

/// Incoming and outgoing tables for a profile, then its end balance
pub fn format_profile_transactions(profile: &Profile) -> String {
    let incoming = profile.transactions.subset(Transaction::is_inflow);
    let outgoing = profile.transactions.subset(Transaction::is_outflow);

    let mut output = format!("Profile: {}\n", profile.name);
    output.push_str(&format_transaction_table("Incoming Transactions", &incoming));
    output.push_str(&format_transaction_table("Outgoing Transactions", &outgoing));
    output.push_str(&format!(
        "End balance: {}\n",
        format_amount(profile.transactions.sum())
    ));
    output
}

/// Format transaction details for display
pub fn format_transaction_details(txn: &Transaction) -> String {
    let mut output = String::new();
    output.push_str(&format!("Transaction: {}\n", txn.id));
    output.push_str(&format!("Profile:     {}\n", txn.profile_id));
    output.push_str(&format!("Label:       {}\n", txn.label));
    output.push_str(&format!("Amount:      {}\n", format_amount(txn.amount)));
    if !txn.tags.is_empty() {
        output.push_str(&format!("Tags:        {}\n", txn.tags.join(", ")));
    }
    output
}

pub fn format_stats(profile: &Profile, stats: &ProfileStats) -> String {
    format!(
        "Profile:      {}\nTransactions: {}\nIncoming:     {}\nOutgoing:     {}\nEnd balance:  {}\n",
        profile.name,
        stats.count,
        format_amount(stats.incoming),
        format_amount(stats.outgoing),
        format_amount(stats.sum)
    )
}
