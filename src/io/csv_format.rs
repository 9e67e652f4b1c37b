//! CSV format handling for command records and account output
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord structure for deserialization
//! - Conversion from CSV records to commands
//! - Account output serialization
//!
//! Input columns are `command,account,to,amount`:
//!
//! ```text
//! command,account,to,amount
//! create,123,,10000
//! transfer,123,124,5000
//! ```
//!
//! All functions are pure (no I/O) for easy testing.

use crate::types::{Account, Command, TransferRequest};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// CSV record structure for deserialization
///
/// `to` is only meaningful for transfers. `amount` is the opening balance for
/// `create` (optional, zero when absent) and the transferred amount for
/// `transfer` (required).
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvRecord {
    pub command: String,
    pub account: String,
    pub to: Option<String>,
    pub amount: Option<String>,
}

fn non_empty(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.trim().is_empty())
}

fn parse_amount(amount: &str, account: &str) -> Result<Decimal, String> {
    Decimal::from_str(amount.trim())
        .map_err(|_| format!("Invalid amount '{}' for account {}", amount, account))
}

/// Convert a CsvRecord to a Command
///
/// # Returns
///
/// * `Ok(Command)` - Successfully converted record
/// * `Err(String)` - Unknown command, missing field or unparsable amount
pub fn convert_csv_record(csv_record: CsvRecord) -> Result<Command, String> {
    let account = csv_record.account.trim().to_string();
    if account.is_empty() {
        return Err(format!(
            "{} command requires an account id",
            csv_record.command
        ));
    }

    let amount = non_empty(csv_record.amount);

    match csv_record.command.to_lowercase().as_str() {
        "create" => {
            let balance = match amount {
                Some(amount) => parse_amount(&amount, &account)?,
                None => Decimal::ZERO,
            };
            Ok(Command::Create(Account::with_balance(account, balance)))
        }
        "transfer" => {
            let to = non_empty(csv_record.to)
                .ok_or_else(|| format!("transfer from {} requires a destination", account))?;
            let amount = amount
                .ok_or_else(|| format!("transfer from {} requires an amount", account))?;
            let amount = parse_amount(&amount, &account)?;
            Ok(Command::Transfer(TransferRequest::new(
                account,
                to.trim(),
                amount,
            )))
        }
        _ => Err(format!(
            "Invalid command '{}' for account {}",
            csv_record.command, account
        )),
    }
}

/// Write account states to CSV format
///
/// Writes accounts in CSV format with columns: account, balance.
/// Accounts are sorted by identifier for deterministic output, and balances
/// are written without trailing zeros.
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_accounts_csv(accounts: &[Account], output: &mut dyn Write) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["account", "balance"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted_accounts = accounts.to_vec();
    sorted_accounts.sort_by(|a, b| a.id.cmp(&b.id));

    for account in sorted_accounts {
        writer
            .write_record(&[
                account.id.to_string(),
                account.balance.normalize().to_string(),
            ])
            .map_err(|e| format!("Failed to write account record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}
