//! Commands accepted by the request-handling layer
//!
//! Each command maps to one boundary operation of `AccountsService`.

use super::account::Account;
use super::transfer::TransferRequest;

/// A single request read from the command input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a new account with its opening balance
    Create(Account),

    /// Transfer between two existing accounts
    Transfer(TransferRequest),
}
