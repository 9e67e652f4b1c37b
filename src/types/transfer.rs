//! Transfer request type
//!
//! A transfer request only lives for the duration of one coordinator call;
//! it is never stored.

use super::account::AccountId;
use rust_decimal::Decimal;

/// Which side of a transfer an account is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountSide {
    /// The account being debited
    From,
    /// The account being credited
    To,
}

/// A request to move `amount` from one account to another
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Source account, debited on commit
    pub from: AccountId,

    /// Destination account, credited on commit
    pub to: AccountId,

    /// Amount to move; must not be negative
    pub amount: Decimal,
}

impl TransferRequest {
    pub fn new(from: impl Into<AccountId>, to: impl Into<AccountId>, amount: Decimal) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            amount,
        }
    }

    /// Whether source and destination are the same account
    pub fn is_self_transfer(&self) -> bool {
        self.from == self.to
    }
}
