//! Transfer precondition checks
//!
//! `validate` is a pure function over a transfer request and the balances of
//! its two accounts (`None` when an account does not exist). The coordinator
//! calls it twice: once optimistically before taking any lock, and once more
//! with both locks held. Only the second outcome decides whether the transfer
//! commits.

use crate::types::{TransferError, TransferRequest};
use rust_decimal::Decimal;

/// Check that a transfer may proceed
///
/// Conditions are checked in a fixed order so that a request violating several
/// of them always reports the same error:
///
/// 1. `NegativeAmount` if the amount is below zero
/// 2. `AccountNotFound` (source) if `from_balance` is `None`
/// 3. `AccountNotFound` (destination) if `to_balance` is `None`
/// 4. `InsufficientBalance` if the amount is strictly greater than the source balance
///
/// An amount equal to the source balance is accepted and drains the account.
pub fn validate(
    request: &TransferRequest,
    from_balance: Option<Decimal>,
    to_balance: Option<Decimal>,
) -> Result<(), TransferError> {
    if request.amount < Decimal::ZERO {
        return Err(TransferError::NegativeAmount);
    }

    let from_balance =
        from_balance.ok_or_else(|| TransferError::source_not_found(&request.from))?;

    if to_balance.is_none() {
        return Err(TransferError::destination_not_found(&request.to));
    }

    if request.amount > from_balance {
        return Err(TransferError::InsufficientBalance);
    }

    Ok(())
}
