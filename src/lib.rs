//! Account Transfers Library
//! # Overview
//!
//! An in-memory account store with a deadlock-free transfer coordinator.
//! Transfers between two accounts lock both of them in a canonical order, so
//! concurrent transfers in opposite directions can never wait on each other
//! in a cycle, while transfers on disjoint pairs run fully in parallel.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (Account, TransferRequest, errors)
//! - [`core`] - Transfer core:
//!   - [`core::account_store`] - Account map with one lock per account
//!   - [`core::validator`] - Pure precondition checks for a transfer
//!   - [`core::coordinator`] - Canonical-order double locking and commit
//!   - [`core::notifier`] - Fire-and-forget notification dispatch
//! - [`service`] - Boundary contract used by front ends
//! - [`io`] - CSV command input and account output
//! - [`strategy`] - Sync and async command replay
//! - [`cli`] - CLI arguments parsing
//!
//! # Transfer Rules
//!
//! A transfer is rejected, with no side effects, when:
//!
//! - the amount is negative
//! - the source or destination account does not exist
//! - the amount is greater than the source balance
//!
//! On success both balances change together and each account holder is
//! notified once, after the locks are released.

pub mod cli;
pub mod core;
pub mod io;
pub mod service;
pub mod strategy;
pub mod types;

pub use core::{AccountStore, TransferConfig, TransferCoordinator};
pub use io::write_accounts_csv;
pub use service::AccountsService;
pub use types::{
    Account, AccountId, Command, CreateAccountError, DuplicateAccountError, TransferError,
    TransferRequest,
};
