//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account identifier and account snapshot
//! - `transfer`: Transfer requests
//! - `command`: Commands accepted by the request-handling layer
//! - `error`: Error types for account creation, transfers and notifications

pub mod account;
pub mod command;
pub mod error;
pub mod transfer;

pub use account::{Account, AccountId};
pub use command::Command;
pub use error::{
    CommandError, CreateAccountError, DuplicateAccountError, NotificationError,
    TransferError,
};
pub use transfer::{AccountSide, TransferRequest};
