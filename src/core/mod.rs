//! Core business logic module
//!
//! This module contains the transfer core:
//! - `account_store` - Thread-safe account storage with a lock per account
//! - `validator` - Pure transfer precondition checks
//! - `coordinator` - Deadlock-free transfer orchestration
//! - `notifier` - Fire-and-forget notification dispatch
//! - `traits` - The `Notifier` collaborator trait

pub mod account_store;
pub mod coordinator;
pub mod notifier;
pub mod traits;
pub mod validator;

pub use account_store::AccountStore;
pub use coordinator::{lock_order, TransferConfig, TransferCoordinator};
pub use notifier::{
    spawn_dispatcher, DispatchStats, Dispatcher, LoggingNotifier, Notification, NotificationQueue,
};
pub use traits::Notifier;
pub use validator::validate;
