//! Boundary contract for the request-handling layer
//!
//! `AccountsService` is what a front end (the CLI here, an HTTP layer
//! elsewhere) talks to. It wires the account store and the transfer
//! coordinator together and exposes the three boundary operations:
//!
//! - `create_account(Account)` → `()` or `CreateAccountError`
//! - `get_account(id)` → `Option<Account>`
//! - `transfer_amount(from, to, amount)` → `()` or `TransferError`
//!
//! Errors are returned unchanged; their `Display` is the message to show.

use crate::core::{AccountStore, NotificationQueue, TransferConfig, TransferCoordinator};
use crate::types::{
    Account, AccountId, Command, CommandError, CreateAccountError, TransferError,
};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Facade over the account store and the transfer coordinator
///
/// Cloning is cheap and every clone shares the same store.
#[derive(Debug, Clone)]
pub struct AccountsService {
    store: Arc<AccountStore>,
    coordinator: TransferCoordinator,
}

impl AccountsService {
    /// Create a service over a fresh, empty store
    pub fn new(notifications: NotificationQueue, config: TransferConfig) -> Self {
        Self::with_store(Arc::new(AccountStore::new()), notifications, config)
    }

    /// Create a service over an existing store
    pub fn with_store(
        store: Arc<AccountStore>,
        notifications: NotificationQueue,
        config: TransferConfig,
    ) -> Self {
        let coordinator = TransferCoordinator::with_config(Arc::clone(&store), notifications, config);
        Self { store, coordinator }
    }

    pub fn create_account(&self, account: Account) -> Result<(), CreateAccountError> {
        let id = account.id.clone();
        self.store.create(account)?;
        info!(account = %id, "Account created");
        Ok(())
    }

    pub fn get_account(&self, id: &str) -> Option<Account> {
        self.store.get(id)
    }

    pub fn transfer_amount(
        &self,
        from_id: &str,
        to_id: &str,
        amount: Decimal,
    ) -> Result<(), TransferError> {
        self.coordinator.transfer(from_id, to_id, amount)
    }

    /// Apply one command read by the request-handling layer
    pub fn apply(&self, command: Command) -> Result<(), CommandError> {
        match command {
            Command::Create(account) => self.create_account(account)?,
            Command::Transfer(request) => self.coordinator.execute(request)?,
        }
        Ok(())
    }

    /// Snapshot of all accounts, sorted by identifier
    pub fn accounts(&self) -> BTreeMap<AccountId, Account> {
        self.store.accounts()
    }

    /// Remove every account
    pub fn clear(&self) {
        self.store.clear();
    }
}
