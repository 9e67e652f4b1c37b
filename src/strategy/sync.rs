//! Synchronous processing strategy
//!
//! Replays commands one at a time, in file order, on the calling thread.
//!
//! # Design
//!
//! The SyncProcessingStrategy focuses on orchestration, delegating:
//! - CSV parsing to `SyncReader` (iterator interface)
//! - Account creation and transfers to `AccountsService`
//! - CSV output to `csv_format::write_accounts_csv` (format handling)
//!
//! Records are streamed, so memory use is O(accounts), not O(commands).

use crate::io::csv_format::write_accounts_csv;
use crate::io::sync_reader::SyncReader;
use crate::service::AccountsService;
use crate::strategy::ProcessingStrategy;
use crate::types::Account;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Synchronous processing strategy
///
/// # Examples
///
/// ```no_run
/// use account_transfers::core::{NotificationQueue, TransferConfig};
/// use account_transfers::service::AccountsService;
/// use account_transfers::strategy::{ProcessingStrategy, SyncProcessingStrategy};
/// use std::path::Path;
/// use std::io;
///
/// let (queue, _rx) = NotificationQueue::unbounded();
/// let strategy = SyncProcessingStrategy::new(AccountsService::new(queue, TransferConfig::default()));
/// let mut output = io::stdout();
///
/// strategy.process(Path::new("commands.csv"), &mut output)
///     .expect("Processing failed");
/// ```
#[derive(Debug, Clone)]
pub struct SyncProcessingStrategy {
    service: AccountsService,
}

impl SyncProcessingStrategy {
    pub fn new(service: AccountsService) -> Self {
        Self { service }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    /// Process commands from input file and write results to output
    ///
    /// 1. Creates a SyncReader to stream command records from the CSV file
    /// 2. Applies each command through the accounts service, in order
    /// 3. Writes the final account states using csv_format::write_accounts_csv
    ///
    /// Fatal errors (file not found, I/O errors) are returned immediately.
    /// Rejected commands are logged with their message and processing continues.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let reader = SyncReader::new(input_path)?;

        let mut applied = 0usize;
        let mut rejected = 0usize;

        for result in reader {
            match result {
                Ok(command) => match self.service.apply(command) {
                    Ok(()) => applied += 1,
                    Err(e) => {
                        rejected += 1;
                        warn!(error = %e, "Command rejected");
                    }
                },
                Err(e) => {
                    rejected += 1;
                    warn!(error = %e, "Skipping malformed record");
                }
            }
        }

        info!(applied, rejected, "Processing complete");

        let accounts: Vec<Account> = self.service.accounts().into_values().collect();
        write_accounts_csv(&accounts, output)?;

        Ok(())
    }
}
