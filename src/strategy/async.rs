//! Asynchronous batch processing strategy
//!
//! Reads commands in batches and runs the transfers of each batch
//! concurrently on a tokio multi-threaded runtime.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncReader (batch CSV reading)
//!     └── AccountsService (shared store + transfer coordinator)
//! ```
//!
//! # Ordering
//!
//! Batches are processed one after another. Inside a batch, a `create`
//! command acts as a barrier: every transfer read before it finishes before
//! the account is created, and every transfer read after it starts only once
//! it exists. Consecutive transfers between two barriers run in parallel, so
//! their relative order is not preserved. Transfers block on account locks,
//! so each one runs on the blocking pool via `spawn_blocking`.

use crate::io::async_reader::AsyncReader;
use crate::io::csv_format::write_accounts_csv;
use crate::service::AccountsService;
use crate::strategy::ProcessingStrategy;
use crate::types::{Account, Command, TransferRequest};
use std::io::Write;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Configuration for batch processing
///
/// Controls how commands are batched and the number of worker threads
/// used to run transfers in parallel.
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Number of commands per batch
    pub batch_size: usize,
    /// Maximum number of transfers running concurrently
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig with custom values
    ///
    /// Zero values fall back to the defaults.
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                batch_size,
                default = default.batch_size,
                "Invalid batch_size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                max_concurrent_batches,
                default = default.max_concurrent_batches,
                "Invalid max_concurrent_batches, using default"
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Counts of applied and rejected commands
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct BatchOutcome {
    applied: usize,
    rejected: usize,
}

impl BatchOutcome {
    fn record<E: std::fmt::Display>(&mut self, result: Result<(), E>, what: &str) {
        match result {
            Ok(()) => self.applied += 1,
            Err(e) => {
                self.rejected += 1;
                warn!(error = %e, "{} rejected", what);
            }
        }
    }

    fn merge(&mut self, other: BatchOutcome) {
        self.applied += other.applied;
        self.rejected += other.rejected;
    }
}

/// Asynchronous batch processing strategy
///
/// # Configuration
///
/// The strategy accepts a BatchConfig with:
/// - `batch_size`: Number of commands per batch (default: 1000)
/// - `max_concurrent_batches`: Number of worker and blocking threads (default: CPU cores)
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
    service: AccountsService,
}

impl AsyncProcessingStrategy {
    pub fn new(config: BatchConfig, service: AccountsService) -> Self {
        Self { config, service }
    }

    /// Run a group of transfers concurrently and wait for all of them
    async fn run_transfers(&self, transfers: Vec<TransferRequest>) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        if transfers.is_empty() {
            return outcome;
        }

        debug!(count = transfers.len(), "Running transfer group");

        let mut tasks = Vec::with_capacity(transfers.len());
        for request in transfers {
            let service = self.service.clone();
            tasks.push(tokio::task::spawn_blocking(move || {
                service.transfer_amount(request.from.as_str(), request.to.as_str(), request.amount)
            }));
        }

        for task in tasks {
            match task.await {
                Ok(result) => outcome.record(result, "Transfer"),
                Err(e) => {
                    outcome.rejected += 1;
                    error!(error = %e, "Transfer task panicked");
                }
            }
        }

        outcome
    }

    /// Apply one batch, treating each create as a barrier
    async fn process_batch(&self, batch: Vec<Command>) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        let mut pending = Vec::new();

        for command in batch {
            match command {
                Command::Transfer(request) => pending.push(request),
                Command::Create(account) => {
                    outcome.merge(self.run_transfers(std::mem::take(&mut pending)).await);
                    outcome.record(self.service.create_account(account), "Account creation");
                }
            }
        }

        outcome.merge(self.run_transfers(pending).await);
        outcome
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    /// Process commands from input file and write results to output
    ///
    /// 1. Creates a tokio multi-threaded runtime sized by the batch config
    /// 2. Reads commands in batches from CSV using AsyncReader
    /// 3. Processes each batch to completion before reading the next one
    /// 4. Writes the final account states using the csv_format module
    ///
    /// Fatal errors (file not found, runtime errors) are returned immediately.
    /// Rejected commands are logged and processing continues.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .max_blocking_threads(self.config.max_concurrent_batches)
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        runtime.block_on(async {
            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| format!("Failed to open file '{}': {}", input_path.display(), e))?;

            // csv-async reads through the futures I/O traits
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            let mut outcome = BatchOutcome::default();
            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                outcome.merge(self.process_batch(batch).await);
            }

            info!(
                applied = outcome.applied,
                rejected = outcome.rejected,
                "Processing complete"
            );

            let accounts: Vec<Account> = self.service.accounts().into_values().collect();
            write_accounts_csv(&accounts, output)?;

            Ok(())
        })
    }
}
