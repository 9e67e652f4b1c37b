use crate::core::TransferConfig;
use crate::strategy::BatchConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Replay account creations and transfers from a CSV command file
#[derive(Parser, Debug)]
#[command(name = "account-transfers")]
#[command(about = "Replay account creations and transfers from a CSV command file", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing command records
    #[arg(value_name = "INPUT", help = "Path to the input CSV file")]
    pub input_file: PathBuf,

    /// Processing strategy to use for replaying commands
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Processing strategy: 'sync' for sequential or 'async' for concurrent batches"
    )]
    pub strategy: StrategyType,

    /// Number of commands per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of commands per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Maximum number of concurrent transfers (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Maximum number of transfers running concurrently (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    /// Give up on a transfer after waiting this long for an account lock
    #[arg(
        long = "lock-timeout-ms",
        value_name = "MILLIS",
        help = "Lock acquisition timeout per transfer in milliseconds (default: wait forever)"
    )]
    pub lock_timeout_ms: Option<u64>,
}

/// Available processing strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Uses the CLI values if provided and falls back to defaults otherwise.
    /// Zero values are replaced by defaults with a warning.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }

    /// Create a TransferConfig from CLI arguments
    ///
    /// A zero timeout means no timeout.
    pub fn to_transfer_config(&self) -> TransferConfig {
        match self.lock_timeout_ms {
            Some(millis) if millis > 0 => {
                TransferConfig::with_lock_timeout(Duration::from_millis(millis))
            }
            _ => TransferConfig::default(),
        }
    }
}
