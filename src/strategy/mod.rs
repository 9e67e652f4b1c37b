//! Processing strategy module for command replay
//!
//! This module defines the Strategy pattern for complete command processing pipelines,
//! encompassing both CSV parsing and applying commands to the accounts service. This
//! allows different processing implementations (synchronous, asynchronous batch) to be
//! selected at runtime.

use crate::cli::StrategyType;
use crate::service::AccountsService;
use std::io::Write;
use std::path::Path;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Processing strategy trait for complete command processing pipelines
///
/// Each strategy reads commands from a CSV file, applies them through the
/// accounts service it was built with, and writes the final account states to
/// output.
pub trait ProcessingStrategy: Send + Sync {
    /// Process commands from input file and write results to output
    ///
    /// # Arguments
    ///
    /// * `input_path` - Path to the input CSV file containing command records
    /// * `output` - Mutable reference to a writer for outputting account states
    ///
    /// # Returns
    ///
    /// * `Ok(())` if all processing completed (possibly with rejected commands)
    /// * `Err(String)` if a fatal error occurred (file not found, I/O error, etc.)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input file cannot be opened (file not found, permission denied)
    /// - The async runtime cannot be started
    /// - Output cannot be written
    ///
    /// Malformed rows and rejected commands are logged and do not cause this
    /// method to return an error. Processing continues with the next command.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String>;
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of processing strategy to create (Sync or Async)
/// * `config` - Optional configuration for async batch processing (ignored for sync)
/// * `service` - The accounts service every command is applied to
///
/// # Returns
///
/// A boxed trait object implementing the ProcessingStrategy trait
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
    service: AccountsService,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(service)),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(config, service))
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::{NotificationQueue, TransferConfig};
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper function to create a temporary CSV file for testing
    pub(crate) fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    /// A service whose notifications go nowhere
    pub(crate) fn test_service() -> AccountsService {
        let (queue, _rx) = NotificationQueue::unbounded();
        AccountsService::new(queue, TransferConfig::default())
    }

    #[test]
    fn test_create_strategy_produces_equal_output_for_both_types() {
        let file = create_temp_csv(
            "command,account,to,amount\n\
             create,123,,10000\n\
             create,124,,5000\n\
             transfer,123,124,5000\n",
        );

        let mut outputs = Vec::new();
        for strategy_type in [StrategyType::Sync, StrategyType::Async] {
            let strategy = create_strategy(strategy_type, None, test_service());
            let mut output = Vec::new();
            strategy.process(file.path(), &mut output).unwrap();
            outputs.push(String::from_utf8(output).unwrap());
        }

        assert_eq!(outputs[0], "account,balance\n123,5000\n124,10000\n");
        assert_eq!(outputs[0], outputs[1]);
    }
}
