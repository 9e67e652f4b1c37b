//! Account Transfers CLI
//!
//! Replays account creations and transfers from a CSV command file.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- commands.csv > accounts.csv
//! cargo run -- --strategy sync commands.csv > accounts.csv
//! cargo run -- --strategy async --batch-size 2000 --max-concurrent 8 commands.csv > accounts.csv
//! cargo run -- --lock-timeout-ms 500 commands.csv > accounts.csv
//! RUST_LOG=account_transfers=debug cargo run -- commands.csv > accounts.csv
//! ```
//!
//! The final account states are written to stdout. Logs, including rejected
//! commands and notifications, go to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, file not readable, etc.)

use account_transfers::cli::{self, CliArgs, StrategyType};
use account_transfers::core::{spawn_dispatcher, LoggingNotifier};
use account_transfers::service::AccountsService;
use account_transfers::strategy;
use std::process;
use std::sync::Arc;
use tracing::{debug, error};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize tracing subscriber
///
/// Logs go to stderr so stdout carries only the CSV output.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "account_transfers=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(args: CliArgs) -> Result<(), String> {
    let (queue, dispatcher) = spawn_dispatcher(Arc::new(LoggingNotifier))
        .map_err(|e| format!("Failed to start notification dispatcher: {}", e))?;

    let service = AccountsService::new(queue, args.to_transfer_config());
    let config = match args.strategy {
        StrategyType::Async => Some(args.to_batch_config()),
        StrategyType::Sync => None,
    };
    let strategy = strategy::create_strategy(args.strategy, config, service);

    let mut output = std::io::stdout();
    let result = strategy.process(&args.input_file, &mut output);

    // The dispatcher stops once the last queue handle is gone
    drop(strategy);
    let stats = dispatcher.join();
    debug!(
        delivered = stats.delivered,
        failed = stats.failed,
        "Notification dispatcher stopped"
    );

    result
}

fn main() {
    init_tracing();

    let args = cli::parse_args();

    if let Err(e) = run(args) {
        error!("Error: {}", e);
        process::exit(1);
    }
}
