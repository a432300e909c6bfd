//! Spend-card session replay CLI
//!
//! Replays a scripted dashboard session from a CSV file and prints the final
//! card states as CSV.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- scenario.csv > cards.csv
//! cargo run -- --account 0xabc scenario.csv > cards.csv
//! cargo run -- --latency realistic --repayment-policy uncapped scenario.csv
//! RUST_LOG=info cargo run -- scenario.csv
//! ```
//!
//! Logs go to stderr (`RUST_LOG`, default `warn`) so stdout stays CSV.
//!
//! # Exit Codes
//!
//! - 0: Success, including scenarios with rejected commands
//! - 1: Error (file not found, unreadable input, output failure)

use spend_card_engine::cli;
use spend_card_engine::replay::ScenarioReplay;
use std::process;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let args = cli::parse_args();
    let replay = ScenarioReplay::new(args.to_replay_config(), args.to_session_config());

    let mut output = std::io::stdout();
    if let Err(e) = replay.process(&args.input_file, &mut output) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
