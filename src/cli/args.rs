use crate::core::{LatencyConfig, RepaymentPolicy, SessionConfig};
use crate::replay::ReplayConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Replay a scripted spend-card session and print the final cards
#[derive(Parser, Debug)]
#[command(name = "spend-card")]
#[command(about = "Replay a scripted spend-card session and print the final cards", long_about = None)]
pub struct CliArgs {
    /// Scenario CSV file path
    #[arg(value_name = "SCENARIO", help = "Path to the scenario CSV file")]
    pub input_file: PathBuf,

    /// Simulated network latency
    #[arg(
        long = "latency",
        value_name = "PROFILE",
        default_value = "instant",
        help = "Latency profile: 'instant' for no delay or 'realistic' for dashboard timings"
    )]
    pub latency: LatencyProfile,

    /// What happens to repayments larger than the outstanding amount
    #[arg(
        long = "repayment-policy",
        value_name = "POLICY",
        default_value = "reject-excess",
        help = "Repayment policy: 'reject-excess', 'clamp-to-limit' or 'uncapped'"
    )]
    pub repayment_policy: RepaymentPolicy,

    /// Accept any positive deposit regardless of tier range
    #[arg(long = "ignore-tier-bounds", help = "Do not enforce tier deposit ranges")]
    pub ignore_tier_bounds: bool,

    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of scenario rows read per batch (default: 100)"
    )]
    pub batch_size: Option<usize>,

    #[arg(
        long = "worker-threads",
        value_name = "COUNT",
        help = "Number of runtime worker threads (default: CPU cores)"
    )]
    pub worker_threads: Option<usize>,

    /// Wallet connected before the first scenario row
    #[arg(long = "account", value_name = "ADDRESS", help = "Start with this wallet connected")]
    pub account: Option<String>,
}

/// Latency profiles selectable from the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LatencyProfile {
    Instant,
    Realistic,
}

impl LatencyProfile {
    pub fn to_latency_config(self) -> LatencyConfig {
        match self {
            LatencyProfile::Instant => LatencyConfig::instant(),
            LatencyProfile::Realistic => LatencyConfig::default(),
        }
    }
}

impl CliArgs {
    pub fn to_session_config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_latency(self.latency.to_latency_config())
            .with_repayment_policy(self.repayment_policy)
            .with_tier_bounds(!self.ignore_tier_bounds)
    }

    /// Create a ReplayConfig from CLI arguments, falling back to defaults
    pub fn to_replay_config(&self) -> ReplayConfig {
        let config = if self.batch_size.is_some() || self.worker_threads.is_some() {
            let default = ReplayConfig::default();
            ReplayConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.worker_threads.unwrap_or(default.worker_threads),
            )
        } else {
            ReplayConfig::default()
        };
        config.with_account(self.account.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::default_latency(&["program", "input.csv"], LatencyProfile::Instant)]
    #[case::realistic(&["program", "--latency", "realistic", "input.csv"], LatencyProfile::Realistic)]
    fn test_latency_parsing(#[case] args: &[&str], #[case] expected: LatencyProfile) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.latency, expected);
    }

    #[rstest]
    #[case::default_policy(&["program", "input.csv"], RepaymentPolicy::RejectExcess)]
    #[case::clamp(&["program", "--repayment-policy", "clamp-to-limit", "input.csv"], RepaymentPolicy::ClampToLimit)]
    #[case::uncapped(&["program", "--repayment-policy", "uncapped", "input.csv"], RepaymentPolicy::Uncapped)]
    fn test_repayment_policy_parsing(#[case] args: &[&str], #[case] expected: RepaymentPolicy) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.to_session_config().repayment_policy, expected);
    }

    #[test]
    fn test_session_config_conversion() {
        let parsed =
            CliArgs::try_parse_from(["program", "--latency", "realistic", "--ignore-tier-bounds", "in.csv"])
                .unwrap();
        let config = parsed.to_session_config();
        assert_eq!(config.latency, LatencyConfig::default());
        assert!(!config.enforce_tier_bounds);

        let parsed = CliArgs::try_parse_from(["program", "in.csv"]).unwrap();
        let config = parsed.to_session_config();
        assert_eq!(config.latency, LatencyConfig::instant());
        assert!(config.enforce_tier_bounds);
    }

    #[rstest]
    #[case::all_defaults(&["program", "input.csv"], 100, num_cpus::get())]
    #[case::custom_batch_size(&["program", "--batch-size", "20", "input.csv"], 20, num_cpus::get())]
    #[case::custom_workers(&["program", "--worker-threads", "3", "input.csv"], 100, 3)]
    #[case::zero_batch_size(&["program", "--batch-size", "0", "input.csv"], 100, num_cpus::get())]
    #[case::zero_workers(&["program", "--worker-threads", "0", "input.csv"], 100, num_cpus::get())]
    fn test_replay_config_conversion(
        #[case] args: &[&str],
        #[case] expected_batch_size: usize,
        #[case] expected_workers: usize,
    ) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        let config = parsed.to_replay_config();

        assert_eq!(config.batch_size, expected_batch_size);
        assert_eq!(config.worker_threads, expected_workers);
    }

    #[test]
    fn test_account_flag() {
        let parsed = CliArgs::try_parse_from(["program", "--account", "0xabc", "input.csv"]).unwrap();
        assert_eq!(parsed.to_replay_config().account.as_deref(), Some("0xabc"));
    }

    #[rstest]
    #[case::missing_input(&["program"])]
    #[case::invalid_latency(&["program", "--latency", "slow", "input.csv"])]
    #[case::invalid_policy(&["program", "--repayment-policy", "forgive", "input.csv"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        assert!(CliArgs::try_parse_from(args).is_err());
    }
}
