use clap::Parser;

use super::defaults::{DEFAULT_BASE_URL, DEFAULT_JOB_NAME};
use super::types::ProfileKind;

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Async load tester for ML inference APIs - ramped virtual users, response-shape checks, p95/error-rate thresholds, and Pushgateway export."
)]
pub struct LoadArgs {
    /// Base URL of the inference service under test
    #[arg(long = "base-url", short = 'u', env = "BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Prometheus Pushgateway URL; when set, run metrics are pushed at teardown
    #[arg(long = "pushgateway-url", env = "PROMETHEUS_PUSHGATEWAY_URL")]
    pub pushgateway_url: Option<String>,

    /// Job name used in the Pushgateway path
    #[arg(long = "job-name", env = "INFERLOAD_JOB_NAME", default_value = DEFAULT_JOB_NAME)]
    pub job_name: String,

    /// Workload profile (stages and thresholds)
    #[arg(long, value_enum, default_value_t = ProfileKind::Load, ignore_case = true)]
    pub profile: ProfileKind,

    /// Path to config file (TOML/JSON) overriding stages, thresholds and pacing
    #[arg(long, short = 'c')]
    pub config: Option<String>,

    /// Enable verbose logging (sets log level to debug unless overridden by INFERLOAD_LOG/RUST_LOG)
    #[arg(long, short = 'v')]
    pub verbose: bool,
}
