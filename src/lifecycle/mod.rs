//! Once-per-run phases around the stage runner: setup probe, threshold
//! verdicts and the teardown report.
mod setup;
mod teardown;
mod thresholds;

#[cfg(test)]
mod tests;

pub use setup::{ProbeOutcome, health_url, probe_or_shutdown, probe_target};
pub use teardown::{ReportMetrics, RunReport, teardown};
pub use thresholds::{ThresholdVerdict, evaluate_thresholds};
