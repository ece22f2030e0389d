use serde::Serialize;

use crate::config::Thresholds;
use crate::metrics::RunStats;

/// One pass/fail threshold evaluated over every recorded sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdVerdict {
    pub metric: &'static str,
    pub condition: String,
    pub observed: f64,
    pub passed: bool,
}

/// Both limits are strict: `p95 < p95_ms` and `error_rate < error_rate`.
#[must_use]
pub fn evaluate_thresholds(thresholds: &Thresholds, stats: &RunStats) -> Vec<ThresholdVerdict> {
    let p95_limit = thresholds.p95_ms as f64;
    vec![
        ThresholdVerdict {
            metric: "response_time",
            condition: format!("p(95)<{}", thresholds.p95_ms),
            observed: stats.p95_response_time_ms,
            passed: stats.p95_response_time_ms < p95_limit,
        },
        ThresholdVerdict {
            metric: "errors",
            condition: format!("rate<{}", thresholds.error_rate),
            observed: stats.error_rate,
            passed: stats.error_rate < thresholds.error_rate,
        },
    ]
}
