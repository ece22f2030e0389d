use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CheckTally {
    pub passes: u64,
    pub fails: u64,
}

impl CheckTally {
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.passes.saturating_add(self.fails)
    }
}

/// Read-only statistics derived from a [`super::MetricSink`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    pub iterations: u64,
    pub error_count: u64,
    pub error_rate: f64,
    pub avg_response_time_ms: f64,
    pub p95_response_time_ms: f64,
    pub min_response_time_ms: f64,
    pub max_response_time_ms: f64,
    pub checks: BTreeMap<String, CheckTally>,
}
