use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::error::AppResult;
use crate::workload::CheckResult;

use super::histogram::LatencyHistogram;
use super::types::{CheckTally, RunStats};

const P95_QUANTILE: f64 = 0.95;
const MICROS_PER_MILLI: f64 = 1000.0;

/// Everything one iteration contributes to the sink.
#[derive(Debug, Clone, Copy)]
pub struct IterationSample<'checks> {
    pub error: bool,
    pub latency: Duration,
    pub checks: &'checks [CheckResult],
}

#[derive(Debug)]
struct SinkState {
    samples: u64,
    errors: u64,
    latency_sum_us: u128,
    latency_min_us: u64,
    latency_max_us: u64,
    histogram: LatencyHistogram,
    checks: BTreeMap<&'static str, CheckTally>,
}

/// Append-only aggregate of error samples, latency samples and check
/// outcomes. Each [`MetricSink::record`] applies a whole sample under one
/// short lock, so concurrent iterations never lose or tear a sample.
#[derive(Debug)]
pub struct MetricSink {
    state: Mutex<SinkState>,
}

impl MetricSink {
    /// # Errors
    ///
    /// Returns an error if the latency histogram cannot be created.
    pub fn new() -> AppResult<Self> {
        Ok(Self {
            state: Mutex::new(SinkState {
                samples: 0,
                errors: 0,
                latency_sum_us: 0,
                latency_min_us: u64::MAX,
                latency_max_us: 0,
                histogram: LatencyHistogram::new()?,
                checks: BTreeMap::new(),
            }),
        })
    }

    pub fn record(&self, sample: &IterationSample<'_>) {
        let latency_us = u64::try_from(sample.latency.as_micros()).unwrap_or(u64::MAX);
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.samples = state.samples.saturating_add(1);
        if sample.error {
            state.errors = state.errors.saturating_add(1);
        }
        state.latency_sum_us = state.latency_sum_us.saturating_add(u128::from(latency_us));
        state.latency_min_us = state.latency_min_us.min(latency_us);
        state.latency_max_us = state.latency_max_us.max(latency_us);
        state.histogram.record(sample.latency);
        for check in sample.checks {
            let tally = state.checks.entry(check.name).or_default();
            if check.passed {
                tally.passes = tally.passes.saturating_add(1);
            } else {
                tally.fails = tally.fails.saturating_add(1);
            }
        }
    }

    /// Number of recorded iterations.
    #[must_use]
    pub fn samples(&self) -> u64 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .samples
    }

    #[must_use]
    #[expect(clippy::float_arithmetic)]
    pub fn snapshot(&self) -> RunStats {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.samples == 0 {
            return RunStats {
                checks: owned_checks(&state.checks),
                ..RunStats::default()
            };
        }

        let samples = state.samples as f64;
        let latency_sum_us = state.latency_sum_us as f64;
        RunStats {
            iterations: state.samples,
            error_count: state.errors,
            error_rate: state.errors as f64 / samples,
            avg_response_time_ms: latency_sum_us / samples / MICROS_PER_MILLI,
            p95_response_time_ms: micros_to_ms(state.histogram.value_at_quantile_us(P95_QUANTILE)),
            min_response_time_ms: micros_to_ms(state.latency_min_us),
            max_response_time_ms: micros_to_ms(state.latency_max_us),
            checks: owned_checks(&state.checks),
        }
    }
}

#[expect(clippy::float_arithmetic)]
fn micros_to_ms(micros: u64) -> f64 {
    micros as f64 / MICROS_PER_MILLI
}

fn owned_checks(checks: &BTreeMap<&'static str, CheckTally>) -> BTreeMap<String, CheckTally> {
    checks
        .iter()
        .map(|(name, tally)| ((*name).to_owned(), *tally))
        .collect()
}
