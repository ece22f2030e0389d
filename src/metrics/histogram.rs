use std::time::Duration;

use hdrhistogram::Histogram;

use crate::error::{AppError, AppResult, MetricsError};

/// Significant decimal digits kept by the latency histogram.
const SIGNIFICANT_DIGITS: u8 = 3;
/// One hour in microseconds; longer latencies are clamped to it.
const MAX_TRACKABLE_US: u64 = 3_600_000_000;

/// Latency distribution in microseconds.
#[derive(Debug, Clone)]
pub struct LatencyHistogram {
    hist: Histogram<u64>,
}

impl LatencyHistogram {
    /// Create a latency histogram covering 1us up to one hour.
    ///
    /// # Errors
    ///
    /// Returns an error if the histogram cannot be created.
    pub fn new() -> AppResult<Self> {
        let hist = Histogram::<u64>::new_with_bounds(1, MAX_TRACKABLE_US, SIGNIFICANT_DIGITS)
            .map_err(|err| {
                AppError::metrics(MetricsError::Histogram {
                    context: "create",
                    source: Box::new(err),
                })
            })?;
        Ok(Self { hist })
    }

    /// Record one latency, clamped to the trackable range.
    pub fn record(&mut self, latency: Duration) {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX).max(1);
        self.hist.saturating_record(micros);
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.hist.len()
    }

    /// Latency at `quantile` (0.0..=1.0) in microseconds; 0 when empty.
    #[must_use]
    pub fn value_at_quantile_us(&self, quantile: f64) -> u64 {
        if self.count() == 0 {
            return 0;
        }
        self.hist.value_at_quantile(quantile)
    }
}
