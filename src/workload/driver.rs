use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use crate::metrics::{IterationSample, MetricSink};

use super::catalog::{EndpointCatalog, EndpointKind};
use super::checks::{CheckResult, evaluate_checks};
use super::choices::ChoiceSource;
use super::dispatch::{Dispatcher, FailureKind};
use super::request::{HttpMethod, build_request};

const DEFAULT_PACING_MIN: Duration = Duration::from_secs(1);
const DEFAULT_PACING_MAX: Duration = Duration::from_secs(3);

/// Think time between iterations, drawn uniformly from `[min, max]` at
/// millisecond resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    min: Duration,
    max: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            min: DEFAULT_PACING_MIN,
            max: DEFAULT_PACING_MAX,
        }
    }
}

impl Pacing {
    /// Returns `None` when `min > max`.
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Option<Self> {
        (min <= max).then_some(Self { min, max })
    }

    /// No think time at all.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    #[must_use]
    pub const fn min(&self) -> Duration {
        self.min
    }

    #[must_use]
    pub const fn max(&self) -> Duration {
        self.max
    }

    pub fn draw<C>(&self, choices: &mut C) -> Duration
    where
        C: ChoiceSource + ?Sized,
    {
        let span_ms = u64::try_from(self.max.saturating_sub(self.min).as_millis())
            .unwrap_or(u64::MAX);
        let offset_ms = choices.pick(span_ms.saturating_add(1));
        self.min.saturating_add(Duration::from_millis(offset_ms))
    }
}

/// What one iteration did, for logging and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationReport {
    pub endpoint: String,
    pub method: HttpMethod,
    pub status: u16,
    pub latency: Duration,
    pub error: bool,
    pub failure: Option<FailureKind>,
    pub checks: Vec<CheckResult>,
}

impl IterationReport {
    #[must_use]
    pub fn check(&self, name: &str) -> Option<bool> {
        self.checks
            .iter()
            .find(|check| check.name == name)
            .map(|check| check.passed)
    }

    #[must_use]
    pub fn failed_checks(&self) -> Vec<&'static str> {
        self.checks
            .iter()
            .filter(|check| !check.passed)
            .map(|check| check.name)
            .collect()
    }
}

/// Runs simulated-user iterations against one target, recording into a
/// shared [`MetricSink`]. Stateless between calls apart from the sink.
pub struct WorkloadDriver<D> {
    base_url: String,
    catalog: EndpointCatalog,
    dispatcher: D,
    sink: Arc<MetricSink>,
    pacing: Pacing,
}

impl<D: Dispatcher> WorkloadDriver<D> {
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        catalog: EndpointCatalog,
        dispatcher: D,
        sink: Arc<MetricSink>,
        pacing: Pacing,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            catalog,
            dispatcher,
            sink,
            pacing,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub const fn sink(&self) -> &Arc<MetricSink> {
        &self.sink
    }

    #[must_use]
    pub const fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    #[must_use]
    pub const fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// Selects, builds, sends, records and checks one request. Records exactly
    /// one error sample and one latency sample whatever the outcome.
    pub async fn execute_iteration<C>(&self, choices: &mut C) -> IterationReport
    where
        C: ChoiceSource + ?Sized,
    {
        let endpoint = self.catalog.choose(choices).to_owned();
        let kind = EndpointKind::of(&endpoint);
        let request = build_request(&self.base_url, &endpoint, choices);
        let method = request.method;

        let outcome = self.dispatcher.dispatch(&request).await;
        if let Some(failure) = outcome.failure {
            debug!(
                "{} {} failed after {:?}: {:?}",
                method.as_str(),
                request.url,
                outcome.latency,
                failure
            );
        }

        let checks = evaluate_checks(kind, &outcome);
        let error = outcome.is_error();
        self.sink.record(&IterationSample {
            error,
            latency: outcome.latency,
            checks: &checks,
        });

        let report = IterationReport {
            endpoint,
            method,
            status: outcome.status,
            latency: outcome.latency,
            error,
            failure: outcome.failure,
            checks,
        };
        let failed = report.failed_checks();
        if !failed.is_empty() {
            debug!(
                "{} {} (status {}) failed checks: {}",
                method.as_str(),
                report.endpoint,
                report.status,
                failed.join(", ")
            );
        }
        report
    }

    /// One full iteration: [`Self::execute_iteration`] followed by the pacing
    /// sleep.
    pub async fn run_iteration<C>(&self, choices: &mut C) -> IterationReport
    where
        C: ChoiceSource + ?Sized,
    {
        let report = self.execute_iteration(choices).await;
        sleep(self.pacing.draw(choices)).await;
        report
    }
}
