use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::RunConfig;
use crate::error::AppResult;
use crate::export::{push_exposition, render_exposition};
use crate::metrics::{CheckTally, MetricSink, RunStats};
use crate::runner::RunSummary;

use super::setup::ProbeOutcome;
use super::thresholds::{ThresholdVerdict, evaluate_thresholds};

/// The three statistics exported to the metrics gateway.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportMetrics {
    pub error_rate: f64,
    pub avg_response_time: f64,
    pub p95_response_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub timestamp: String,
    pub base_url: String,
    pub test_type: &'static str,
    pub metrics: ReportMetrics,
    pub iterations: u64,
    pub peak_vus: usize,
    pub duration_ms: u64,
    pub interrupted: bool,
    pub checks: BTreeMap<String, CheckTally>,
    pub thresholds: Vec<ThresholdVerdict>,
    pub setup: ProbeOutcome,
    pub passed: bool,
}

impl RunReport {
    #[must_use]
    pub fn build(
        config: &RunConfig,
        stats: RunStats,
        summary: &RunSummary,
        setup: ProbeOutcome,
    ) -> Self {
        let thresholds = evaluate_thresholds(&config.profile.thresholds, &stats);
        let passed = thresholds.iter().all(|verdict| verdict.passed);
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            base_url: config.base_url.clone(),
            test_type: config.profile.kind.test_type(),
            metrics: ReportMetrics {
                error_rate: stats.error_rate,
                avg_response_time: stats.avg_response_time_ms,
                p95_response_time: stats.p95_response_time_ms,
            },
            iterations: stats.iterations,
            peak_vus: summary.peak_vus,
            duration_ms: u64::try_from(summary.elapsed.as_millis()).unwrap_or(u64::MAX),
            interrupted: summary.interrupted,
            checks: stats.checks,
            thresholds,
            setup,
            passed,
        }
    }

    /// Names of the thresholds that failed, comma separated.
    #[must_use]
    pub fn failed_thresholds(&self) -> String {
        self.thresholds
            .iter()
            .filter(|verdict| !verdict.passed)
            .map(|verdict| format!("{} {}", verdict.metric, verdict.condition))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Reads the final statistics, prints the report as JSON on stdout and, when
/// a gateway is configured, pushes the exposition. Export failures are
/// logged and never fail the run.
///
/// # Errors
///
/// Returns an error only if the report cannot be serialized.
pub async fn teardown(
    config: &RunConfig,
    client: &Client,
    sink: &MetricSink,
    summary: &RunSummary,
    setup: ProbeOutcome,
) -> AppResult<RunReport> {
    let stats = sink.snapshot();
    let exposition = render_exposition(&stats, config.profile.kind.test_type());
    let report = RunReport::build(config, stats, summary, setup);

    println!("{}", serde_json::to_string_pretty(&report)?);
    info!(
        "{} finished: {} iterations, error rate {:.4}, avg {:.1}ms, p95 {:.1}ms, peak {} VUs",
        report.test_type,
        report.iterations,
        report.metrics.error_rate,
        report.metrics.avg_response_time,
        report.metrics.p95_response_time,
        report.peak_vus
    );

    if let Some(target) = config.export.as_ref() {
        let pushed = match exposition {
            Ok(body) => push_exposition(client, &target.gateway_url, &target.job_name, body).await,
            Err(err) => Err(err),
        };
        match pushed {
            Ok(()) => info!(
                "Exported metrics to {} as job '{}'",
                target.gateway_url, target.job_name
            ),
            Err(err) => warn!("Metrics export failed: {}", err),
        }
    }

    Ok(report)
}
