use std::future::Future;
use std::net::TcpListener;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::*;
use crate::args::ProfileKind;
use crate::config::{ExportTarget, RunConfig, Thresholds, WorkloadProfile};
use crate::error::{AppError, AppResult};
use crate::metrics::{IterationSample, MetricSink, RunStats};
use crate::runner::RunSummary;
use crate::shutdown::shutdown_channel;
use crate::workload::{
    CHECK_STATUS_OK, CheckResult, Dispatcher, FailureKind, Pacing, RequestSpec, ResponseOutcome,
};

struct FixedDispatcher {
    outcome: ResponseOutcome,
}

#[async_trait]
impl Dispatcher for FixedDispatcher {
    async fn dispatch(&self, _request: &RequestSpec) -> ResponseOutcome {
        self.outcome.clone()
    }
}

struct StalledDispatcher;

#[async_trait]
impl Dispatcher for StalledDispatcher {
    async fn dispatch(&self, _request: &RequestSpec) -> ResponseOutcome {
        tokio::time::sleep(Duration::from_secs(30)).await;
        ResponseOutcome::failed(FailureKind::Timeout, Duration::from_secs(30))
    }
}

fn run_async_test<F>(future: F) -> AppResult<()>
where
    F: Future<Output = AppResult<()>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(future)
}

fn stats_with(p95_ms: f64, error_rate: f64) -> RunStats {
    RunStats {
        iterations: 100,
        p95_response_time_ms: p95_ms,
        error_rate,
        ..RunStats::default()
    }
}

fn load_config(export: Option<ExportTarget>) -> RunConfig {
    RunConfig {
        base_url: "http://inference.test".to_owned(),
        profile: WorkloadProfile::builtin(ProfileKind::Load),
        pacing: Pacing::none(),
        graceful_stop: Duration::from_secs(1),
        export,
    }
}

fn summary() -> RunSummary {
    RunSummary {
        elapsed: Duration::from_millis(1500),
        peak_vus: 4,
        iterations: 2,
        interrupted: false,
    }
}

fn healthy_probe() -> ProbeOutcome {
    ProbeOutcome {
        url: "http://inference.test/api/v1/health".to_owned(),
        status: 200,
        healthy: true,
        latency_ms: 3,
        failure: None,
    }
}

#[test]
fn thresholds_are_strict_upper_bounds() -> AppResult<()> {
    let limits = Thresholds {
        p95_ms: 2000,
        error_rate: 0.1,
    };
    let cases = [
        (stats_with(1999.0, 0.05), [true, true]),
        (stats_with(2000.0, 0.05), [false, true]),
        (stats_with(150.0, 0.1), [true, false]),
        (RunStats::default(), [true, true]),
    ];
    for (stats, expected) in cases {
        let verdicts = evaluate_thresholds(&limits, &stats);
        let passed: Vec<bool> = verdicts.iter().map(|verdict| verdict.passed).collect();
        if passed != expected {
            return Err(AppError::from(format!(
                "Unexpected verdicts for {:?}: {:?}",
                stats, verdicts
            )));
        }
    }
    let verdicts = evaluate_thresholds(&limits, &RunStats::default());
    let conditions: Vec<&str> = verdicts
        .iter()
        .map(|verdict| verdict.condition.as_str())
        .collect();
    if conditions != ["p(95)<2000", "rate<0.1"] {
        return Err(AppError::from(format!("Unexpected conditions: {:?}", conditions)));
    }
    Ok(())
}

#[test]
fn report_carries_stats_and_verdicts() -> AppResult<()> {
    let config = load_config(None);
    let report = RunReport::build(
        &config,
        stats_with(2500.0, 0.02),
        &summary(),
        healthy_probe(),
    );

    if report.passed || report.test_type != "load_test" || report.peak_vus != 4 {
        return Err(AppError::from(format!("Unexpected report: {:?}", report)));
    }
    if report.failed_thresholds() != "response_time p(95)<2000" {
        return Err(AppError::from(format!(
            "Unexpected failures: {}",
            report.failed_thresholds()
        )));
    }

    let json = serde_json::to_value(&report)?;
    for key in ["timestamp", "base_url", "test_type", "metrics", "checks", "thresholds", "setup"] {
        if json.get(key).is_none() {
            return Err(AppError::from(format!("Report JSON lacks '{}': {}", key, json)));
        }
    }
    let p95 = json
        .get("metrics")
        .and_then(|metrics| metrics.get("p95_response_time"))
        .and_then(serde_json::Value::as_f64);
    if p95 != Some(2500.0) {
        return Err(AppError::from(format!("Unexpected metrics: {}", json)));
    }
    let timestamp = json
        .get("timestamp")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default();
    if chrono::DateTime::parse_from_rfc3339(timestamp).is_err() {
        return Err(AppError::from(format!("Timestamp not RFC 3339: {}", timestamp)));
    }
    Ok(())
}

#[test]
fn stress_profile_reports_stress_test_type() -> AppResult<()> {
    let mut config = load_config(None);
    config.profile = WorkloadProfile::builtin(ProfileKind::Stress);
    let report = RunReport::build(&config, stats_with(4000.0, 0.15), &summary(), healthy_probe());
    if report.test_type != "stress_test" || !report.passed {
        return Err(AppError::from(format!("Unexpected report: {:?}", report)));
    }
    Ok(())
}

#[test]
fn probe_warns_but_reports_non_200() -> AppResult<()> {
    run_async_test(async {
        let dispatcher = FixedDispatcher {
            outcome: ResponseOutcome::received(
                503,
                Duration::from_millis(4),
                r#"{"status":"starting"}"#.to_owned(),
            ),
        };
        let probe = probe_target(&dispatcher, "http://inference.test/").await;
        if probe.healthy || probe.status != 503 || probe.failure.is_some() {
            return Err(AppError::from(format!("Unexpected probe: {:?}", probe)));
        }
        if probe.url != "http://inference.test/api/v1/health" {
            return Err(AppError::from(format!("Unexpected probe url: {}", probe.url)));
        }
        Ok(())
    })
}

#[test]
fn probe_records_transport_failures() -> AppResult<()> {
    run_async_test(async {
        let dispatcher = FixedDispatcher {
            outcome: ResponseOutcome::failed(FailureKind::Timeout, Duration::from_secs(30)),
        };
        let probe = probe_target(&dispatcher, "http://inference.test").await;
        if probe.healthy || probe.status != 0 || probe.failure.as_deref() != Some("timeout") {
            return Err(AppError::from(format!("Unexpected probe: {:?}", probe)));
        }
        if probe.latency_ms != 30_000 {
            return Err(AppError::from("Expected probe latency to be kept"));
        }
        Ok(())
    })
}

#[test]
fn shutdown_before_probe_skips_it() -> AppResult<()> {
    run_async_test(async {
        let (shutdown_tx, mut shutdown_rx) = shutdown_channel();
        shutdown_tx
            .send(())
            .map_err(|_| AppError::from("Failed to broadcast shutdown"))?;

        let started = std::time::Instant::now();
        let probe = probe_or_shutdown(&StalledDispatcher, "http://inference.test", &mut shutdown_rx).await;
        if probe.is_some() {
            return Err(AppError::from(format!("Expected no probe, got {:?}", probe)));
        }
        if started.elapsed() >= Duration::from_secs(1) {
            return Err(AppError::from(format!(
                "Shutdown took {:?} to interrupt the probe",
                started.elapsed()
            )));
        }
        Ok(())
    })
}

#[test]
fn shutdown_during_probe_interrupts_it() -> AppResult<()> {
    run_async_test(async {
        let (shutdown_tx, mut shutdown_rx) = shutdown_channel();
        let sender = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            drop(sender.send(()));
        });

        let started = std::time::Instant::now();
        let probe = probe_or_shutdown(&StalledDispatcher, "http://inference.test", &mut shutdown_rx).await;
        if probe.is_some() || started.elapsed() >= Duration::from_secs(5) {
            return Err(AppError::from(format!(
                "Expected an interrupted probe, got {:?} after {:?}",
                probe,
                started.elapsed()
            )));
        }
        let placeholder = ProbeOutcome::interrupted(health_url("http://inference.test/"));
        if placeholder.healthy || placeholder.failure.as_deref() != Some("interrupted") {
            return Err(AppError::from(format!("Unexpected placeholder: {:?}", placeholder)));
        }
        if placeholder.url != "http://inference.test/api/v1/health" {
            return Err(AppError::from(format!("Unexpected url: {}", placeholder.url)));
        }
        Ok(())
    })
}

#[test]
fn probe_completes_without_shutdown() -> AppResult<()> {
    run_async_test(async {
        let (_shutdown_tx, mut shutdown_rx) = shutdown_channel();
        let dispatcher = FixedDispatcher {
            outcome: ResponseOutcome::received(200, Duration::from_millis(2), String::new()),
        };
        let probe = probe_or_shutdown(&dispatcher, "http://inference.test", &mut shutdown_rx).await;
        match probe {
            Some(outcome) if outcome.healthy => Ok(()),
            other => Err(AppError::from(format!("Expected a healthy probe, got {:?}", other))),
        }
    })
}

#[test]
fn teardown_survives_unreachable_gateway() -> AppResult<()> {
    run_async_test(async {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        drop(listener);

        let config = load_config(Some(ExportTarget {
            gateway_url: format!("http://{}", addr),
            job_name: "ml-pipeline-load-test".to_owned(),
        }));
        let sink = MetricSink::new()?;
        let checks = [CheckResult {
            name: CHECK_STATUS_OK,
            passed: true,
        }];
        sink.record(&IterationSample {
            error: false,
            latency: Duration::from_millis(40),
            checks: &checks,
        });

        let report = teardown(&config, &Client::new(), &sink, &summary(), healthy_probe()).await?;
        if !report.passed || report.iterations != 1 {
            return Err(AppError::from(format!("Unexpected report: {:?}", report)));
        }
        let tally = report
            .checks
            .get(CHECK_STATUS_OK)
            .ok_or_else(|| AppError::from("Missing check tally"))?;
        if tally.passes != 1 || tally.fails != 0 {
            return Err(AppError::from(format!("Unexpected tally: {:?}", tally)));
        }
        Ok(())
    })
}
