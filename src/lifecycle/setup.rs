use serde::Serialize;
use tracing::{info, warn};

use crate::shutdown::ShutdownReceiver;
use crate::workload::{Dispatcher, FailureKind, HEALTH_PATH, RequestSpec};

/// Result of the pre-run health probe, carried into the final report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeOutcome {
    pub url: String,
    /// HTTP status, 0 when no response arrived.
    pub status: u16,
    pub healthy: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl ProbeOutcome {
    /// Outcome recorded when shutdown arrived while the probe was in flight.
    #[must_use]
    pub fn interrupted(url: String) -> Self {
        Self {
            url,
            status: 0,
            healthy: false,
            latency_ms: 0,
            failure: Some("interrupted".to_owned()),
        }
    }
}

/// Runs [`probe_target`] unless shutdown is broadcast first, in which case
/// the probe is dropped and `None` is returned.
pub async fn probe_or_shutdown<D>(
    dispatcher: &D,
    base_url: &str,
    shutdown_rx: &mut ShutdownReceiver,
) -> Option<ProbeOutcome>
where
    D: Dispatcher + ?Sized,
{
    tokio::select! {
        biased;
        _ = shutdown_rx.recv() => {
            info!("Interrupted during the health probe, skipping load");
            None
        }
        outcome = probe_target(dispatcher, base_url) => Some(outcome),
    }
}

/// Health endpoint URL for `base_url`.
#[must_use]
pub fn health_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), HEALTH_PATH)
}

/// Issues one GET to the health endpoint before load starts. Anything other
/// than a 200 is logged as a warning; the run goes ahead regardless.
pub async fn probe_target<D>(dispatcher: &D, base_url: &str) -> ProbeOutcome
where
    D: Dispatcher + ?Sized,
{
    let url = health_url(base_url);
    let outcome = dispatcher.dispatch(&RequestSpec::get(url.clone())).await;
    let latency_ms = u64::try_from(outcome.latency.as_millis()).unwrap_or(u64::MAX);
    let failure = outcome.failure.map(|kind| match kind {
        FailureKind::Timeout => "timeout".to_owned(),
        FailureKind::Transport => "transport".to_owned(),
    });
    let healthy = outcome.status == 200;

    if healthy {
        info!("Target {} is reachable ({}ms)", url, latency_ms);
    } else if let Some(reason) = failure.as_deref() {
        warn!("Health probe to {} failed ({}), starting load anyway", url, reason);
    } else {
        warn!(
            "Health probe to {} returned status {}, starting load anyway",
            url, outcome.status
        );
    }

    ProbeOutcome {
        url,
        status: outcome.status,
        healthy,
        latency_ms,
        failure,
    }
}
