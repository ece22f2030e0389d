//! Stage runner: scales virtual users along the configured ramp and winds
//! them down at the end of the run.
mod ramp;
mod vu;


use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval, timeout_at};
use tracing::{debug, info, warn};

use crate::config::Stage;
use crate::shutdown::{ShutdownReceiver, ShutdownSender};
use crate::workload::{Dispatcher, WorkloadDriver};

pub use ramp::{RampPoint, target_at};

use vu::{ActiveVu, spawn_vu};

/// How often the active VU count is reconciled with the ramp.
const RAMP_TICK: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub elapsed: Duration,
    pub peak_vus: usize,
    /// Iterations that completed (and were recorded).
    pub iterations: u64,
    /// True when a shutdown broadcast cut the run short.
    pub interrupted: bool,
}

impl RunSummary {
    /// Summary for a run that was interrupted before any stage began.
    #[must_use]
    pub const fn not_started() -> Self {
        Self {
            elapsed: Duration::ZERO,
            peak_vus: 0,
            iterations: 0,
            interrupted: true,
        }
    }
}

/// Drives `driver` through `stages`. Once the last stage elapses VUs get
/// `graceful_stop` to finish their in-flight iteration before being
/// cancelled. A shutdown broadcast cancels every VU immediately.
///
/// `shutdown_rx` must be subscribed before anything that can race a signal,
/// so a broadcast sent before the first stage still stops the run.
pub async fn run_stages<D>(
    driver: Arc<WorkloadDriver<D>>,
    stages: &[Stage],
    graceful_stop: Duration,
    shutdown_tx: &ShutdownSender,
    mut shutdown_rx: ShutdownReceiver,
) -> RunSummary
where
    D: Dispatcher + 'static,
{
    let start = Instant::now();
    let mut tick = interval(RAMP_TICK);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut active: Vec<ActiveVu> = Vec::new();
    let mut retired: Vec<JoinHandle<u64>> = Vec::new();
    let mut next_id: usize = 0;
    let mut peak_vus: usize = 0;
    let mut current_stage: Option<usize> = None;
    let mut interrupted = false;

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => {
                interrupted = true;
                break;
            }
            _ = tick.tick() => {
                let Some(point) = target_at(stages, start.elapsed()) else {
                    break;
                };
                if current_stage != Some(point.stage) {
                    current_stage = Some(point.stage);
                    if let Some(stage) = stages.get(point.stage) {
                        info!(
                            "Stage {}/{}: ramping to {} VUs over {:?}",
                            point.stage.saturating_add(1),
                            stages.len(),
                            stage.target,
                            stage.duration
                        );
                    }
                }

                while active.len() < point.target {
                    active.push(spawn_vu(Arc::clone(&driver), next_id, shutdown_tx.subscribe()));
                    next_id = next_id.saturating_add(1);
                }
                while active.len() > point.target {
                    if let Some(vu) = active.pop() {
                        retired.push(vu.stop());
                    }
                }
                peak_vus = peak_vus.max(active.len());
            }
        }
    }

    retired.extend(active.drain(..).map(ActiveVu::stop));
    debug!("Waiting for {} VUs to finish", retired.len());

    let iterations = if interrupted {
        // VUs spawned after the first broadcast never saw it.
        drop(shutdown_tx.send(()));
        join_all_vus(retired).await
    } else {
        wind_down(retired, graceful_stop, shutdown_tx).await
    };

    RunSummary {
        elapsed: start.elapsed(),
        peak_vus,
        iterations,
        interrupted,
    }
}

async fn wind_down(
    handles: Vec<JoinHandle<u64>>,
    graceful_stop: Duration,
    shutdown_tx: &ShutdownSender,
) -> u64 {
    let deadline = Instant::now()
        .checked_add(graceful_stop)
        .unwrap_or_else(Instant::now);
    let mut iterations: u64 = 0;
    let mut cancelled = false;

    for mut handle in handles {
        if !cancelled {
            match timeout_at(deadline, &mut handle).await {
                Ok(joined) => {
                    iterations = iterations.saturating_add(joined_count(joined));
                    continue;
                }
                Err(_) => {
                    warn!(
                        "Graceful stop of {:?} expired, cancelling in-flight iterations",
                        graceful_stop
                    );
                    drop(shutdown_tx.send(()));
                    cancelled = true;
                }
            }
        }
        iterations = iterations.saturating_add(joined_count(handle.await));
    }

    iterations
}

async fn join_all_vus(handles: Vec<JoinHandle<u64>>) -> u64 {
    let mut iterations: u64 = 0;
    for handle in handles {
        iterations = iterations.saturating_add(joined_count(handle.await));
    }
    iterations
}

fn joined_count(joined: Result<u64, tokio::task::JoinError>) -> u64 {
    match joined {
        Ok(count) => count,
        Err(err) => {
            warn!("VU task failed: {}", err);
            0
        }
    }
}
