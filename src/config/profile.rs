use std::time::Duration;

use crate::args::ProfileKind;

/// A ramp window: over `duration`, move linearly to `target` virtual users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub duration: Duration,
    pub target: usize,
}

impl Stage {
    #[must_use]
    pub const fn new(duration: Duration, target: usize) -> Self {
        Self { duration, target }
    }
}

/// Pass/fail limits evaluated once over every recorded sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// p95 latency must stay strictly below this many milliseconds.
    pub p95_ms: u64,
    /// Error rate must stay strictly below this fraction.
    pub error_rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadProfile {
    pub kind: ProfileKind,
    pub stages: Vec<Stage>,
    pub thresholds: Thresholds,
}

const fn minutes(count: u64) -> Duration {
    Duration::from_secs(count.saturating_mul(60))
}

impl WorkloadProfile {
    #[must_use]
    pub fn builtin(kind: ProfileKind) -> Self {
        match kind {
            ProfileKind::Load => Self {
                kind,
                stages: vec![
                    Stage::new(minutes(1), 5),
                    Stage::new(minutes(3), 5),
                    Stage::new(minutes(1), 10),
                    Stage::new(minutes(3), 10),
                    Stage::new(minutes(1), 0),
                ],
                thresholds: Thresholds {
                    p95_ms: 2000,
                    error_rate: 0.1,
                },
            },
            ProfileKind::Stress => Self {
                kind,
                stages: vec![
                    Stage::new(minutes(2), 20),
                    Stage::new(minutes(5), 20),
                    Stage::new(minutes(2), 0),
                ],
                thresholds: Thresholds {
                    p95_ms: 5000,
                    error_rate: 0.2,
                },
            },
        }
    }

    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.stages
            .iter()
            .fold(Duration::ZERO, |total, stage| total.saturating_add(stage.duration))
    }

    #[must_use]
    pub fn peak_target(&self) -> usize {
        self.stages
            .iter()
            .map(|stage| stage.target)
            .max()
            .unwrap_or(0)
    }
}
