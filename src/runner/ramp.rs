use std::time::Duration;

use crate::config::Stage;

/// Where the ramp stands at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RampPoint {
    /// Index of the active stage.
    pub stage: usize,
    /// Desired number of active VUs. The step away from the previous
    /// stage's target is rounded to the nearest user, halves away from zero.
    pub target: usize,
}

/// Desired VU count `elapsed` into the run, interpolating linearly from the
/// previous stage's target (0 before the first stage). `None` once every
/// stage has elapsed.
#[must_use]
pub fn target_at(stages: &[Stage], elapsed: Duration) -> Option<RampPoint> {
    let mut stage_start = Duration::ZERO;
    let mut start_target: usize = 0;

    for (idx, stage) in stages.iter().enumerate() {
        let stage_end = stage_start.saturating_add(stage.duration);
        if elapsed < stage_end {
            let offset = elapsed.saturating_sub(stage_start);
            return Some(RampPoint {
                stage: idx,
                target: interpolate(start_target, stage.target, offset, stage.duration),
            });
        }
        stage_start = stage_end;
        start_target = stage.target;
    }

    None
}

fn interpolate(start: usize, target: usize, offset: Duration, span: Duration) -> usize {
    let start_i128 = i128::try_from(start).unwrap_or(i128::MAX);
    let target_i128 = i128::try_from(target).unwrap_or(i128::MAX);
    let offset_ms = i128::try_from(offset.as_millis()).unwrap_or(i128::MAX);
    let span_ms = i128::try_from(span.as_millis()).unwrap_or(i128::MAX);

    let delta = target_i128.saturating_sub(start_i128);
    let half_span = span_ms.checked_div(2).unwrap_or(0);
    let scaled = delta.saturating_mul(offset_ms);
    let rounded = if scaled < 0 {
        scaled.saturating_sub(half_span)
    } else {
        scaled.saturating_add(half_span)
    };
    let step = rounded.checked_div(span_ms).unwrap_or(delta);
    let current = start_i128.saturating_add(step);
    if current < 0 {
        0
    } else {
        usize::try_from(current).unwrap_or(usize::MAX)
    }
}
