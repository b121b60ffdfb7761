//! Value Animation
//!
//! Moves an integer value towards a target one unit per tick, spreading the
//! ticks evenly over a fixed duration. The stepping itself is the
//! [`Animator`] state machine; [`animate_with`] drives it from a tokio
//! interval, and [`spawn_cell_animation`] applies it to a chart cell.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::charts::{ChartError, ChartHandle};

/// Shortest tick period; a timer cannot fire with a zero period
pub const MIN_TICK: Duration = Duration::from_millis(1);

/// Unit-step animation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Animator {
    /// Nothing left to do
    Idle,
    /// Moving `current` towards `target` by `step` (±1) per tick
    Animating { current: i64, target: i64, step: i64 },
}

impl Animator {
    /// Start an animation; equal endpoints go straight to `Idle`
    pub fn new(start: i64, end: i64) -> Self {
        if start == end {
            Animator::Idle
        } else {
            Animator::Animating {
                current: start,
                target: end,
                step: if end > start { 1 } else { -1 },
            }
        }
    }

    pub fn is_animating(&self) -> bool {
        matches!(self, Animator::Animating { .. })
    }

    /// Advance one step and return the new value.
    ///
    /// Transitions to `Idle` on the tick that reaches the target. Returns
    /// `None` once idle.
    pub fn tick(&mut self) -> Option<i64> {
        match *self {
            Animator::Idle => None,
            Animator::Animating {
                current,
                target,
                step,
            } => {
                let next = current + step;
                *self = if next == target {
                    Animator::Idle
                } else {
                    Animator::Animating {
                        current: next,
                        target,
                        step,
                    }
                };
                Some(next)
            }
        }
    }
}

/// Tick period for covering `distance` units in `duration`.
///
/// `floor(duration_ms / |distance|)` milliseconds, raised to [`MIN_TICK`].
/// `None` when there is no distance to cover.
pub fn tick_interval(duration: Duration, distance: i64) -> Option<Duration> {
    if distance == 0 {
        return None;
    }
    let millis = duration.as_millis() as u64 / distance.unsigned_abs();
    Some(Duration::from_millis(millis).max(MIN_TICK))
}

/// Run an animation, awaiting `on_tick` with every intermediate value.
///
/// Returns the number of ticks. Equal endpoints return immediately with 0.
pub async fn animate_with<F, Fut>(start: i64, end: i64, duration: Duration, mut on_tick: F) -> u64
where
    F: FnMut(i64) -> Fut,
    Fut: Future<Output = ()>,
{
    let Some(period) = tick_interval(duration, end - start) else {
        return 0;
    };

    let mut animator = Animator::new(start, end);
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut ticks = 0;
    while animator.is_animating() {
        ticker.tick().await;
        if let Some(value) = animator.tick() {
            on_tick(value).await;
            ticks += 1;
        }
    }
    ticks
}

/// Run an animation with a plain callback
pub async fn animate(start: i64, end: i64, duration: Duration, mut callback: impl FnMut(i64)) -> u64 {
    animate_with(start, end, duration, |value| {
        callback(value);
        std::future::ready(())
    })
    .await
}

/// Animate one chart cell from its current value to `end`.
///
/// Each tick writes the value into the chart, which redraws it. Returns
/// `None` when the cell already holds `end`.
pub async fn spawn_cell_animation(
    chart: ChartHandle,
    index: usize,
    end: i64,
    duration: Duration,
) -> Result<Option<JoinHandle<u64>>, ChartError> {
    let (kind, start) = {
        let guard = chart.read().await;
        let len = guard.series().len();
        let start = guard
            .value(index)
            .ok_or(ChartError::IndexOutOfRange { index, len })?;
        (guard.kind(), start)
    };

    if start == end {
        tracing::debug!(chart = %kind, index, value = end, "Cell already at target");
        return Ok(None);
    }

    tracing::debug!(chart = %kind, index, start, end, "Starting cell animation");

    let handle = tokio::spawn(async move {
        animate_with(start, end, duration, |value| {
            let chart = chart.clone();
            async move {
                if let Err(e) = chart.write().await.set_value(index, value) {
                    tracing::warn!(chart = %kind, "Animation write failed: {}", e);
                }
            }
        })
        .await
    });

    Ok(Some(handle))
}
