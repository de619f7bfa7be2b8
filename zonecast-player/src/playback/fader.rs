//! Volume ramps for ducking and restoring background music
//!
//! A ramp moves a volume (percent) linearly from `from` to `to` in
//! [`FADE_STEPS`] discrete steps spread evenly over the fade duration.
//! Every emitted value is clamped into `[0, 100]` and rounded, and the last
//! step always lands exactly on `to`, so a duck followed by its
//! [`reversed`](VolumeRamp::reversed) restore returns to the starting volume
//! with no accumulated drift.
//!
//! # Timing
//!
//! Step `i` (1-based) fires at `start + i * duration / steps`. Deadlines are
//! computed from the ramp's start instant rather than chained sleeps, so a
//! late step does not push back the ones after it.

use crate::config::FADE_STEPS;
use crate::playback::timers::TaskGuard;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Linear volume ramp description
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeRamp {
    from: u8,
    to: u8,
    duration: Duration,
    steps: u32,
}

impl VolumeRamp {
    /// Ramp from `from` to `to` percent over `duration` using [`FADE_STEPS`] steps
    pub fn new(from: u8, to: u8, duration: Duration) -> Self {
        Self::with_steps(from, to, duration, FADE_STEPS)
    }

    /// Ramp with an explicit step count (at least 1)
    pub fn with_steps(from: u8, to: u8, duration: Duration, steps: u32) -> Self {
        Self {
            from: from.min(100),
            to: to.min(100),
            duration,
            steps: steps.max(1),
        }
    }

    /// Starting volume
    pub fn from(&self) -> u8 {
        self.from
    }

    /// Final volume
    pub fn to(&self) -> u8 {
        self.to
    }

    /// Total ramp duration
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Number of steps
    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Time between consecutive steps
    pub fn step_interval(&self) -> Duration {
        self.duration / self.steps
    }

    /// The mirror-image ramp (same duration and step count)
    pub fn reversed(&self) -> Self {
        Self {
            from: self.to,
            to: self.from,
            ..*self
        }
    }

    /// Volume after `step` steps (0 = `from`, `steps` = `to`)
    pub fn value_at(&self, step: u32) -> u8 {
        let step = step.min(self.steps);
        let delta = (self.to as f64 - self.from as f64) / self.steps as f64;
        let value = self.from as f64 + delta * step as f64;
        value.clamp(0.0, 100.0).round() as u8
    }

    /// Values applied by the ramp, one per step, ending with `to`
    pub fn values(&self) -> impl Iterator<Item = u8> + '_ {
        (1..=self.steps).map(move |step| self.value_at(step))
    }

    /// Run the ramp on the tokio timer
    ///
    /// `apply` receives each step's volume; `on_complete` runs once after the
    /// final step. Cancelling (or dropping) the returned handle stops the
    /// ramp: neither callback runs after `cancel()` returns.
    pub fn spawn<A, C>(self, apply: A, on_complete: C) -> FadeHandle
    where
        A: Fn(u8) + Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        debug!(
            "Fade {} -> {} over {:?} ({} steps)",
            self.from, self.to, self.duration, self.steps
        );

        let ramp = self;
        let guard = TaskGuard::spawn(move |gate| async move {
            let start = Instant::now();
            let interval = ramp.step_interval();

            for step in 1..=ramp.steps {
                tokio::time::sleep_until(start + interval * step).await;
                let value = ramp.value_at(step);
                if gate.run(|| apply(value)).is_none() {
                    return;
                }
            }

            gate.run(on_complete);
        });

        FadeHandle { guard }
    }
}

/// Handle to a running fade
#[derive(Debug)]
pub struct FadeHandle {
    guard: TaskGuard,
}

impl FadeHandle {
    /// Stop the fade; no further volume is applied
    pub fn cancel(&mut self) {
        self.guard.cancel();
    }

    /// Whether the fade finished or was cancelled
    pub fn is_finished(&self) -> bool {
        self.guard.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::sync::oneshot;

    #[test]
    fn test_linear_values_end_on_target() {
        let ramp = VolumeRamp::new(100, 20, Duration::from_secs(1));
        let values: Vec<u8> = ramp.values().collect();
        assert_eq!(values.len(), FADE_STEPS as usize);
        assert_eq!(values[0], 96);
        assert_eq!(values[9], 60);
        assert_eq!(*values.last().unwrap(), 20);
        assert!(values.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_duck_restore_symmetry() {
        for background in [0u8, 7, 20, 33, 99, 100] {
            let duck = VolumeRamp::new(100, background, Duration::from_secs(3));
            let restore = duck.reversed();
            assert_eq!(restore.steps(), duck.steps());
            assert_eq!(restore.duration(), duck.duration());
            assert_eq!(duck.values().last(), Some(background));
            assert_eq!(restore.values().last(), Some(100));
        }
    }

    #[test]
    fn test_step_interval() {
        let ramp = VolumeRamp::new(100, 20, Duration::from_secs(3));
        assert_eq!(ramp.step_interval(), Duration::from_millis(150));
    }

    #[test]
    fn test_inputs_clamped() {
        let ramp = VolumeRamp::with_steps(250, 0, Duration::from_secs(1), 0);
        assert_eq!(ramp.from(), 100);
        assert_eq!(ramp.steps(), 1);
        assert_eq!(ramp.values().collect::<Vec<_>>(), vec![0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_fade_applies_every_step() {
        let applied = Arc::new(Mutex::new(Vec::new()));
        let sink = applied.clone();
        let (done_tx, done_rx) = oneshot::channel();

        let start = Instant::now();
        let _handle = VolumeRamp::new(100, 20, Duration::from_secs(1)).spawn(
            move |v| sink.lock().unwrap().push(v),
            move || {
                let _ = done_tx.send(());
            },
        );

        done_rx.await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(1));
        let applied = applied.lock().unwrap();
        assert_eq!(applied.len(), 20);
        assert_eq!(*applied.last().unwrap(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_fade_stops_applying() {
        let applied = Arc::new(Mutex::new(Vec::new()));
        let sink = applied.clone();
        let completed = Arc::new(Mutex::new(false));
        let done = completed.clone();

        let mut handle = VolumeRamp::new(100, 0, Duration::from_secs(2)).spawn(
            move |v| sink.lock().unwrap().push(v),
            move || *done.lock().unwrap() = true,
        );

        tokio::time::sleep(Duration::from_millis(550)).await;
        handle.cancel();
        let count = applied.lock().unwrap().len();
        assert_eq!(count, 5);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(applied.lock().unwrap().len(), count);
        assert!(!*completed.lock().unwrap());
        assert!(handle.is_finished());
    }
}
