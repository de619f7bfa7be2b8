//! Cancellable timer tasks
//!
//! Every timer the controller starts (fade steps, the announcement volume
//! monitor, event listeners) runs as a spawned task owned by a [`TaskGuard`].
//! The guard is stored inside the phase that needs it, so leaving the phase
//! drops the guard and cancels the task.
//!
//! Cancellation is synchronous: side effects are issued through a [`Gate`]
//! that checks the cancelled flag under the same lock `cancel()` takes, so
//! once `cancel()` returns no further side effect can happen, even if the
//! task was mid-step on another worker thread.

use crate::config::{VOLUME_EPSILON, VOLUME_MONITOR_PERIOD};
use crate::services::AnnouncementOutput;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Side-effect gate shared between a guard and its task
#[derive(Debug, Clone, Default)]
pub struct Gate {
    cancelled: Arc<Mutex<bool>>,
}

impl Gate {
    /// Run `f` unless the owning guard has been cancelled
    ///
    /// Returns None (without calling `f`) after cancellation.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let cancelled = self.cancelled.lock().unwrap_or_else(PoisonError::into_inner);
        if *cancelled {
            None
        } else {
            Some(f())
        }
    }

    /// Whether the owning guard has been cancelled
    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn close(&self) {
        *self.cancelled.lock().unwrap_or_else(PoisonError::into_inner) = true;
    }
}

/// Owner of a spawned timer task
///
/// Dropping the guard cancels the task.
#[derive(Debug)]
pub struct TaskGuard {
    gate: Gate,
    handle: Option<JoinHandle<()>>,
}

impl TaskGuard {
    /// Spawn a task that receives the guard's gate
    pub fn spawn<F, Fut>(task: F) -> Self
    where
        F: FnOnce(Gate) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let gate = Gate::default();
        let handle = tokio::spawn(task(gate.clone()));
        Self {
            gate,
            handle: Some(handle),
        }
    }

    /// Stop the task; no gated side effect runs after this returns
    pub fn cancel(&mut self) {
        self.gate.close();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Whether the guard was cancelled
    pub fn is_cancelled(&self) -> bool {
        self.gate.is_cancelled()
    }

    /// Whether the task ran to completion (or was cancelled)
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map(|h| h.is_finished()).unwrap_or(true)
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Announcement volume-correction monitor
///
/// While an announcement plays, re-applies the target gain whenever the
/// output's volume drifts more than [`VOLUME_EPSILON`] away from it (external
/// volume changes, media keys). Runs every [`VOLUME_MONITOR_PERIOD`].
#[derive(Debug)]
pub struct VolumeMonitor {
    target_tx: watch::Sender<f32>,
    _guard: TaskGuard,
}

impl VolumeMonitor {
    /// Start monitoring `output` against `target` gain (clamped to [0, 1])
    pub fn start(output: Arc<dyn AnnouncementOutput>, target: f32) -> Self {
        let (target_tx, target_rx) = watch::channel(target.clamp(0.0, 1.0));

        let guard = TaskGuard::spawn(move |gate| async move {
            let mut ticker = tokio::time::interval(VOLUME_MONITOR_PERIOD);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let applied = gate.run(|| {
                    let target = *target_rx.borrow();
                    let current = output.volume();
                    if (current - target).abs() > VOLUME_EPSILON {
                        debug!("Announcement volume drifted to {:.3}, restoring {:.3}", current, target);
                        output.set_volume(target);
                    }
                });
                if applied.is_none() {
                    break;
                }
            }
        });

        Self {
            target_tx,
            _guard: guard,
        }
    }

    /// Change the gain the monitor enforces
    pub fn retarget(&self, target: f32) {
        self.target_tx.send_replace(target.clamp(0.0, 1.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_guard_runs_until_cancelled() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        let mut guard = TaskGuard::spawn(move |gate| async move {
            loop {
                tokio::time::sleep(Duration::from_millis(10)).await;
                if gate.run(|| c.fetch_add(1, Ordering::SeqCst)).is_none() {
                    break;
                }
            }
        });

        tokio::time::sleep(Duration::from_millis(55)).await;
        guard.cancel();
        let seen = counter.load(Ordering::SeqCst);
        assert_eq!(seen, 5);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(counter.load(Ordering::SeqCst), seen);
        assert!(guard.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        let guard = TaskGuard::spawn(move |gate| async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            gate.run(|| c.fetch_add(1, Ordering::SeqCst));
        });
        drop(guard);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_gate_blocks_after_close() {
        let gate = Gate::default();
        assert_eq!(gate.run(|| 7), Some(7));
        gate.close();
        assert_eq!(gate.run(|| 7), None);
        assert!(gate.is_cancelled());
    }
}
