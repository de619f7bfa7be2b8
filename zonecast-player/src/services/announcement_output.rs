//! Announcement clip output
//!
//! Exclusively owned by the controller: nothing else loads, plays or
//! changes the volume of announcement audio. Volume is a gain in `[0, 1]`.

use crate::error::{Error, Result};
use crate::services::local_player::play_length;
use crate::playback::timers::TaskGuard;
use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Clip ready to be loaded into the output
#[derive(Debug, Clone, PartialEq)]
pub struct AnnouncementClip {
    pub id: String,
    pub url: String,
    /// Seconds, 0 when unknown
    pub duration: f64,
}

/// Events published by the output while a clip plays
#[derive(Debug, Clone, PartialEq)]
pub enum ClipEvent {
    /// Clip played to its natural end
    Ended,
    /// Media error while playing
    Error(String),
}

/// Announcement audio output
#[async_trait]
pub trait AnnouncementOutput: Send + Sync {
    /// Set the clip source; resets position to 0
    fn load(&self, clip: &AnnouncementClip) -> Result<()>;

    /// Set output gain (values outside [0, 1] are clamped)
    fn set_volume(&self, gain: f32);

    /// Current output gain
    fn volume(&self) -> f32;

    /// Start the loaded clip
    async fn play(&self) -> Result<()>;

    /// Stop playback and rewind to the start
    fn stop(&self);

    /// Subscribe to clip events
    fn subscribe(&self) -> broadcast::Receiver<ClipEvent>;
}

#[derive(Debug, Default)]
struct OutputInner {
    clip: Option<AnnouncementClip>,
    volume: f32,
    end_timer: Option<TaskGuard>,
}

/// Headless announcement output
///
/// Reports the clip as ended once its duration has elapsed on the tokio
/// clock.
pub struct SimulatedAnnouncementOutput {
    inner: Mutex<OutputInner>,
    events_tx: broadcast::Sender<ClipEvent>,
}

impl SimulatedAnnouncementOutput {
    pub fn new() -> Self {
        let (events_tx, _) = broadcast::channel(16);
        Self {
            inner: Mutex::new(OutputInner {
                volume: 1.0,
                ..Default::default()
            }),
            events_tx,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, OutputInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SimulatedAnnouncementOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnnouncementOutput for SimulatedAnnouncementOutput {
    fn load(&self, clip: &AnnouncementClip) -> Result<()> {
        if clip.url.trim().is_empty() {
            return Err(Error::Playback("Announcement has no audio URL".to_string()));
        }
        debug!("Announcement output: loaded {}", clip.url);
        let mut inner = self.lock();
        inner.end_timer = None;
        inner.clip = Some(clip.clone());
        Ok(())
    }

    fn set_volume(&self, gain: f32) {
        let gain = if gain.is_finite() { gain.clamp(0.0, 1.0) } else { 0.0 };
        self.lock().volume = gain;
    }

    fn volume(&self) -> f32 {
        self.lock().volume
    }

    async fn play(&self) -> Result<()> {
        let mut inner = self.lock();
        let clip = inner
            .clip
            .clone()
            .ok_or_else(|| Error::Playback("No announcement loaded".to_string()))?;

        let length = play_length(clip.duration);
        let events_tx = self.events_tx.clone();
        inner.end_timer = Some(TaskGuard::spawn(move |gate| async move {
            tokio::time::sleep(length).await;
            gate.run(|| {
                let _ = events_tx.send(ClipEvent::Ended);
            });
        }));

        info!("Announcement output: playing {} ({:?})", clip.id, length);
        Ok(())
    }

    fn stop(&self) {
        debug!("Announcement output: stop");
        self.lock().end_timer = None;
    }

    fn subscribe(&self) -> broadcast::Receiver<ClipEvent> {
        self.events_tx.subscribe()
    }
}
