//! Local background-music player
//!
//! The controller ducks and restores this player's volume around
//! announcements and follows its track-ended events to cycle the music
//! queue. Volume is in percent (0-100).

use crate::error::{Error, Result};
use crate::playback::timers::TaskGuard;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};
use zonecast_common::Track;

/// Playback length assumed for items with unknown duration
pub const NOMINAL_DURATION: Duration = Duration::from_secs(1);

/// Track as handed to the local player
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalTrack {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
    /// Seconds, 0 when unknown
    pub duration: f64,
}

impl From<&Track> for LocalTrack {
    fn from(track: &Track) -> Self {
        Self {
            id: track.id.clone(),
            title: track.name.clone(),
            url: track.url.clone(),
            duration: track.duration,
        }
    }
}

/// Events published by a local player
#[derive(Debug, Clone, PartialEq)]
pub enum LocalPlayerEvent {
    /// The track played to its end
    TrackEnded { track_id: String },
}

/// Local music output
#[async_trait]
pub trait LocalPlayer: Send + Sync {
    /// Load and start a track
    async fn play(&self, track: &LocalTrack) -> Result<()>;

    /// Pause output
    fn pause(&self);

    /// Set output volume in percent (values above 100 are clamped)
    fn set_volume(&self, percent: u8);

    /// Current output volume in percent
    fn volume(&self) -> u8;

    /// Playing flag
    fn playing(&self) -> watch::Receiver<bool>;

    /// Subscribe to player events
    fn subscribe(&self) -> broadcast::Receiver<LocalPlayerEvent>;
}

/// Convert a duration in seconds into a playback length
pub(crate) fn play_length(seconds: f64) -> Duration {
    if seconds.is_finite() && seconds > 0.0 {
        Duration::from_secs_f64(seconds)
    } else {
        NOMINAL_DURATION
    }
}

#[derive(Debug)]
struct PlayerInner {
    volume: u8,
    current: Option<LocalTrack>,
    end_timer: Option<TaskGuard>,
}

/// Headless local player
///
/// Keeps volume and playing state and reports each track as ended once its
/// duration has elapsed on the tokio clock.
pub struct SimulatedLocalPlayer {
    inner: Mutex<PlayerInner>,
    playing_tx: Arc<watch::Sender<bool>>,
    events_tx: broadcast::Sender<LocalPlayerEvent>,
}

impl SimulatedLocalPlayer {
    pub fn new() -> Self {
        let (playing_tx, _) = watch::channel(false);
        let (events_tx, _) = broadcast::channel(16);
        Self {
            inner: Mutex::new(PlayerInner {
                volume: 100,
                current: None,
                end_timer: None,
            }),
            playing_tx: Arc::new(playing_tx),
            events_tx,
        }
    }

    /// Track loaded most recently
    pub fn current(&self) -> Option<LocalTrack> {
        self.lock().current.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PlayerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SimulatedLocalPlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocalPlayer for SimulatedLocalPlayer {
    async fn play(&self, track: &LocalTrack) -> Result<()> {
        if track.url.as_deref().map(str::trim).unwrap_or_default().is_empty() {
            return Err(Error::Playback(format!(
                "Track '{}' has no audio URL",
                track.title
            )));
        }

        let length = play_length(track.duration);
        let track_id = track.id.clone();
        let playing_tx = self.playing_tx.clone();
        let events_tx = self.events_tx.clone();

        let timer = TaskGuard::spawn(move |gate| async move {
            tokio::time::sleep(length).await;
            gate.run(|| {
                playing_tx.send_replace(false);
                let _ = events_tx.send(LocalPlayerEvent::TrackEnded { track_id });
            });
        });

        info!("Local player: playing '{}' ({:?})", track.title, length);
        let mut inner = self.lock();
        inner.current = Some(track.clone());
        inner.end_timer = Some(timer);
        self.playing_tx.send_replace(true);
        Ok(())
    }

    fn pause(&self) {
        debug!("Local player: pause");
        self.lock().end_timer = None;
        self.playing_tx.send_replace(false);
    }

    fn set_volume(&self, percent: u8) {
        self.lock().volume = percent.min(100);
    }

    fn volume(&self) -> u8 {
        self.lock().volume
    }

    fn playing(&self) -> watch::Receiver<bool> {
        self.playing_tx.subscribe()
    }

    fn subscribe(&self) -> broadcast::Receiver<LocalPlayerEvent> {
        self.events_tx.subscribe()
    }
}
