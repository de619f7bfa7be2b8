//! Event types for the Zonecast event system
//!
//! Provides shared event definitions and the EventBus used to fan events out
//! to UI subscribers (SSE clients, notification toasts).

mod playback_types;

pub use playback_types::{NoticeLevel, NowPlaying, PlaybackPhase, RemoteLiveState, RemotePlaybackState};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Zonecast event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ZonecastEvent {
    /// Controller phase changed
    PhaseChanged {
        old_phase: PlaybackPhase,
        new_phase: PlaybackPhase,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback session started
    PlaybackStarted {
        session_id: Uuid,
        zone_id: String,
        music_count: usize,
        announcement_count: usize,
        /// Backend accepted the play request
        remote_ok: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback session stopped
    PlaybackStopped {
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Current music track changed
    MusicTrackChanged {
        track_id: String,
        index: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Announcement clip started over ducked music
    AnnouncementStarted {
        announcement_id: String,
        title: String,
        background_volume: u8,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Announcement clip finished and the rotation advanced
    AnnouncementCompleted {
        announcement_id: String,
        next_index: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Announcement could not be played (index not advanced)
    AnnouncementFailed {
        announcement_id: Option<String>,
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Countdown/elapsed clock update (once per counted second)
    CountdownTick {
        seconds_remaining: u32,
        elapsed_seconds: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// User-facing notification (toast)
    Notice {
        level: NoticeLevel,
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl ZonecastEvent {
    /// Build a notice event stamped with the current time
    pub fn notice(level: NoticeLevel, message: impl Into<String>) -> Self {
        ZonecastEvent::Notice {
            level,
            message: message.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    /// Event type name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            ZonecastEvent::PhaseChanged { .. } => "PhaseChanged",
            ZonecastEvent::PlaybackStarted { .. } => "PlaybackStarted",
            ZonecastEvent::PlaybackStopped { .. } => "PlaybackStopped",
            ZonecastEvent::MusicTrackChanged { .. } => "MusicTrackChanged",
            ZonecastEvent::AnnouncementStarted { .. } => "AnnouncementStarted",
            ZonecastEvent::AnnouncementCompleted { .. } => "AnnouncementCompleted",
            ZonecastEvent::AnnouncementFailed { .. } => "AnnouncementFailed",
            ZonecastEvent::CountdownTick { .. } => "CountdownTick",
            ZonecastEvent::Notice { .. } => "Notice",
        }
    }
}

/// One-to-many event distribution
///
/// Thin wrapper over `tokio::sync::broadcast`. Slow subscribers lose the
/// oldest events rather than blocking the emitter.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ZonecastEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use zonecast_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(256);
    /// assert_eq!(event_bus.capacity(), 256);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<ZonecastEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ZonecastEvent,
    ) -> Result<usize, broadcast::error::SendError<ZonecastEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: ZonecastEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eventbus_new() {
        let bus = EventBus::new(100);
        assert_eq!(bus.capacity(), 100);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_emit_without_subscribers_fails() {
        let bus = EventBus::new(10);
        assert!(bus.emit(ZonecastEvent::notice(NoticeLevel::Info, "hello")).is_err());
        // Lossy variant never fails
        bus.emit_lossy(ZonecastEvent::notice(NoticeLevel::Info, "hello"));
    }

    #[tokio::test]
    async fn test_emit_with_subscriber() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();

        let count = bus
            .emit(ZonecastEvent::PlaybackStopped {
                timestamp: chrono::Utc::now(),
            })
            .unwrap();
        assert_eq!(count, 1);

        match rx.recv().await.unwrap() {
            ZonecastEvent::PlaybackStopped { .. } => {}
            other => panic!("Unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = ZonecastEvent::notice(NoticeLevel::Error, "Failed to play announcement audio");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Notice");
        assert_eq!(json["level"], "error");
        assert_eq!(event.event_type(), "Notice");
    }
}
