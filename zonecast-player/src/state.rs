//! Shared service state
//!
//! State that is shared between the controller task and the HTTP layer:
//! the UI event bus and the backend's pushed playback state. Everything the
//! controller owns exclusively (selection, timers, phase) lives inside the
//! controller task instead.

use tokio::sync::{broadcast, watch};
use zonecast_common::events::{EventBus, RemotePlaybackState, ZonecastEvent};

/// Event bus capacity (events buffered per slow subscriber)
const EVENT_CAPACITY: usize = 256;

/// Shared state accessible by all components
pub struct SharedState {
    /// Event broadcaster for SSE clients
    events: EventBus,

    /// Latest backend playback state (written only by the push bridge)
    remote_tx: watch::Sender<RemotePlaybackState>,
}

impl SharedState {
    /// Create new shared state with default values
    pub fn new() -> Self {
        let (remote_tx, _) = watch::channel(RemotePlaybackState::default());
        Self {
            events: EventBus::new(EVENT_CAPACITY),
            remote_tx,
        }
    }

    /// Broadcast an event to all SSE listeners
    pub fn broadcast_event(&self, event: ZonecastEvent) {
        // No receivers is OK
        self.events.emit_lossy(event);
    }

    /// Subscribe to event stream for SSE
    pub fn subscribe_events(&self) -> broadcast::Receiver<ZonecastEvent> {
        self.events.subscribe()
    }

    /// Replace the backend playback state
    pub fn set_remote_state(&self, state: RemotePlaybackState) {
        self.remote_tx.send_replace(state);
    }

    /// Current backend playback state
    pub fn remote_state(&self) -> RemotePlaybackState {
        self.remote_tx.borrow().clone()
    }

    /// Watch backend playback state changes
    pub fn subscribe_remote(&self) -> watch::Receiver<RemotePlaybackState> {
        self.remote_tx.subscribe()
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zonecast_common::events::{NoticeLevel, NowPlaying, RemoteLiveState};

    #[tokio::test]
    async fn test_remote_state_updates_are_observed() {
        let state = SharedState::new();
        let mut rx = state.subscribe_remote();
        assert!(!rx.borrow().is_playing());

        state.set_remote_state(RemotePlaybackState {
            state: RemoteLiveState::Live,
            now_playing: Some(NowPlaying {
                is_playing: true,
                ..Default::default()
            }),
        });

        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_playing());
        assert!(state.remote_state().is_playing());
    }

    #[tokio::test]
    async fn test_broadcast_without_listeners_is_ok() {
        let state = SharedState::new();
        state.broadcast_event(ZonecastEvent::notice(NoticeLevel::Info, "nobody listening"));

        let mut rx = state.subscribe_events();
        state.broadcast_event(ZonecastEvent::notice(NoticeLevel::Info, "hello"));
        match rx.recv().await.unwrap() {
            ZonecastEvent::Notice { message, .. } => assert_eq!(message, "hello"),
            other => panic!("Unexpected event: {:?}", other),
        }
    }
}
