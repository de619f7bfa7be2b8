//! Playback state reconciliation
//!
//! Three sources can each claim that audio is playing: the backend (pushed
//! live state), the controller's own "preview started" flag set by
//! `start()`, and the local player's playing flag. The session counts as
//! playing if any of them says so. This covers the window right after
//! `start()` before the backend confirms, and the backend going quiet while
//! the local preview carries on.

use zonecast_common::events::{PlaybackPhase, RemotePlaybackState};

/// Snapshot of the three playing signals
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackReconciler {
    remote: RemotePlaybackState,
    preview_started: bool,
    local_playing: bool,
}

impl PlaybackReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_remote(&mut self, remote: RemotePlaybackState) {
        self.remote = remote;
    }

    pub fn set_preview_started(&mut self, started: bool) {
        self.preview_started = started;
    }

    pub fn set_local_playing(&mut self, playing: bool) {
        self.local_playing = playing;
    }

    pub fn remote_playing(&self) -> bool {
        self.remote.is_playing()
    }

    /// True when any source reports playback
    pub fn is_effectively_playing(&self) -> bool {
        self.remote.is_playing() || self.preview_started || self.local_playing
    }

    /// Whether the countdown and elapsed clocks may advance
    ///
    /// Requires playback, no announcement sequence in progress and at least
    /// one announcement to count down to.
    pub fn clocks_may_run(&self, phase: PlaybackPhase, rotation_is_empty: bool) -> bool {
        self.is_effectively_playing() && phase == PlaybackPhase::Playing && !rotation_is_empty
    }
}
