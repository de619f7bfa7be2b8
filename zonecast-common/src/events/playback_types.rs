//! Playback-related type definitions
//!
//! Supporting types for controller phase labels and the backend's live state.

use serde::{Deserialize, Serialize};

/// Interleave controller phase label
///
/// Serializable projection of the controller's internal phase (which also
/// owns timer handles and is therefore not serializable itself).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackPhase {
    /// No session running
    Stopped,
    /// Music playing, countdown eligible
    Playing,
    /// Background music fading down before an announcement
    Ducking,
    /// Announcement clip playing over ducked music
    AnnouncementPlaying,
    /// Background music fading back up
    Restoring,
}

impl PlaybackPhase {
    /// True for the phases that belong to an announcement sequence
    pub fn is_announcement_sequence(&self) -> bool {
        matches!(
            self,
            PlaybackPhase::Ducking | PlaybackPhase::AnnouncementPlaying | PlaybackPhase::Restoring
        )
    }
}

impl std::fmt::Display for PlaybackPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackPhase::Stopped => write!(f, "stopped"),
            PlaybackPhase::Playing => write!(f, "playing"),
            PlaybackPhase::Ducking => write!(f, "ducking"),
            PlaybackPhase::AnnouncementPlaying => write!(f, "announcement_playing"),
            PlaybackPhase::Restoring => write!(f, "restoring"),
        }
    }
}

/// Backend output state for a zone
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RemoteLiveState {
    Live,
    #[default]
    Standby,
    Offline,
}

/// What the backend reports as currently playing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NowPlaying {
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub title: Option<String>,
    /// Elapsed seconds in the current item
    #[serde(default)]
    pub elapsed: f64,
    /// Duration in seconds of the current item
    #[serde(default)]
    pub duration: f64,
}

/// Backend playback state as pushed to the controller
///
/// The controller only ever reads this value; updates arrive from the
/// backend push bridge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RemotePlaybackState {
    pub state: RemoteLiveState,
    #[serde(default)]
    pub now_playing: Option<NowPlaying>,
}

impl RemotePlaybackState {
    /// Backend is live and reports an item actively playing
    pub fn is_playing(&self) -> bool {
        self.state == RemoteLiveState::Live
            && self.now_playing.as_ref().map(|np| np.is_playing).unwrap_or(false)
    }
}

/// Severity of a user-facing notice
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl std::fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoticeLevel::Info => write!(f, "info"),
            NoticeLevel::Success => write!(f, "success"),
            NoticeLevel::Warning => write!(f, "warning"),
            NoticeLevel::Error => write!(f, "error"),
        }
    }
}
