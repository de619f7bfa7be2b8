//! Interleave controller phase
//!
//! Each variant owns the timer handles that are only valid while the
//! controller is in that phase. Replacing the phase drops the old handles,
//! which cancels their tasks, so a fade or volume monitor can never outlive
//! the phase that started it.

use crate::playback::fader::FadeHandle;
use crate::playback::timers::{TaskGuard, VolumeMonitor};
use zonecast_common::events::PlaybackPhase;
use zonecast_common::Announcement;

/// Controller phase with its owned timers
#[derive(Debug, Default)]
pub enum Phase {
    /// No session
    #[default]
    Stopped,

    /// Music playing; countdown eligible
    Playing,

    /// Background music fading down
    Ducking { fade: FadeHandle },

    /// Announcement clip playing over ducked music
    AnnouncementPlaying {
        announcement: Announcement,
        monitor: VolumeMonitor,
        /// Forwards the clip's ended/error events to the controller
        listener: TaskGuard,
    },

    /// Background music fading back up
    Restoring { fade: FadeHandle },
}

impl Phase {
    /// Serializable label
    pub fn label(&self) -> PlaybackPhase {
        match self {
            Phase::Stopped => PlaybackPhase::Stopped,
            Phase::Playing => PlaybackPhase::Playing,
            Phase::Ducking { .. } => PlaybackPhase::Ducking,
            Phase::AnnouncementPlaying { .. } => PlaybackPhase::AnnouncementPlaying,
            Phase::Restoring { .. } => PlaybackPhase::Restoring,
        }
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, Phase::Stopped)
    }

    /// Announcement currently on air
    pub fn announcement(&self) -> Option<&Announcement> {
        match self {
            Phase::AnnouncementPlaying { announcement, .. } => Some(announcement),
            _ => None,
        }
    }

    /// Volume monitor of the running announcement
    pub fn monitor(&self) -> Option<&VolumeMonitor> {
        match self {
            Phase::AnnouncementPlaying { monitor, .. } => Some(monitor),
            _ => None,
        }
    }

    /// Move to `next`, returning the previous label
    ///
    /// The previous phase's timers are cancelled before this returns.
    pub fn transition(&mut self, next: Phase) -> PlaybackPhase {
        let old = std::mem::replace(self, next);
        let label = old.label();
        drop(old);
        label
    }
}
