//! Interleave scheduler
//!
//! The controller runs as a single tokio task that owns all session state:
//! selection, rotation, countdown, phase and the timers hanging off it.
//! Callers talk to it through a [`ControllerHandle`] (commands over `mpsc`
//! with `oneshot` replies) and observe it through a `watch` of
//! [`PlaybackView`]. Because only the task mutates state, timer ticks,
//! clip events and commands can never interleave mid-update.
//!
//! # Lifecycle
//!
//! ```text
//! Stopped --start--> Playing --countdown/skip--> Ducking --fade done--> AnnouncementPlaying
//!    ^                  ^                                                     |
//!    |                  +------- fade done <------ Restoring <---- ended -----+
//!    |                  +------------------------------------------ error ----+
//!    +------------------------------ stop (from any phase) ------------------+
//! ```

mod actor;
mod announcement;
mod selection;

use crate::config::{ControllerSettings, SettingsRequest};
use crate::error::{Error, Result};
use crate::services::{AnnouncementOutput, LibrarySnapshot, LocalPlayer, RemotePlayback};
use crate::state::SharedState;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;
use zonecast_common::events::PlaybackPhase;
use zonecast_common::{Announcement, Track};

use self::actor::Controller;

/// Command queue depth
const COMMAND_CAPACITY: usize = 32;

/// Result of a start request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartOutcome {
    /// A session was already running; nothing changed
    pub already_running: bool,

    /// Backend play failure (session continues in preview-only mode)
    pub remote_error: Option<String>,
}

/// Read-only view model for rendering the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackView {
    pub phase: PlaybackPhase,
    pub is_playing: bool,
    /// True from the start of the duck until the restore finishes
    pub is_playing_announcement: bool,
    pub current_music: Option<Track>,
    /// Announcement at the rotation cursor (on air during a sequence)
    pub next_announcement: Option<Announcement>,
    pub time_until_next_announcement: u32,
    /// `M:SS` rendering of the countdown
    pub time_until_next_display: String,
    pub elapsed_time: u64,
    pub elapsed_display: String,
    pub current_music_index: usize,
    pub current_announcement_index: usize,
    pub music_count: usize,
    pub announcement_count: usize,
    /// Local music volume in percent
    pub music_volume: u8,
    /// Backend play failed; running on local preview only
    pub degraded: bool,
    pub zone_id: Option<String>,
    pub folder_id: Option<String>,
    pub session_id: Option<Uuid>,
    pub settings: ControllerSettings,
}

/// Collaborators wired into the controller
#[derive(Clone)]
pub struct ControllerDeps {
    pub remote: Arc<dyn RemotePlayback>,
    pub local: Arc<dyn LocalPlayer>,
    pub announcer: Arc<dyn AnnouncementOutput>,
    pub shared: Arc<SharedState>,
}

pub(crate) enum Command {
    Start {
        reply: oneshot::Sender<Result<StartOutcome>>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    SkipToAnnouncement {
        reply: oneshot::Sender<bool>,
    },
    TogglePlayPause {
        reply: oneshot::Sender<Result<bool>>,
    },
    SetLibrary {
        library: LibrarySnapshot,
        reply: oneshot::Sender<()>,
    },
    SetSelection {
        music_ids: Vec<String>,
        announcement_ids: Vec<String>,
        reply: oneshot::Sender<()>,
    },
    SetZone {
        zone_id: Option<String>,
        reply: oneshot::Sender<Result<()>>,
    },
    SetFolderFilter {
        folder_id: Option<String>,
        reply: oneshot::Sender<()>,
    },
    UpdateSettings {
        request: SettingsRequest,
        reply: oneshot::Sender<ControllerSettings>,
    },
}

/// Cloneable handle to the controller task
#[derive(Clone)]
pub struct ControllerHandle {
    tx: mpsc::Sender<Command>,
    view_rx: watch::Receiver<PlaybackView>,
}

impl ControllerHandle {
    /// Start a session
    ///
    /// Fails with [`Error::Validation`] when no music or no valid zone is
    /// selected. A backend failure does not fail the start; it is reported
    /// in [`StartOutcome::remote_error`].
    pub async fn start(&self) -> Result<StartOutcome> {
        self.request(|reply| Command::Start { reply }).await?
    }

    /// Stop the session; safe to call repeatedly
    pub async fn stop(&self) -> Result<()> {
        self.request(|reply| Command::Stop { reply }).await
    }

    /// Run the announcement sequence now
    ///
    /// Returns false (and does nothing) unless music is playing, no
    /// announcement is in progress and the rotation is non-empty.
    pub async fn skip_to_announcement(&self) -> Result<bool> {
        self.request(|reply| Command::SkipToAnnouncement { reply }).await
    }

    /// Toggle backend playback; returns whether the zone should now be playing
    pub async fn toggle_play_pause(&self) -> Result<bool> {
        self.request(|reply| Command::TogglePlayPause { reply }).await?
    }

    /// Replace the music/announcement/zone library
    pub async fn set_library(&self, library: LibrarySnapshot) -> Result<()> {
        self.request(|reply| Command::SetLibrary { library, reply })
            .await
    }

    /// Replace the selected music and announcement ids
    pub async fn set_selection(
        &self,
        music_ids: Vec<String>,
        announcement_ids: Vec<String>,
    ) -> Result<()> {
        self.request(|reply| Command::SetSelection {
            music_ids,
            announcement_ids,
            reply,
        })
        .await
    }

    /// Select the target zone
    pub async fn set_zone(&self, zone_id: Option<String>) -> Result<()> {
        self.request(|reply| Command::SetZone { zone_id, reply })
            .await?
    }

    /// Restrict the rotation to one announcement folder (None clears)
    pub async fn set_folder_filter(&self, folder_id: Option<String>) -> Result<()> {
        self.request(|reply| Command::SetFolderFilter { folder_id, reply })
            .await
    }

    /// Apply a partial settings update; returns the effective settings
    pub async fn update_settings(&self, request: SettingsRequest) -> Result<ControllerSettings> {
        self.request(|reply| Command::UpdateSettings { request, reply })
            .await
    }

    /// Latest published view
    pub fn view(&self) -> PlaybackView {
        self.view_rx.borrow().clone()
    }

    /// Watch view updates
    pub fn subscribe_view(&self) -> watch::Receiver<PlaybackView> {
        self.view_rx.clone()
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| Error::ControllerUnavailable)?;
        reply_rx.await.map_err(|_| Error::ControllerUnavailable)
    }
}

/// Spawn the controller task
///
/// The task runs until every [`ControllerHandle`] has been dropped.
pub fn spawn_controller(
    deps: ControllerDeps,
    settings: ControllerSettings,
) -> (ControllerHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
    let (controller, view_rx, events_rx) = Controller::new(deps, settings.sanitized());
    let task = tokio::spawn(controller.run(rx, events_rx));
    (ControllerHandle { tx, view_rx }, task)
}
