//! Controller task: state, event loop, session start/stop and clocks

use super::{Command, ControllerDeps, PlaybackView, StartOutcome};
use crate::config::{ControllerSettings, FULL_VOLUME};
use crate::error::{Error, Result};
use crate::playback::music_queue::MusicQueue;
use crate::playback::phase::Phase;
use crate::playback::reconciler::PlaybackReconciler;
use crate::playback::rotation::AnnouncementRotation;
use crate::services::{
    AnnouncementOutput, LibrarySnapshot, LocalPlayer, LocalPlayerEvent, LocalTrack, PlayRequest,
    RemotePlayback,
};
use crate::state::SharedState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;
use zonecast_common::events::{NoticeLevel, PlaybackPhase, ZonecastEvent};
use zonecast_common::human_time::format_clock;

/// Clock period for the countdown and elapsed timers
const CLOCK_PERIOD: Duration = Duration::from_secs(1);

/// Internal notifications from spawned timer and playback tasks
///
/// Each carries the generation of the announcement sequence that produced
/// it; events from an older sequence (or from before a stop) are ignored.
#[derive(Debug)]
pub(super) enum ControllerEvent {
    /// Duck or restore fade reached its last step
    FadeFinished { generation: u64 },
    /// The announcement output's `play()` returned
    ClipPlayResult {
        generation: u64,
        result: std::result::Result<(), String>,
    },
    /// Announcement clip reached its natural end
    ClipEnded { generation: u64 },
    /// Announcement clip raised a media error
    ClipFailed { generation: u64, message: String },
}

pub(super) struct Controller {
    pub(super) remote: Arc<dyn RemotePlayback>,
    pub(super) local: Arc<dyn LocalPlayer>,
    pub(super) announcer: Arc<dyn AnnouncementOutput>,
    pub(super) shared: Arc<SharedState>,

    pub(super) events_tx: mpsc::UnboundedSender<ControllerEvent>,
    view_tx: watch::Sender<PlaybackView>,

    pub(super) settings: ControllerSettings,
    pub(super) library: LibrarySnapshot,
    pub(super) selected_music: Vec<String>,
    pub(super) selected_announcements: Vec<String>,
    pub(super) zone_id: Option<String>,
    pub(super) folder_id: Option<String>,

    pub(super) music: MusicQueue,
    pub(super) rotation: AnnouncementRotation,
    pub(super) reconciler: PlaybackReconciler,
    pub(super) phase: Phase,

    /// Seconds until the next announcement
    pub(super) countdown: u32,
    /// Seconds of music counted this session
    pub(super) elapsed: u64,
    countdown_timer: Option<Interval>,
    elapsed_timer: Option<Interval>,

    /// Bumped for every announcement sequence and on stop
    pub(super) generation: u64,
    pub(super) degraded: bool,
    session_id: Option<Uuid>,
}

impl Controller {
    pub(super) fn new(
        deps: ControllerDeps,
        settings: ControllerSettings,
    ) -> (
        Self,
        watch::Receiver<PlaybackView>,
        mpsc::UnboundedReceiver<ControllerEvent>,
    ) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut controller = Self {
            remote: deps.remote,
            local: deps.local,
            announcer: deps.announcer,
            shared: deps.shared,
            events_tx,
            view_tx: watch::channel(initial_view(settings)).0,
            settings,
            library: LibrarySnapshot::default(),
            selected_music: Vec::new(),
            selected_announcements: Vec::new(),
            zone_id: None,
            folder_id: None,
            music: MusicQueue::new(),
            rotation: AnnouncementRotation::new(),
            reconciler: PlaybackReconciler::new(),
            phase: Phase::Stopped,
            countdown: 0,
            elapsed: 0,
            countdown_timer: None,
            elapsed_timer: None,
            generation: 0,
            degraded: false,
            session_id: None,
        };
        let view_rx = controller.view_tx.subscribe();
        controller.publish_view();
        (controller, view_rx, events_rx)
    }

    /// Event loop; returns when every command sender is gone
    pub(super) async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut events: mpsc::UnboundedReceiver<ControllerEvent>,
    ) {
        let mut remote_rx = self.shared.subscribe_remote();
        let mut local_playing_rx = self.local.playing();
        let mut local_events = self.local.subscribe();
        let mut remote_open = true;
        let mut local_playing_open = true;
        let mut local_events_open = true;

        self.reconciler
            .set_remote(remote_rx.borrow_and_update().clone());
        self.reconciler
            .set_local_playing(*local_playing_rx.borrow_and_update());
        self.publish_view();

        info!("Playback controller started");

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                Some(event) = events.recv() => self.handle_event(event),
                _ = next_tick(&mut self.countdown_timer) => self.on_countdown_tick(),
                _ = next_tick(&mut self.elapsed_timer) => self.on_elapsed_tick(),
                changed = remote_rx.changed(), if remote_open => match changed {
                    Ok(()) => {
                        let state = remote_rx.borrow_and_update().clone();
                        debug!("Remote playback state: {:?}", state.state);
                        self.reconciler.set_remote(state);
                    }
                    Err(_) => remote_open = false,
                },
                changed = local_playing_rx.changed(), if local_playing_open => match changed {
                    Ok(()) => {
                        let playing = *local_playing_rx.borrow_and_update();
                        self.reconciler.set_local_playing(playing);
                    }
                    Err(_) => local_playing_open = false,
                },
                event = local_events.recv(), if local_events_open => match event {
                    Ok(LocalPlayerEvent::TrackEnded { track_id }) => {
                        self.on_track_ended(track_id).await
                    }
                    Err(RecvError::Lagged(n)) => warn!("Missed {} local player events", n),
                    Err(RecvError::Closed) => local_events_open = false,
                },
            }
            self.publish_view();
        }

        self.phase.transition(Phase::Stopped);
        self.clear_clocks();
        info!("Playback controller shut down");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start { reply } => {
                let result = self.start().await;
                self.publish_view();
                let _ = reply.send(result);
            }
            Command::Stop { reply } => {
                self.stop().await;
                self.publish_view();
                let _ = reply.send(());
            }
            Command::SkipToAnnouncement { reply } => {
                let started = self.skip_to_announcement();
                self.publish_view();
                let _ = reply.send(started);
            }
            Command::TogglePlayPause { reply } => {
                let result = self.toggle_play_pause().await;
                let _ = reply.send(result);
            }
            Command::SetLibrary { library, reply } => {
                let previous = self.current_music_id();
                self.set_library(library);
                self.follow_music_change(previous).await;
                self.publish_view();
                let _ = reply.send(());
            }
            Command::SetSelection {
                music_ids,
                announcement_ids,
                reply,
            } => {
                let previous = self.current_music_id();
                self.set_selection(music_ids, announcement_ids);
                self.follow_music_change(previous).await;
                self.publish_view();
                let _ = reply.send(());
            }
            Command::SetZone { zone_id, reply } => {
                let result = self.set_zone(zone_id);
                self.publish_view();
                let _ = reply.send(result);
            }
            Command::SetFolderFilter { folder_id, reply } => {
                self.set_folder_filter(folder_id);
                self.publish_view();
                let _ = reply.send(());
            }
            Command::UpdateSettings { request, reply } => {
                let effective = self.update_settings(&request);
                self.publish_view();
                let _ = reply.send(effective);
            }
        }
    }

    fn handle_event(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::FadeFinished { generation } => self.on_fade_finished(generation),
            ControllerEvent::ClipPlayResult { generation, result } => {
                self.on_clip_play_result(generation, result)
            }
            ControllerEvent::ClipEnded { generation } => self.on_clip_ended(generation),
            ControllerEvent::ClipFailed {
                generation,
                message,
            } => self.on_clip_failed(generation, message),
        }
    }

    // ------------------------------------------------------------------
    // Session lifecycle
    // ------------------------------------------------------------------

    async fn start(&mut self) -> Result<StartOutcome> {
        if !self.phase.is_stopped() {
            info!("Start requested while {}; ignoring", self.phase.label());
            return Ok(StartOutcome {
                already_running: true,
                remote_error: None,
            });
        }

        if self.music.is_empty() {
            return Err(self.reject("Please select at least one music track"));
        }
        let zone_id = match self.zone_id.clone() {
            Some(zone) if self.zone_is_known(&zone) => zone,
            _ => return Err(self.reject("Please select a valid zone")),
        };

        let request = PlayRequest::music_files(zone_id.clone(), self.music.ids());
        let remote_error = match self.remote.play(&request).await {
            Ok(()) => None,
            Err(e) => {
                warn!("Backend play failed, continuing in preview-only mode: {}", e);
                self.notify(NoticeLevel::Error, format!("Failed to start playback: {}", e));
                Some(e.to_string())
            }
        };

        self.degraded = remote_error.is_some();
        self.reconciler.set_preview_started(true);
        self.rotation.reset();
        self.countdown = if self.rotation.is_empty() {
            0
        } else {
            self.settings.announcement_interval_seconds
        };
        self.elapsed = 0;
        self.countdown_timer = Some(second_clock());
        self.elapsed_timer = Some(second_clock());
        let session_id = Uuid::new_v4();
        self.session_id = Some(session_id);
        self.set_phase(Phase::Playing);

        self.local.set_volume(FULL_VOLUME);
        if let Some(track) = self.music.current().cloned() {
            self.play_local(&LocalTrack::from(&track)).await;
        }

        info!(
            zone_id = %zone_id,
            music = self.music.len(),
            announcements = self.rotation.len(),
            "Playback started"
        );
        let zone_name = self.zone_name(&zone_id);
        self.notify(
            NoticeLevel::Success,
            format!("Playback started on {}", zone_name),
        );
        self.shared.broadcast_event(ZonecastEvent::PlaybackStarted {
            session_id,
            zone_id,
            music_count: self.music.len(),
            announcement_count: self.rotation.len(),
            remote_ok: remote_error.is_none(),
            timestamp: chrono::Utc::now(),
        });

        Ok(StartOutcome {
            already_running: false,
            remote_error,
        })
    }

    async fn stop(&mut self) {
        let was_running = !self.phase.is_stopped();

        // Everything below runs with no timer alive
        self.generation += 1;
        self.set_phase(Phase::Stopped);
        self.clear_clocks();
        self.countdown = 0;
        self.elapsed = 0;
        self.session_id = None;
        self.degraded = false;
        self.reconciler.set_preview_started(false);
        self.reconciler.set_local_playing(false);

        self.local.pause();
        self.local.set_volume(FULL_VOLUME);
        self.announcer.stop();

        if let Some(zone_id) = self.zone_id.clone() {
            if let Err(e) = self.remote.pause(&zone_id).await {
                warn!("Backend pause failed: {}", e);
                self.notify(NoticeLevel::Error, format!("Failed to stop playback: {}", e));
            }
        }

        if was_running {
            info!("Playback stopped");
            self.notify(NoticeLevel::Info, "Playback stopped");
            self.shared.broadcast_event(ZonecastEvent::PlaybackStopped {
                timestamp: chrono::Utc::now(),
            });
        } else {
            debug!("Stop requested while already stopped");
        }
    }

    async fn toggle_play_pause(&mut self) -> Result<bool> {
        let zone_id = self
            .zone_id
            .clone()
            .ok_or_else(|| Error::Validation("Please select a valid zone".to_string()))?;
        let playing = self.reconciler.remote_playing();

        match self.remote.play_pause(&zone_id, playing).await {
            Ok(()) => {
                info!(zone_id = %zone_id, "Backend playback toggled (was playing: {})", playing);
                Ok(!playing)
            }
            Err(e) => {
                warn!("Backend play/pause failed: {}", e);
                self.notify(NoticeLevel::Error, format!("Failed to toggle playback: {}", e));
                Err(e)
            }
        }
    }

    // ------------------------------------------------------------------
    // Clocks
    // ------------------------------------------------------------------

    fn clocks_may_run(&self) -> bool {
        self.reconciler
            .clocks_may_run(self.phase.label(), self.rotation.is_empty())
    }

    fn on_countdown_tick(&mut self) {
        if !self.clocks_may_run() {
            return;
        }

        if self.countdown <= 1 {
            self.countdown = 0;
            self.emit_tick();
            debug!("Countdown expired");
            self.begin_announcement();
        } else {
            self.countdown -= 1;
            self.emit_tick();
        }
    }

    fn on_elapsed_tick(&mut self) {
        if self.clocks_may_run() {
            self.elapsed += 1;
        }
    }

    fn emit_tick(&self) {
        self.shared.broadcast_event(ZonecastEvent::CountdownTick {
            seconds_remaining: self.countdown,
            elapsed_seconds: self.elapsed,
            timestamp: chrono::Utc::now(),
        });
    }

    fn clear_clocks(&mut self) {
        self.countdown_timer = None;
        self.elapsed_timer = None;
    }

    // ------------------------------------------------------------------
    // Music queue
    // ------------------------------------------------------------------

    async fn on_track_ended(&mut self, track_id: String) {
        let phase = self.phase.label();
        if !self.reconciler.is_effectively_playing() || phase == PlaybackPhase::Stopped {
            debug!("Track {} ended during {}; not advancing", track_id, phase);
            return;
        }
        if self.music.current().map(|t| t.id != track_id).unwrap_or(true) {
            debug!("Ignoring end of non-current track {}", track_id);
            return;
        }

        let Some(next) = self.music.advance().cloned() else {
            return;
        };

        if let Some(zone_id) = self.zone_id.clone() {
            let remote = self.remote.clone();
            tokio::spawn(async move {
                if let Err(e) = remote.next(&zone_id).await {
                    warn!("Backend next failed: {}", e);
                }
            });
        }

        // Outside Playing the duck level or a running fade owns the volume
        if phase == PlaybackPhase::Playing {
            self.local.set_volume(FULL_VOLUME);
        }
        self.play_local(&LocalTrack::from(&next)).await;

        info!("Music advanced to '{}' ({})", next.name, self.music.index());
        self.shared.broadcast_event(ZonecastEvent::MusicTrackChanged {
            track_id: next.id.clone(),
            index: self.music.index(),
            timestamp: chrono::Utc::now(),
        });
    }

    /// Start the new current track if a rebuild moved the cursor off `previous`
    ///
    /// Without this the local player keeps playing a track that is no longer
    /// current, and its end event would be ignored.
    async fn follow_music_change(&mut self, previous: Option<String>) {
        if self.phase.is_stopped() {
            return;
        }
        let Some(track) = self.music.current().cloned() else {
            return;
        };
        if previous.as_deref() == Some(track.id.as_str()) {
            return;
        }

        info!("Current track changed to '{}'; starting it locally", track.name);
        self.play_local(&LocalTrack::from(&track)).await;
        self.shared.broadcast_event(ZonecastEvent::MusicTrackChanged {
            track_id: track.id.clone(),
            index: self.music.index(),
            timestamp: chrono::Utc::now(),
        });
    }

    /// Best-effort local playback; the backend is authoritative
    async fn play_local(&self, track: &LocalTrack) {
        if let Err(e) = self.local.play(track).await {
            warn!("Local preview of '{}' failed: {}", track.title, e);
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// Replace the phase, cancelling the old phase's timers
    pub(super) fn set_phase(&mut self, next: Phase) {
        let new_phase = next.label();
        let old_phase = self.phase.transition(next);
        if old_phase != new_phase {
            debug!("Phase {} -> {}", old_phase, new_phase);
            self.shared.broadcast_event(ZonecastEvent::PhaseChanged {
                old_phase,
                new_phase,
                timestamp: chrono::Utc::now(),
            });
        }
    }

    fn current_music_id(&self) -> Option<String> {
        self.music.current().map(|t| t.id.clone())
    }

    pub(super) fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        self.shared
            .broadcast_event(ZonecastEvent::notice(level, message));
    }

    fn reject(&self, message: &str) -> Error {
        warn!("Start rejected: {}", message);
        self.notify(NoticeLevel::Warning, message);
        Error::Validation(message.to_string())
    }

    /// A zone is valid if the library lists it (any zone while none are loaded)
    pub(super) fn zone_is_known(&self, zone_id: &str) -> bool {
        !zone_id.trim().is_empty()
            && (self.library.zones.is_empty()
                || self.library.zones.iter().any(|z| z.id == zone_id))
    }

    fn zone_name(&self, zone_id: &str) -> String {
        self.library
            .zones
            .iter()
            .find(|z| z.id == zone_id)
            .map(|z| z.name.clone())
            .unwrap_or_else(|| zone_id.to_string())
    }

    pub(super) fn publish_view(&self) {
        let phase = self.phase.label();
        let view = PlaybackView {
            phase,
            is_playing: self.reconciler.is_effectively_playing(),
            is_playing_announcement: phase.is_announcement_sequence(),
            current_music: self.music.current().cloned(),
            next_announcement: self.rotation.current().cloned(),
            time_until_next_announcement: self.countdown,
            time_until_next_display: format_clock(self.countdown as u64),
            elapsed_time: self.elapsed,
            elapsed_display: format_clock(self.elapsed),
            current_music_index: self.music.index(),
            current_announcement_index: self.rotation.index(),
            music_count: self.music.len(),
            announcement_count: self.rotation.len(),
            music_volume: self.local.volume(),
            degraded: self.degraded,
            zone_id: self.zone_id.clone(),
            folder_id: self.folder_id.clone(),
            session_id: self.session_id,
            settings: self.settings,
        };
        self.view_tx.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
    }
}

fn initial_view(settings: ControllerSettings) -> PlaybackView {
    PlaybackView {
        phase: PlaybackPhase::Stopped,
        is_playing: false,
        is_playing_announcement: false,
        current_music: None,
        next_announcement: None,
        time_until_next_announcement: 0,
        time_until_next_display: format_clock(0),
        elapsed_time: 0,
        elapsed_display: format_clock(0),
        current_music_index: 0,
        current_announcement_index: 0,
        music_count: 0,
        announcement_count: 0,
        music_volume: FULL_VOLUME,
        degraded: false,
        zone_id: None,
        folder_id: None,
        session_id: None,
        settings,
    }
}

/// One-second clock whose first tick is one period from now
fn second_clock() -> Interval {
    let mut clock = tokio::time::interval_at(Instant::now() + CLOCK_PERIOD, CLOCK_PERIOD);
    clock.set_missed_tick_behavior(MissedTickBehavior::Delay);
    clock
}

/// Next tick of an optional clock; pending forever when there is none
async fn next_tick(clock: &mut Option<Interval>) {
    match clock {
        Some(clock) => {
            clock.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
