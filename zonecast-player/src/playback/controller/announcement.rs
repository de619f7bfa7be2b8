//! Duck -> play -> restore sequence
//!
//! 1. `Ducking`: fade the local music from full volume to the background
//!    level.
//! 2. When that fade completes, load the announcement at the rotation
//!    cursor. No playable URL aborts the sequence. Otherwise the clip starts
//!    and the volume monitor holds its gain (`AnnouncementPlaying`).
//! 3. On the clip's natural end: `Restoring`, the mirrored fade back to
//!    full volume, rotation advance and countdown reset. The restore fade's
//!    completion returns to `Playing`.
//! 4. On a media error: straight back to `Playing` with full volume set
//!    immediately, countdown reset and the rotation left on the failed
//!    entry so it is retried next cycle.

use super::actor::{Controller, ControllerEvent};
use crate::config::FULL_VOLUME;
use crate::playback::fader::VolumeRamp;
use crate::playback::phase::Phase;
use crate::playback::timers::{TaskGuard, VolumeMonitor};
use crate::services::{AnnouncementClip, ClipEvent};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use zonecast_common::events::{NoticeLevel, PlaybackPhase, ZonecastEvent};
use zonecast_common::Announcement;

const NO_PLAYABLE_URL: &str =
    "Selected announcement has no playable URL. Upload an announcement audio first.";
const PLAYBACK_FAILED: &str = "Failed to play announcement audio";

impl Controller {
    /// Manual "play announcement now"
    pub(super) fn skip_to_announcement(&mut self) -> bool {
        if !self.reconciler.is_effectively_playing()
            || self.phase.label() != PlaybackPhase::Playing
            || self.rotation.is_empty()
        {
            debug!(
                "Skip ignored (playing: {}, phase: {}, rotation: {})",
                self.reconciler.is_effectively_playing(),
                self.phase.label(),
                self.rotation.len()
            );
            return false;
        }

        info!("Announcement requested manually");
        self.begin_announcement();
        true
    }

    /// Start ducking the music for the announcement at the rotation cursor
    pub(super) fn begin_announcement(&mut self) {
        if self.phase.label() != PlaybackPhase::Playing || self.rotation.is_empty() {
            return;
        }

        self.generation += 1;
        let generation = self.generation;
        let local = self.local.clone();
        let events_tx = self.events_tx.clone();

        let fade = self.duck_ramp().spawn(
            move |volume| local.set_volume(volume),
            move || {
                let _ = events_tx.send(ControllerEvent::FadeFinished { generation });
            },
        );

        info!(
            "Ducking music to {}% over {:.1}s",
            self.settings.background_volume_percent, self.settings.fade_duration_seconds
        );
        self.set_phase(Phase::Ducking { fade });
    }

    pub(super) fn on_fade_finished(&mut self, generation: u64) {
        if generation != self.generation {
            debug!("Ignoring stale fade completion ({})", generation);
            return;
        }

        match self.phase.label() {
            PlaybackPhase::Ducking => self.play_current_announcement(),
            PlaybackPhase::Restoring => {
                debug!("Music restored to full volume");
                self.set_phase(Phase::Playing);
            }
            other => debug!("Fade completed during {}; nothing to do", other),
        }
    }

    fn play_current_announcement(&mut self) {
        let Some(announcement) = self.rotation.current().cloned() else {
            self.abort_sequence(None, "Announcement rotation is empty", NO_PLAYABLE_URL);
            return;
        };
        let Some(url) = announcement.playable_url().map(str::to_string) else {
            warn!("Announcement '{}' has no playable URL", announcement.title);
            self.abort_sequence(Some(&announcement), "No playable URL", NO_PLAYABLE_URL);
            return;
        };

        let generation = self.generation;
        let listener = self.listen_for_clip_events(generation);

        let clip = AnnouncementClip {
            id: announcement.id.clone(),
            url,
            duration: announcement.duration,
        };
        if let Err(e) = self.announcer.load(&clip) {
            warn!("Cannot load announcement '{}': {}", announcement.title, e);
            self.fail_announcement(&announcement, e.to_string());
            return;
        }

        let gain = self.settings.announcement_gain();
        self.announcer.set_volume(gain);
        let monitor = VolumeMonitor::start(self.announcer.clone(), gain);

        let announcer = self.announcer.clone();
        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = announcer.play().await.map_err(|e| e.to_string());
            let _ = events_tx.send(ControllerEvent::ClipPlayResult { generation, result });
        });

        info!(
            "Playing announcement '{}' at {:.2} gain",
            announcement.title, gain
        );
        self.notify(
            NoticeLevel::Info,
            format!("Playing announcement: {}", announcement.title),
        );
        self.shared
            .broadcast_event(ZonecastEvent::AnnouncementStarted {
                announcement_id: announcement.id.clone(),
                title: announcement.title.clone(),
                background_volume: self.settings.background_volume_percent,
                timestamp: chrono::Utc::now(),
            });

        self.set_phase(Phase::AnnouncementPlaying {
            announcement,
            monitor,
            listener,
        });
    }

    /// Forward the output's clip events, tagged with `generation`
    fn listen_for_clip_events(&self, generation: u64) -> TaskGuard {
        let mut clip_events = self.announcer.subscribe();
        let events_tx = self.events_tx.clone();

        TaskGuard::spawn(move |gate| async move {
            loop {
                let event = match clip_events.recv().await {
                    Ok(ClipEvent::Ended) => ControllerEvent::ClipEnded { generation },
                    Ok(ClipEvent::Error(message)) => ControllerEvent::ClipFailed {
                        generation,
                        message,
                    },
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                };
                if gate.run(|| events_tx.send(event)).is_none() {
                    break;
                }
            }
        })
    }

    pub(super) fn on_clip_play_result(
        &mut self,
        generation: u64,
        result: std::result::Result<(), String>,
    ) {
        let current = generation == self.generation
            && self.phase.label() == PlaybackPhase::AnnouncementPlaying;

        if !current {
            if result.is_ok() && self.phase.label() != PlaybackPhase::AnnouncementPlaying {
                // The sequence was abandoned while play() was pending
                debug!("Stopping late-starting announcement ({})", generation);
                self.announcer.stop();
            }
            return;
        }

        match result {
            Ok(()) => {
                // Some outputs reset gain when playback starts
                self.announcer.set_volume(self.settings.announcement_gain());
            }
            Err(message) => {
                if let Some(announcement) = self.phase.announcement().cloned() {
                    warn!("Announcement '{}' failed to start: {}", announcement.title, message);
                    self.fail_announcement(&announcement, message);
                }
            }
        }
    }

    pub(super) fn on_clip_ended(&mut self, generation: u64) {
        if generation != self.generation {
            debug!("Ignoring stale clip end ({})", generation);
            return;
        }
        let Some(announcement) = self.phase.announcement().cloned() else {
            return;
        };

        let local = self.local.clone();
        let events_tx = self.events_tx.clone();
        let fade = self.duck_ramp().reversed().spawn(
            move |volume| local.set_volume(volume),
            move || {
                let _ = events_tx.send(ControllerEvent::FadeFinished { generation });
            },
        );
        self.set_phase(Phase::Restoring { fade });

        self.rotation.advance();
        self.countdown = self.settings.announcement_interval_seconds;

        info!(
            "Announcement '{}' finished; next rotation index {}",
            announcement.title,
            self.rotation.index()
        );
        self.shared
            .broadcast_event(ZonecastEvent::AnnouncementCompleted {
                announcement_id: announcement.id,
                next_index: self.rotation.index(),
                timestamp: chrono::Utc::now(),
            });
    }

    pub(super) fn on_clip_failed(&mut self, generation: u64, message: String) {
        if generation != self.generation {
            debug!("Ignoring stale clip error ({}): {}", generation, message);
            return;
        }
        if let Some(announcement) = self.phase.announcement().cloned() {
            warn!("Announcement '{}' playback error: {}", announcement.title, message);
            self.fail_announcement(&announcement, message);
        }
    }

    /// Media failure: back to music at full volume, same rotation entry
    fn fail_announcement(&mut self, announcement: &Announcement, reason: String) {
        self.announcer.stop();
        self.abort_sequence(Some(announcement), &reason, PLAYBACK_FAILED);
    }

    fn abort_sequence(&mut self, announcement: Option<&Announcement>, reason: &str, notice: &str) {
        // Leaving the phase drops the monitor and listener
        self.set_phase(Phase::Playing);
        self.local.set_volume(FULL_VOLUME);
        self.countdown = self.settings.announcement_interval_seconds;

        self.notify(NoticeLevel::Error, notice);
        self.shared
            .broadcast_event(ZonecastEvent::AnnouncementFailed {
                announcement_id: announcement.map(|a| a.id.clone()),
                reason: reason.to_string(),
                timestamp: chrono::Utc::now(),
            });
    }

    fn duck_ramp(&self) -> VolumeRamp {
        VolumeRamp::new(
            FULL_VOLUME,
            self.settings.background_volume_percent,
            self.settings.fade_duration(),
        )
    }
}
