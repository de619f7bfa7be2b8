//! Library, selection, filter and settings updates

use super::actor::Controller;
use crate::config::{ControllerSettings, SettingsRequest};
use crate::error::{Error, Result};
use crate::playback::rotation::RotationFilter;
use crate::services::LibrarySnapshot;
use tracing::{debug, info};
use zonecast_common::events::PlaybackPhase;

impl Controller {
    pub(super) fn set_library(&mut self, library: LibrarySnapshot) {
        info!(
            "Library updated: {} tracks, {} announcements, {} zones",
            library.tracks.len(),
            library.announcements.len(),
            library.zones.len()
        );
        self.library = library;
        self.rebuild_queues();
    }

    pub(super) fn set_selection(&mut self, music_ids: Vec<String>, announcement_ids: Vec<String>) {
        debug!(
            "Selection: {} music, {} announcements",
            music_ids.len(),
            announcement_ids.len()
        );
        self.selected_music = dedup(music_ids);
        self.selected_announcements = dedup(announcement_ids);
        self.rebuild_queues();
    }

    pub(super) fn set_zone(&mut self, zone_id: Option<String>) -> Result<()> {
        let zone_id = zone_id.filter(|z| !z.trim().is_empty());
        if let Some(zone) = zone_id.as_deref() {
            if !self.zone_is_known(zone) {
                return Err(Error::Validation("Please select a valid zone".to_string()));
            }
        }
        if zone_id == self.zone_id {
            return Ok(());
        }

        info!("Zone selected: {:?}", zone_id);
        self.zone_id = zone_id;
        self.rebuild_queues();
        Ok(())
    }

    pub(super) fn set_folder_filter(&mut self, folder_id: Option<String>) {
        let folder_id = folder_id.filter(|f| !f.trim().is_empty());
        if folder_id == self.folder_id {
            return;
        }
        info!("Announcement folder filter: {:?}", folder_id);
        self.folder_id = folder_id;
        self.rebuild_queues();
    }

    pub(super) fn update_settings(&mut self, request: &SettingsRequest) -> ControllerSettings {
        let old = self.settings;
        let new = old.merged(request);
        self.settings = new;

        if !self.phase.is_stopped() && self.countdown > new.announcement_interval_seconds {
            self.countdown = new.announcement_interval_seconds;
        }

        if new.announcement_volume_percent != old.announcement_volume_percent {
            if let Some(monitor) = self.phase.monitor() {
                let gain = new.announcement_gain();
                monitor.retarget(gain);
                self.announcer.set_volume(gain);
            }
        }

        if new != old {
            info!(
                "Settings: interval {}s, fade {:.1}s, background {}%, announcement {}%",
                new.announcement_interval_seconds,
                new.fade_duration_seconds,
                new.background_volume_percent,
                new.announcement_volume_percent
            );
        }
        new
    }

    fn rotation_filter(&self) -> RotationFilter {
        RotationFilter {
            zone_id: self.zone_id.clone(),
            folder_id: self.folder_id.clone(),
        }
    }

    /// Rebuild music queue and rotation after any input change
    ///
    /// The rotation cursor always returns to 0.
    fn rebuild_queues(&mut self) {
        self.music
            .rebuild(&self.library.tracks, &self.selected_music);
        let filter = self.rotation_filter();
        self.rotation.rebuild(
            &self.library.announcements,
            &self.selected_announcements,
            &filter,
        );

        if self.phase.label() == PlaybackPhase::Playing {
            if self.rotation.is_empty() {
                self.countdown = 0;
            } else if self.countdown == 0 {
                self.countdown = self.settings.announcement_interval_seconds;
                debug!("Countdown armed at {}s", self.countdown);
            }
        }
    }
}

/// Drop repeated ids, keeping first occurrences in order
fn dedup(ids: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_keeps_order() {
        let ids = vec!["b", "a", "b", "c", "a"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(dedup(ids), vec!["b", "a", "c"]);
    }
}
