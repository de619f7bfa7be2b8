//! Announcement rotation queue
//!
//! Cyclic cursor over the selected announcements. The rotation is rebuilt
//! from the library whenever the selection, the library, the zone or the
//! folder filter changes; every rebuild resets the cursor to the first
//! entry so it can never point past a shorter list.
//!
//! Membership rules for a selected id:
//! - it resolves to an announcement in the library
//! - the announcement is enabled
//! - the announcement has no zone or belongs to the selected zone
//! - a folder filter, when set, matches the announcement's folder
//!
//! Announcements without a playable URL stay in the rotation; they are
//! rejected when their turn comes.

use zonecast_common::Announcement;

/// Zone and folder constraints applied when building the rotation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationFilter {
    pub zone_id: Option<String>,
    pub folder_id: Option<String>,
}

impl RotationFilter {
    /// Whether `announcement` passes the filter
    pub fn accepts(&self, announcement: &Announcement) -> bool {
        if !announcement.enabled || !announcement.in_zone(self.zone_id.as_deref()) {
            return false;
        }
        match self.folder_id.as_deref() {
            Some(folder) => announcement.folder_id.as_deref() == Some(folder),
            None => true,
        }
    }
}

/// Cyclic announcement rotation
#[derive(Debug, Clone, Default)]
pub struct AnnouncementRotation {
    entries: Vec<Announcement>,
    index: usize,
}

impl AnnouncementRotation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from the library in selection order; the cursor resets to 0
    pub fn rebuild(
        &mut self,
        library: &[Announcement],
        selected_ids: &[String],
        filter: &RotationFilter,
    ) {
        self.entries = selected_ids
            .iter()
            .filter_map(|id| library.iter().find(|a| &a.id == id))
            .filter(|a| filter.accepts(a))
            .cloned()
            .collect();
        self.index = 0;
    }

    /// Announcement at the cursor, or None if the rotation is empty
    pub fn current(&self) -> Option<&Announcement> {
        self.entries.get(self.index)
    }

    /// Move the cursor to the next entry, wrapping at the end
    ///
    /// No effect on an empty rotation.
    pub fn advance(&mut self) {
        if self.entries.is_empty() {
            self.index = 0;
            return;
        }
        self.index = (self.index + 1) % self.entries.len();
    }

    /// Return the cursor to the first entry
    pub fn reset(&mut self) {
        self.index = 0;
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids in rotation order
    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|a| a.id.clone()).collect()
    }
}
