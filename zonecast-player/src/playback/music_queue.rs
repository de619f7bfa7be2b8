//! Cyclic background-music queue
//!
//! Tracks play in selection order and wrap around at the end; the queue
//! never runs out.

use zonecast_common::Track;

/// Selected music tracks plus the current position
#[derive(Debug, Clone, Default)]
pub struct MusicQueue {
    tracks: Vec<Track>,
    index: usize,
}

impl MusicQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from the library in selection order
    ///
    /// Ids missing from the library are skipped. The cursor follows the
    /// current track when it is still selected; otherwise the index survives
    /// if still in range and falls back to 0 if not.
    pub fn rebuild(&mut self, library: &[Track], selected_ids: &[String]) {
        let current_id = self.current().map(|t| t.id.clone());
        self.tracks = selected_ids
            .iter()
            .filter_map(|id| library.iter().find(|t| &t.id == id))
            .cloned()
            .collect();

        let kept = current_id.and_then(|id| self.tracks.iter().position(|t| t.id == id));
        self.index = match kept {
            Some(position) => position,
            None if self.index < self.tracks.len() => self.index,
            None => 0,
        };
    }

    pub fn current(&self) -> Option<&Track> {
        self.tracks.get(self.index)
    }

    /// Step to the next track (wrapping) and return it
    pub fn advance(&mut self) -> Option<&Track> {
        if self.tracks.is_empty() {
            self.index = 0;
            return None;
        }
        self.index = (self.index + 1) % self.tracks.len();
        self.tracks.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Track ids in playback order
    pub fn ids(&self) -> Vec<String> {
        self.tracks.iter().map(|t| t.id.clone()).collect()
    }
}
