//! Library models shared between the controller and the backend catalog
//!
//! The backend serves snake_case JSON while older dashboard payloads use
//! camelCase; both spellings are accepted on input.

use serde::{Deserialize, Serialize};

/// File extensions accepted as playable audio
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "aac", "ogg", "flac"];

/// Music asset owned by the music library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,

    #[serde(alias = "title")]
    pub name: String,

    #[serde(default, alias = "file_url")]
    pub url: Option<String>,

    /// Duration in seconds (0 when unknown)
    #[serde(default, alias = "duration_seconds")]
    pub duration: f64,

    #[serde(default, alias = "zoneId")]
    pub zone_id: Option<String>,
}

/// Announcement clip owned by the announcements library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: String,

    pub title: String,

    #[serde(default, alias = "file_url")]
    pub url: Option<String>,

    /// Duration in seconds (0 when unknown)
    #[serde(default)]
    pub duration: f64,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Folder (category) the announcement is filed under
    #[serde(default, alias = "folderId")]
    pub folder_id: Option<String>,

    #[serde(default, alias = "zoneId")]
    pub zone_id: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl Announcement {
    /// URL the clip can be played from, or None when the announcement is
    /// unplayable (missing, blank, or not an audio file)
    pub fn playable_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| is_audio_url(url))
    }

    /// Whether the announcement applies to the given zone
    ///
    /// Announcements without a zone apply everywhere.
    pub fn in_zone(&self, zone_id: Option<&str>) -> bool {
        match (zone_id, self.zone_id.as_deref()) {
            (None, _) | (_, None) => true,
            (Some(wanted), Some(own)) => wanted == own,
        }
    }
}

/// Physical playback location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
}

/// Check whether a URL points at a supported audio file
///
/// Query strings and fragments (e.g. presigned storage URLs) are ignored and
/// the extension comparison is case-insensitive.
pub fn is_audio_url(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or_default().trim();
    if path.is_empty() {
        return false;
    }

    path.rsplit_once('.')
        .map(|(_, ext)| {
            let ext = ext.to_ascii_lowercase();
            AUDIO_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}
