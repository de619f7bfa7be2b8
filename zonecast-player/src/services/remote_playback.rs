//! Backend playback control
//!
//! The backend is the source of truth for what listeners in a zone hear.
//! The controller drives it through [`RemotePlayback`]; failures are reported
//! to the user but never stop the local state machine.

use crate::error::Result;
use crate::services::backend::BackendClient;
use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

/// Body of a backend play request
///
/// When `music_file_ids` is non-empty the backend plays exactly those files
/// and ignores `playlist_ids`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayRequest {
    pub zone_id: String,
    pub shuffle: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub music_file_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub playlist_ids: Vec<String>,
}

impl PlayRequest {
    /// Play an explicit list of music files, unshuffled
    pub fn music_files(zone_id: impl Into<String>, music_file_ids: Vec<String>) -> Self {
        Self {
            zone_id: zone_id.into(),
            shuffle: false,
            music_file_ids,
            playlist_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ZoneRequest<'a> {
    zone_id: &'a str,
}

/// Backend playback control operations
#[async_trait]
pub trait RemotePlayback: Send + Sync {
    /// Begin playing music in a zone
    async fn play(&self, request: &PlayRequest) -> Result<()>;

    /// Pause a zone
    async fn pause(&self, zone_id: &str) -> Result<()>;

    /// Resume a paused zone
    async fn resume(&self, zone_id: &str) -> Result<()>;

    /// Skip to the next track in a zone
    async fn next(&self, zone_id: &str) -> Result<()>;

    /// Toggle a zone between playing and paused
    async fn play_pause(&self, zone_id: &str, currently_playing: bool) -> Result<()> {
        if currently_playing {
            self.pause(zone_id).await
        } else {
            self.resume(zone_id).await
        }
    }
}

/// REST implementation of [`RemotePlayback`]
#[derive(Debug, Clone)]
pub struct HttpPlaybackApi {
    client: BackendClient,
}

impl HttpPlaybackApi {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    async fn control(&self, action: &str, zone_id: &str) -> Result<()> {
        info!(zone_id = %zone_id, "Backend playback {}", action);
        self.client
            .post_json(
                &format!("/playback/control/{}/", action),
                &ZoneRequest { zone_id },
            )
            .await
    }
}

#[async_trait]
impl RemotePlayback for HttpPlaybackApi {
    async fn play(&self, request: &PlayRequest) -> Result<()> {
        info!(
            zone_id = %request.zone_id,
            tracks = request.music_file_ids.len(),
            "Backend playback play"
        );
        self.client.post_json("/playback/control/play/", request).await
    }

    async fn pause(&self, zone_id: &str) -> Result<()> {
        self.control("pause", zone_id).await
    }

    async fn resume(&self, zone_id: &str) -> Result<()> {
        self.control("resume", zone_id).await
    }

    async fn next(&self, zone_id: &str) -> Result<()> {
        self.control("next", zone_id).await
    }
}
