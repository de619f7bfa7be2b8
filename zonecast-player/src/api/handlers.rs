//! HTTP request handlers
//!
//! Thin adapters over [`ControllerHandle`](crate::playback::ControllerHandle)
//! commands. Errors map to status codes as follows:
//! - `Validation` -> 422
//! - `RemoteApi` -> 502
//! - `ControllerUnavailable` -> 503
//! - anything else -> 500

use crate::api::server::AppContext;
use crate::config::{ControllerSettings, SettingsRequest};
use crate::error::Error;
use crate::playback::{PlaybackView, StartOutcome};
use crate::services::LibrarySnapshot;
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use zonecast_common::events::RemotePlaybackState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusResponse {
    fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            message: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    #[serde(flatten)]
    outcome: StartOutcome,
    view: PlaybackView,
}

#[derive(Debug, Serialize)]
pub struct SkipResponse {
    started: bool,
    view: PlaybackView,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    playing: bool,
}

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    #[serde(default, alias = "selectedMusicIds")]
    music_ids: Vec<String>,
    #[serde(default, alias = "selectedAnnouncementIds")]
    announcement_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ZoneRequest {
    #[serde(default, alias = "zoneId")]
    zone_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FolderRequest {
    #[serde(default, alias = "folderId")]
    folder_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LibraryResponse {
    tracks: usize,
    announcements: usize,
    zones: usize,
}

impl From<&LibrarySnapshot> for LibraryResponse {
    fn from(library: &LibrarySnapshot) -> Self {
        Self {
            tracks: library.tracks.len(),
            announcements: library.announcements.len(),
            zones: library.zones.len(),
        }
    }
}

type ApiError = (StatusCode, Json<StatusResponse>);

/// Map a controller error onto an HTTP error response
fn error_response(e: Error) -> ApiError {
    let status = match &e {
        Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::RemoteApi(_) => StatusCode::BAD_GATEWAY,
        Error::ControllerUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!("Request failed: {}", e);
    }
    (
        status,
        Json(StatusResponse {
            status: "error".to_string(),
            message: Some(e.to_string()),
        }),
    )
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "zonecast_player".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Session Control
// ============================================================================

/// GET /playback/state - Current view model
pub async fn get_playback_state(State(ctx): State<AppContext>) -> Json<PlaybackView> {
    Json(ctx.controller.view())
}

/// POST /playback/start
pub async fn start(State(ctx): State<AppContext>) -> Result<Json<StartResponse>, ApiError> {
    let outcome = ctx.controller.start().await.map_err(error_response)?;
    Ok(Json(StartResponse {
        outcome,
        view: ctx.controller.view(),
    }))
}

/// POST /playback/stop
pub async fn stop(State(ctx): State<AppContext>) -> Result<Json<PlaybackView>, ApiError> {
    ctx.controller.stop().await.map_err(error_response)?;
    Ok(Json(ctx.controller.view()))
}

/// POST /playback/announcement/skip - Play the next announcement now
pub async fn skip_announcement(
    State(ctx): State<AppContext>,
) -> Result<Json<SkipResponse>, ApiError> {
    let started = ctx
        .controller
        .skip_to_announcement()
        .await
        .map_err(error_response)?;
    Ok(Json(SkipResponse {
        started,
        view: ctx.controller.view(),
    }))
}

/// POST /playback/toggle - Backend play/pause toggle
pub async fn toggle(State(ctx): State<AppContext>) -> Result<Json<ToggleResponse>, ApiError> {
    let playing = ctx
        .controller
        .toggle_play_pause()
        .await
        .map_err(error_response)?;
    Ok(Json(ToggleResponse { playing }))
}

// ============================================================================
// Selection and Settings
// ============================================================================

/// PUT /playback/selection
pub async fn set_selection(
    State(ctx): State<AppContext>,
    Json(request): Json<SelectionRequest>,
) -> Result<Json<PlaybackView>, ApiError> {
    ctx.controller
        .set_selection(request.music_ids, request.announcement_ids)
        .await
        .map_err(error_response)?;
    Ok(Json(ctx.controller.view()))
}

/// PUT /playback/zone
pub async fn set_zone(
    State(ctx): State<AppContext>,
    Json(request): Json<ZoneRequest>,
) -> Result<Json<PlaybackView>, ApiError> {
    ctx.controller
        .set_zone(request.zone_id)
        .await
        .map_err(error_response)?;
    Ok(Json(ctx.controller.view()))
}

/// PUT /playback/folder - Announcement folder filter
pub async fn set_folder(
    State(ctx): State<AppContext>,
    Json(request): Json<FolderRequest>,
) -> Result<Json<PlaybackView>, ApiError> {
    ctx.controller
        .set_folder_filter(request.folder_id)
        .await
        .map_err(error_response)?;
    Ok(Json(ctx.controller.view()))
}

/// GET /playback/settings
pub async fn get_settings(State(ctx): State<AppContext>) -> Json<ControllerSettings> {
    Json(ctx.controller.view().settings)
}

/// PUT /playback/settings - Partial update; out-of-range values are clamped
pub async fn update_settings(
    State(ctx): State<AppContext>,
    Json(request): Json<SettingsRequest>,
) -> Result<Json<ControllerSettings>, ApiError> {
    let settings = ctx
        .controller
        .update_settings(request)
        .await
        .map_err(error_response)?;
    Ok(Json(settings))
}

// ============================================================================
// Library
// ============================================================================

/// PUT /library - Replace the library
pub async fn set_library(
    State(ctx): State<AppContext>,
    Json(library): Json<LibrarySnapshot>,
) -> Result<Json<LibraryResponse>, ApiError> {
    let response = LibraryResponse::from(&library);
    ctx.controller
        .set_library(library)
        .await
        .map_err(error_response)?;
    Ok(Json(response))
}

/// POST /library/refresh - Reload the library from the backend catalog
pub async fn refresh_library(
    State(ctx): State<AppContext>,
) -> Result<Json<LibraryResponse>, ApiError> {
    let Some(catalog) = ctx.catalog.clone() else {
        return Err(error_response(Error::Config(
            "No backend catalog configured".to_string(),
        )));
    };

    let library = catalog.snapshot().await.map_err(|e| {
        warn!("Library refresh failed: {}", e);
        error_response(e)
    })?;
    let response = LibraryResponse::from(&library);
    ctx.controller
        .set_library(library)
        .await
        .map_err(error_response)?;

    info!(
        "Library refreshed: {} tracks, {} announcements, {} zones",
        response.tracks, response.announcements, response.zones
    );
    Ok(Json(response))
}

// ============================================================================
// Backend State Bridge
// ============================================================================

/// POST /remote/state - Backend pushes its live playback state
pub async fn push_remote_state(
    State(ctx): State<AppContext>,
    Json(state): Json<RemotePlaybackState>,
) -> Json<StatusResponse> {
    ctx.state.set_remote_state(state);
    Json(StatusResponse::ok())
}
