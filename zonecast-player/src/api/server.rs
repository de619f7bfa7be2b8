//! HTTP server setup and routing

use crate::error::Result;
use crate::playback::ControllerHandle;
use crate::services::Catalog;
use crate::state::SharedState;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub state: Arc<SharedState>,
    pub controller: ControllerHandle,
    /// Backend catalog for `/library/refresh` (None when not configured)
    pub catalog: Option<Arc<dyn Catalog>>,
}

/// Build the router with all routes
pub fn build_router(ctx: AppContext) -> Router {
    use super::handlers;

    Router::new()
        // Health endpoint
        .route("/health", get(handlers::health))

        // Session control
        .route("/playback/state", get(handlers::get_playback_state))
        .route("/playback/start", post(handlers::start))
        .route("/playback/stop", post(handlers::stop))
        .route("/playback/announcement/skip", post(handlers::skip_announcement))
        .route("/playback/toggle", post(handlers::toggle))

        // Selection and settings
        .route("/playback/selection", put(handlers::set_selection))
        .route("/playback/zone", put(handlers::set_zone))
        .route("/playback/folder", put(handlers::set_folder))
        .route(
            "/playback/settings",
            get(handlers::get_settings).put(handlers::update_settings),
        )

        // Library
        .route("/library", put(handlers::set_library))
        .route("/library/refresh", post(handlers::refresh_library))

        // Backend live-state push bridge
        .route("/remote/state", post(handlers::push_remote_state))

        // SSE event stream
        .route("/events", get(super::sse::event_stream))

        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Run HTTP API server until `shutdown` resolves
pub async fn run(
    port: u16,
    ctx: AppContext,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = build_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
