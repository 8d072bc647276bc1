//! HTTP server for the EduSkill media endpoints
//!
//! Wires the delivery service, video catalog and playback endpoints into an
//! axum router. Stored files are reachable both through the streaming route
//! and the static `/uploads` alternate.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::routing::{get, post};
use eduskill_core::config::EduskillConfig;
use eduskill_core::{
    DeliveryService, InMemoryVideoCatalog, MediaRoot, PlaybackEndpoints, VideoCatalog,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::handlers::{
    api_catalog, api_delete_video, api_get_video, api_increment_view, api_list_videos, api_test,
    api_upload_test_video, stream_video,
};
use crate::static_files::uploads_router;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub delivery: DeliveryService,
    pub catalog: Arc<dyn VideoCatalog>,
    pub endpoints: PlaybackEndpoints,
    pub server_started_at: Instant,
}

impl AppState {
    /// Assemble state from explicit parts.
    pub fn new(
        delivery: DeliveryService,
        catalog: Arc<dyn VideoCatalog>,
        endpoints: PlaybackEndpoints,
    ) -> Self {
        Self {
            delivery,
            catalog,
            endpoints,
            server_started_at: Instant::now(),
        }
    }

    /// Prepare the media root and catalog described by `config`.
    ///
    /// Creates the `videos/` and `thumbnails/` directories when missing and
    /// seeds the in-memory catalog from the files already stored.
    ///
    /// # Errors
    /// - `std::io::Error` - Media root could not be created or read
    pub async fn from_config(config: &EduskillConfig) -> Result<Self, std::io::Error> {
        let root = MediaRoot::new(&config.media.media_root);
        root.ensure_layout().await?;

        let catalog = InMemoryVideoCatalog::scan(&root).await?;

        let delivery = DeliveryService::new(
            root,
            config.media.range_policy,
            config.media.stream_buffer_size,
        );
        let endpoints = PlaybackEndpoints::from_config(&config.playback);

        Ok(Self::new(delivery, Arc::new(catalog), endpoints))
    }

    /// Root directory all media is served from.
    pub fn media_root(&self) -> &MediaRoot {
        self.delivery.media_root()
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let uploads = uploads_router(state.media_root());

    Router::new()
        // Streaming
        .route("/video/{filename}", get(stream_video))
        // JSON API
        .route("/api/test", get(api_test))
        .route("/api/videos", get(api_list_videos))
        .route("/api/catalog", get(api_catalog))
        .route("/api/videos/{id}", get(api_get_video).delete(api_delete_video))
        .route("/api/videos/{id}/view", post(api_increment_view))
        .route("/api/upload-test-video", post(api_upload_test_video))
        // Static alternate
        .merge(uploads)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the router on an already bound listener until the process is
/// interrupted.
///
/// # Errors
/// - `std::io::Error` - Accept loop failed
pub async fn serve_on(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    let app = build_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

/// Bind the configured address and run the media server.
///
/// # Errors
/// - `std::io::Error` - Media root setup, bind, or accept loop failed
pub async fn run_server(config: EduskillConfig) -> Result<(), std::io::Error> {
    let state = AppState::from_config(&config).await?;
    let listener = TcpListener::bind(config.server.bind_addr()).await?;
    let addr = listener.local_addr()?;

    info!("Video server running on http://{addr}");
    info!("Serving media from {}", state.media_root().path().display());
    info!(
        "Range policy: {}, primary host: {}, backup host: {}",
        state.delivery.policy(),
        config.playback.primary_host,
        config.playback.backup_host
    );

    serve_on(listener, state).await?;
    info!("Video server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
