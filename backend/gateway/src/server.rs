//! Main HTTP gateway server.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use refscope_core::OcrModel;

use crate::{ocr_api, web_ui};

/// Largest accepted request body; uploads are single document photos.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub model: Arc<dyn OcrModel>,
}

/// Build the gateway router. CORS is wide open, matching the service's
/// local-development deployment model.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/ocr", post(ocr_api::run_ocr))
        .route("/api/ocr/annotate", post(ocr_api::run_annotate))
        .route("/api/ocr/detections", post(ocr_api::run_detections))
        .merge(web_ui::ui_router())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the axum HTTP server for the gateway.
pub async fn start_server(addr: SocketAddr, state: GatewayState) -> Result<()> {
    let app = router(state);
    info!("gateway HTTP server listening on {}", addr);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
