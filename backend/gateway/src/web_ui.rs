//! Embedded upload UI.

use axum::response::Html;
use axum::routing::get;
use axum::Router;

use crate::server::GatewayState;

/// Router serving the single-page upload UI at `/`.
pub fn ui_router() -> Router<GatewayState> {
    Router::new().route("/", get(index))
}

async fn index() -> Html<&'static str> {
    Html(include_str!("../assets/index.html"))
}
