//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The editor is a static page; this server only answers link-preview
//! crawlers. Every route is a pure function of its query string, so any
//! origin may call it.

pub mod og_image;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/og-image", get(og_image::png))
        .route("/api/og-image.svg", get(og_image::svg))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
