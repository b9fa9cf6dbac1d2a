//! Share-image endpoints.
//!
//! `GET /api/og-image` answers with a PNG, `GET /api/og-image.svg` with the
//! markup it was rasterized from. Both take the diagram as `d` (base64url)
//! or, for old links, `data` (JSON).
//!
//! ERROR HANDLING
//! ==============
//! Every failure is a JSON body `{"error": code, "message": text}` with a
//! 4xx or 5xx status. No error path produces an image, and errors are never
//! cached.

#[cfg(test)]
#[path = "og_image_test.rs"]
mod og_image_test;

use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use canvas::share::{ShareError, SharePayload};
use canvas::svg::render_share_svg;
use serde::Deserialize;

use crate::services::ErrorCode;
use crate::services::cache::cache_key;
use crate::services::render::{RenderError, render_png};
use crate::state::AppState;

pub(crate) const CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

#[derive(Debug, Default, Deserialize)]
pub struct ShareQuery {
    pub d: Option<String>,
    pub data: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Png,
    Svg,
}

impl Format {
    fn name(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }

    fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Svg => "image/svg+xml",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OgImageError {
    #[error(transparent)]
    Share(#[from] ShareError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl ErrorCode for OgImageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Share(ShareError::Missing) => "E_MISSING_PARAM",
            Self::Share(ShareError::TooLarge { .. }) => "E_PAYLOAD_TOO_LARGE",
            Self::Share(_) => "E_BAD_PAYLOAD",
            Self::Render(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Share(_) => false,
            Self::Render(e) => e.retryable(),
        }
    }
}

pub(crate) fn og_image_error_to_status(err: &OgImageError) -> StatusCode {
    match err {
        OgImageError::Share(_) => StatusCode::BAD_REQUEST,
        OgImageError::Render(RenderError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
        OgImageError::Render(RenderError::Font(_)) => StatusCode::SERVICE_UNAVAILABLE,
        OgImageError::Render(RenderError::Svg(_) | RenderError::Raster(_) | RenderError::Join(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for OgImageError {
    fn into_response(self) -> Response {
        let status = og_image_error_to_status(&self);
        let body = Json(serde_json::json!({
            "error": self.error_code(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

pub async fn png(State(state): State<AppState>, Query(query): Query<ShareQuery>) -> Response {
    serve(&state, query, Format::Png).await
}

pub async fn svg(State(state): State<AppState>, Query(query): Query<ShareQuery>) -> Response {
    serve(&state, query, Format::Svg).await
}

async fn serve(state: &AppState, query: ShareQuery, format: Format) -> Response {
    let started = Instant::now();
    match produce(state, query, format).await {
        Ok((bytes, hit)) => {
            tracing::info!(
                format = format.name(),
                bytes = bytes.len(),
                cache = if hit { "hit" } else { "miss" },
                elapsed_ms = started.elapsed().as_millis(),
                "share image served"
            );
            image_response(format, bytes, hit)
        }
        Err(e) => {
            let status = og_image_error_to_status(&e);
            if status.is_server_error() {
                tracing::error!(error = %e, code = e.error_code(), "share image failed");
            } else {
                tracing::warn!(error = %e, code = e.error_code(), "share image rejected");
            }
            e.into_response()
        }
    }
}

async fn produce(state: &AppState, query: ShareQuery, format: Format) -> Result<(Bytes, bool), OgImageError> {
    let payload = SharePayload::from_params(query.d, query.data)?;
    let max = state.config.max_payload_bytes;
    if payload.raw().len() > max {
        return Err(ShareError::TooLarge { len: payload.raw().len(), max }.into());
    }

    let key = cache_key(format.name(), payload.param(), payload.raw());
    if let Some(bytes) = state.cache.get(&key) {
        return Ok((bytes, true));
    }

    let diagram = payload.decode()?;
    let bytes = match format {
        Format::Svg => Bytes::from(render_share_svg(&diagram)),
        Format::Png => Bytes::from(render_png(&diagram, &state.fonts, state.config.render_timeout).await?),
    };
    state.cache.put(key, bytes.clone());
    tracing::debug!(entries = state.cache.entries(), "render cache updated");
    Ok((bytes, false))
}

fn image_response(format: Format, bytes: Bytes, hit: bool) -> Response {
    let mut response = bytes.into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(format.content_type()));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL));
    headers.insert("x-cache", HeaderValue::from_static(if hit { "HIT" } else { "MISS" }));
    response
}
