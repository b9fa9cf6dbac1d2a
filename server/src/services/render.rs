//! Share-image rasterization.
//!
//! SYSTEM CONTEXT
//! ==============
//! The markup comes from `canvas::svg`, the same layout the editor uses.
//! This module only turns it into PNG bytes. Rasterization is CPU-bound, so
//! it runs on the blocking pool and the caller waits at most the configured
//! timeout.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::sync::Arc;
use std::time::{Duration, Instant};

use canvas::doc::Diagram;
use canvas::svg::render_share_svg;
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{self, fontdb};

use crate::services::ErrorCode;
use crate::services::fonts::{FontError, FontStore};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("rendering took longer than {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Font(#[from] FontError),
    #[error("share markup did not parse: {0}")]
    Svg(#[from] usvg::Error),
    #[error("rasterization failed: {0}")]
    Raster(String),
    #[error("render task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ErrorCode for RenderError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "E_RENDER_TIMEOUT",
            Self::Font(_) => "E_FONT_UNAVAILABLE",
            Self::Svg(_) | Self::Raster(_) | Self::Join(_) => "E_RENDER_FAILED",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Font(e) => e.retryable(),
            _ => false,
        }
    }
}

/// Render a diagram's share card to PNG bytes.
///
/// # Errors
///
/// [`RenderError::Font`] if the font database cannot be built,
/// [`RenderError::Timeout`] if rasterization outlives `timeout`, and the
/// remaining variants for rasterization failures.
pub async fn render_png(diagram: &Diagram, fonts: &FontStore, timeout: Duration) -> Result<Vec<u8>, RenderError> {
    let db = fonts.database().await?;
    let svg = render_share_svg(diagram);
    let started = Instant::now();
    let task = tokio::task::spawn_blocking(move || svg_to_png(&svg, db));
    let png = match tokio::time::timeout(timeout, task).await {
        Ok(joined) => joined??,
        Err(_) => return Err(RenderError::Timeout(timeout)),
    };
    tracing::debug!(bytes = png.len(), elapsed_ms = started.elapsed().as_millis(), "share image rasterized");
    Ok(png)
}

/// Rasterize SVG markup at its intrinsic size.
///
/// Only inline `data:` images are resolved. Any other href is treated as
/// missing, so markup built from a share payload can never read local files.
///
/// # Errors
///
/// [`RenderError::Svg`] for unparsable markup, [`RenderError::Raster`] when
/// the pixmap cannot be allocated or encoded.
pub fn svg_to_png(svg: &str, fonts: Arc<fontdb::Database>) -> Result<Vec<u8>, RenderError> {
    let opts = usvg::Options {
        fontdb: fonts,
        image_href_resolver: usvg::ImageHrefResolver {
            resolve_data: usvg::ImageHrefResolver::default_data_resolver(),
            resolve_string: Box::new(skip_linked_image),
        },
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_str(svg, &opts)?;

    let size = tree.size().to_int_size();
    let mut pixmap = Pixmap::new(size.width(), size.height())
        .ok_or_else(|| RenderError::Raster(format!("cannot allocate {}x{} pixmap", size.width(), size.height())))?;
    resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());

    pixmap.encode_png().map_err(|e| RenderError::Raster(e.to_string()))
}

fn skip_linked_image(href: &str, _: &usvg::Options) -> Option<usvg::ImageKind> {
    tracing::warn!(%href, "ignoring non-inline image reference");
    None
}
