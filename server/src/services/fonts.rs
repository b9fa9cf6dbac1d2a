//! Font database for share-image text.
//!
//! DESIGN
//! ======
//! The database is built once, on the first render that needs it, from the
//! configured [`FontSource`]. A failed build is not remembered: the next
//! request tries again, so a flaky font host heals without a restart.
//!
//! ERROR HANDLING
//! ==============
//! An explicit file or URL that yields no faces is an error. The system
//! source is lenient; a host with no fonts still renders shapes.

#[cfg(test)]
#[path = "fonts_test.rs"]
mod fonts_test;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use resvg::usvg::fontdb;
use tokio::sync::OnceCell;

use crate::config::FontSource;
use crate::services::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("cannot read font file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("font download failed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("font download returned status {0}")]
    Status(u16),
    #[error("no usable font faces in {0}")]
    NoFaces(String),
}

impl ErrorCode for FontError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Read { .. } => "E_FONT_READ",
            Self::Fetch(_) | Self::Status(_) => "E_FONT_FETCH",
            Self::NoFaces(_) => "E_FONT_EMPTY",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::Status(_))
    }
}

pub struct FontStore {
    source: FontSource,
    fetch_timeout: Duration,
    db: OnceCell<Arc<fontdb::Database>>,
}

impl FontStore {
    #[must_use]
    pub fn new(source: FontSource, fetch_timeout: Duration) -> Self {
        Self { source, fetch_timeout, db: OnceCell::new() }
    }

    /// The shared database, building it on first use.
    ///
    /// # Errors
    ///
    /// [`FontError`] when the configured source cannot be loaded.
    pub async fn database(&self) -> Result<Arc<fontdb::Database>, FontError> {
        self.db.get_or_try_init(|| self.build()).await.cloned()
    }

    async fn build(&self) -> Result<Arc<fontdb::Database>, FontError> {
        let mut db = fontdb::Database::new();
        match &self.source {
            FontSource::System => {
                db.load_system_fonts();
                if db.is_empty() {
                    tracing::warn!("no system fonts found; share images will render without text");
                }
            }
            FontSource::File(path) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|source| FontError::Read { path: path.clone(), source })?;
                load_bytes(&mut db, bytes, &path.display().to_string())?;
            }
            FontSource::Url(url) => {
                let bytes = fetch(url, self.fetch_timeout).await?;
                load_bytes(&mut db, bytes, url)?;
            }
        }
        configure_font_fallbacks(&mut db);
        tracing::info!(faces = db.len(), "font database ready");
        Ok(Arc::new(db))
    }
}

async fn fetch(url: &str, timeout: Duration) -> Result<Vec<u8>, FontError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()?;
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FontError::Status(status.as_u16()));
    }
    let bytes = response.bytes().await?;
    tracing::info!(%url, bytes = bytes.len(), "font downloaded");
    Ok(bytes.to_vec())
}

fn load_bytes(db: &mut fontdb::Database, bytes: Vec<u8>, origin: &str) -> Result<(), FontError> {
    db.load_font_data(bytes);
    if db.is_empty() {
        return Err(FontError::NoFaces(origin.to_string()));
    }
    Ok(())
}

/// Point the generic families at faces that exist, so `sans-serif` in the
/// markup resolves even when only one font is loaded.
pub(crate) fn configure_font_fallbacks(db: &mut fontdb::Database) {
    let mut sans_family: Option<String> = None;
    let mut serif_family: Option<String> = None;
    let mut mono_family: Option<String> = None;
    let mut first_family: Option<String> = None;

    for face in db.faces() {
        for (family, _) in &face.families {
            if first_family.is_none() {
                first_family = Some(family.clone());
            }
            let lower = family.to_ascii_lowercase();
            if sans_family.is_none() && lower.contains("sans") {
                sans_family = Some(family.clone());
            }
            if serif_family.is_none() && lower.contains("serif") && !lower.contains("sans") {
                serif_family = Some(family.clone());
            }
            if mono_family.is_none() && (lower.contains("mono") || lower.contains("code")) {
                mono_family = Some(family.clone());
            }
        }
    }

    if let Some(family) = sans_family.as_deref().or(first_family.as_deref()) {
        db.set_sans_serif_family(family);
    }
    if let Some(family) = serif_family.as_deref().or(first_family.as_deref()) {
        db.set_serif_family(family);
    }
    if let Some(family) = mono_family.as_deref().or(sans_family.as_deref()).or(first_family.as_deref()) {
        db.set_monospace_family(family);
    }
}
