//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It is cheap to clone: configuration, the lazily built font database, and
//! the render cache all sit behind `Arc`s shared by every request.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::services::cache::RenderCache;
use crate::services::fonts::FontStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub fonts: Arc<FontStore>,
    pub cache: Arc<RenderCache>,
}

impl AppState {
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        let fonts = FontStore::new(config.font.clone(), config.font_fetch_timeout);
        let cache = RenderCache::new(config.cache_capacity);
        Self { config: Arc::new(config), fonts: Arc::new(fonts), cache: Arc::new(cache) }
    }
}
