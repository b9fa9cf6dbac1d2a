//! Services behind the image routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own font loading, rasterization, and caching so route
//! handlers stay focused on query parsing and response shaping.

pub mod cache;
pub mod fonts;
pub mod render;

/// Grepable error code and retryable flag for JSON error bodies.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}
