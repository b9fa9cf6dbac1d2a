//! Server configuration parsed from environment variables.
//!
//! All variables are optional. Values that are present but unparsable are
//! startup errors rather than silent fallbacks, so a typo in a deployment
//! does not quietly run with defaults.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_RENDER_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_FONT_FETCH_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CACHE_CAPACITY: usize = 256;
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 64 * 1024;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} is not a valid value: {value:?}")]
    Invalid { key: &'static str, value: String },
    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },
}

/// Where share-image text gets its glyphs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
    /// Whatever the host has installed.
    System,
    /// A font file on disk (`OG_FONT_PATH`).
    File(PathBuf),
    /// A font downloaded on first use (`OG_FONT_URL`).
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub render_timeout: Duration,
    pub font: FontSource,
    pub font_fetch_timeout: Duration,
    pub cache_capacity: NonZeroUsize,
    pub max_payload_bytes: usize,
}

impl ServerConfig {
    /// Build config from the process environment.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `RENDER_TIMEOUT_MS`: default 10000
    /// - `OG_FONT_PATH`: font file; wins over `OG_FONT_URL`
    /// - `OG_FONT_URL`: font to download on first render
    /// - `FONT_FETCH_TIMEOUT_SECS`: default 10
    /// - `OG_CACHE_CAPACITY`: rendered images kept, default 256
    /// - `MAX_PAYLOAD_BYTES`: share parameter limit, default 65536
    ///
    /// # Errors
    ///
    /// [`ConfigError`] naming the first bad variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] naming the first bad variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = parse_or(get("PORT"), "PORT", DEFAULT_PORT)?;
        let render_timeout_ms = positive(get("RENDER_TIMEOUT_MS"), "RENDER_TIMEOUT_MS", DEFAULT_RENDER_TIMEOUT_MS)?;
        let font_fetch_secs =
            positive(get("FONT_FETCH_TIMEOUT_SECS"), "FONT_FETCH_TIMEOUT_SECS", DEFAULT_FONT_FETCH_TIMEOUT_SECS)?;
        let cache_capacity = positive(get("OG_CACHE_CAPACITY"), "OG_CACHE_CAPACITY", DEFAULT_CACHE_CAPACITY)?;
        let max_payload_bytes = positive(get("MAX_PAYLOAD_BYTES"), "MAX_PAYLOAD_BYTES", DEFAULT_MAX_PAYLOAD_BYTES)?;

        let font = match (get("OG_FONT_PATH"), get("OG_FONT_URL")) {
            (Some(path), _) => FontSource::File(PathBuf::from(path)),
            (None, Some(url)) => FontSource::Url(url),
            (None, None) => FontSource::System,
        };

        Ok(Self {
            port,
            render_timeout: Duration::from_millis(render_timeout_ms),
            font,
            font_fetch_timeout: Duration::from_secs(font_fetch_secs),
            cache_capacity: NonZeroUsize::new(cache_capacity).ok_or(ConfigError::Zero { key: "OG_CACHE_CAPACITY" })?,
            max_payload_bytes,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            render_timeout: Duration::from_millis(DEFAULT_RENDER_TIMEOUT_MS),
            font: FontSource::System,
            font_fetch_timeout: Duration::from_secs(DEFAULT_FONT_FETCH_TIMEOUT_SECS),
            cache_capacity: NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.parse::<T>().map_err(|_| ConfigError::Invalid { key, value }),
    }
}

fn positive<T: FromStr + Default + PartialEq>(
    raw: Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    let value = parse_or(raw, key, default)?;
    if value == T::default() {
        return Err(ConfigError::Zero { key });
    }
    Ok(value)
}
