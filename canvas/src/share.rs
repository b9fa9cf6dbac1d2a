//! Share-link encoding of a diagram.
//!
//! Canonical form: query parameter `d` holding unpadded base64url of the
//! compact JSON document, avatars stripped. Links emitted by older clients
//! carry `data` holding the JSON itself, sometimes still percent-encoded once
//! more; those are decoded but never produced.
//!
//! Decoding is strict: anything that is not a diagram is a [`ShareError`],
//! which the image endpoint turns into a 4xx response.

#[cfg(test)]
#[path = "share_test.rs"]
mod share_test;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use url::form_urlencoded;

use crate::consts::MAX_SHARE_BYTES;
use crate::doc::Diagram;

/// Query parameter of the canonical encoding.
pub const PARAM: &str = "d";

/// Query parameter of the legacy JSON encoding.
pub const LEGACY_PARAM: &str = "data";

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("missing `d` or `data` parameter")]
    Missing,
    #[error("share payload is {len} bytes, limit is {max}")]
    TooLarge { len: usize, max: usize },
    #[error("share payload is not valid base64url: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("share payload is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("share payload is not a diagram: {0}")]
    Json(#[from] serde_json::Error),
}

/// An encoded diagram as found in a link, not yet decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SharePayload {
    /// `d=`: base64url JSON.
    Compact(String),
    /// `data=`: JSON, possibly percent-encoded once more.
    Legacy(String),
}

impl SharePayload {
    /// Pick the payload from already-decoded query parameters. `d` wins.
    ///
    /// # Errors
    ///
    /// [`ShareError::Missing`] when neither parameter has a value.
    pub fn from_params(d: Option<String>, data: Option<String>) -> Result<Self, ShareError> {
        match (d.filter(|v| !v.is_empty()), data.filter(|v| !v.is_empty())) {
            (Some(v), _) => Ok(Self::Compact(v)),
            (None, Some(v)) => Ok(Self::Legacy(v)),
            (None, None) => Err(ShareError::Missing),
        }
    }

    /// Pick the payload from a raw query string (without the leading `?`).
    ///
    /// # Errors
    ///
    /// [`ShareError::Missing`] when neither parameter is present.
    pub fn from_query(query: &str) -> Result<Self, ShareError> {
        let mut d = None;
        let mut data = None;
        for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            match key.as_ref() {
                PARAM if d.is_none() => d = Some(value.into_owned()),
                LEGACY_PARAM if data.is_none() => data = Some(value.into_owned()),
                _ => {}
            }
        }
        Self::from_params(d, data)
    }

    /// The raw parameter value.
    #[must_use]
    pub fn raw(&self) -> &str {
        match self {
            Self::Compact(v) | Self::Legacy(v) => v,
        }
    }

    /// The parameter name this payload came from.
    #[must_use]
    pub fn param(&self) -> &'static str {
        match self {
            Self::Compact(_) => PARAM,
            Self::Legacy(_) => LEGACY_PARAM,
        }
    }

    /// Decode into a sanitized diagram.
    ///
    /// # Errors
    ///
    /// Any [`ShareError`] other than `Missing`.
    pub fn decode(&self) -> Result<Diagram, ShareError> {
        let raw = self.raw();
        if raw.len() > MAX_SHARE_BYTES {
            return Err(ShareError::TooLarge { len: raw.len(), max: MAX_SHARE_BYTES });
        }
        match self {
            Self::Compact(v) => decode(v),
            Self::Legacy(v) => decode_legacy(v),
        }
    }
}

/// Encode a diagram for the `d` parameter.
///
/// # Errors
///
/// [`ShareError::Json`] if serialization fails.
pub fn encode(diagram: &Diagram) -> Result<String, ShareError> {
    let json = diagram.without_images().to_json()?;
    Ok(URL_SAFE_NO_PAD.encode(json.as_bytes()))
}

/// `d=<encoded>`, ready to append after `?`.
///
/// # Errors
///
/// [`ShareError::Json`] if serialization fails.
pub fn share_query(diagram: &Diagram) -> Result<String, ShareError> {
    Ok(format!("{PARAM}={}", encode(diagram)?))
}

/// Decode a `d` parameter value.
///
/// # Errors
///
/// [`ShareError::Base64`], [`ShareError::Utf8`], or [`ShareError::Json`].
pub fn decode(encoded: &str) -> Result<Diagram, ShareError> {
    let bytes = URL_SAFE_NO_PAD.decode(encoded.trim().trim_end_matches('=').as_bytes())?;
    let json = String::from_utf8(bytes)?;
    Ok(Diagram::from_json(&json)?)
}

/// Decode a `data` parameter value: JSON first, then one more percent-decode.
///
/// # Errors
///
/// [`ShareError::Json`] when neither reading is a diagram.
pub fn decode_legacy(value: &str) -> Result<Diagram, ShareError> {
    match Diagram::from_json(value) {
        Ok(diagram) => Ok(diagram),
        Err(first) => {
            let Some(unescaped) = percent_decode(value) else {
                return Err(first.into());
            };
            Ok(Diagram::from_json(&unescaped)?)
        }
    }
}

/// Undo `encodeURIComponent`. Its output never contains raw `&`, `=` or `+`,
/// so the whole value parses as a single form key.
fn percent_decode(value: &str) -> Option<String> {
    if !value.contains('%') {
        return None;
    }
    form_urlencoded::parse(value.as_bytes())
        .next()
        .map(|(key, _)| key.into_owned())
}
