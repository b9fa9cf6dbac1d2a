//! Avatar upload decoding: sniff the image, check it, and wrap it as a data URL.
//!
//! Only the header is inspected (via `imagesize`); pixel decoding is left to
//! the browser, which loads the data URL asynchronously. Until it has, the
//! painter draws the person's initial instead.

#[cfg(test)]
#[path = "avatar_test.rs"]
mod avatar_test;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use imagesize::ImageType;

use crate::consts::MAX_AVATAR_BYTES;

const MIME_TYPES: [&str; 4] = ["image/png", "image/jpeg", "image/gif", "image/webp"];

#[derive(Debug, thiserror::Error)]
pub enum AvatarError {
    #[error("image is empty")]
    Empty,
    #[error("image is {len} bytes, limit is {max}")]
    TooLarge { len: usize, max: usize },
    #[error("unsupported image format")]
    Unsupported,
    #[error("image header is unreadable: {0}")]
    Corrupt(#[from] imagesize::ImageError),
    #[error("image has no pixels")]
    ZeroSized,
}

/// A validated avatar ready to attach to a person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAvatar {
    pub mime: &'static str,
    pub width: usize,
    pub height: usize,
    pub data_url: String,
}

/// Validate uploaded bytes and build a data URL.
///
/// # Errors
///
/// [`AvatarError`] for empty, oversized, unsupported, or corrupt input.
pub fn decode_avatar(bytes: &[u8]) -> Result<DecodedAvatar, AvatarError> {
    if bytes.is_empty() {
        return Err(AvatarError::Empty);
    }
    if bytes.len() > MAX_AVATAR_BYTES {
        return Err(AvatarError::TooLarge { len: bytes.len(), max: MAX_AVATAR_BYTES });
    }

    let kind = imagesize::image_type(bytes).map_err(|e| match e {
        imagesize::ImageError::NotSupported => AvatarError::Unsupported,
        other => AvatarError::Corrupt(other),
    })?;
    let mime = match kind {
        ImageType::Png => MIME_TYPES[0],
        ImageType::Jpeg => MIME_TYPES[1],
        ImageType::Gif => MIME_TYPES[2],
        ImageType::Webp => MIME_TYPES[3],
        _ => return Err(AvatarError::Unsupported),
    };

    let size = imagesize::blob_size(bytes)?;
    if size.width == 0 || size.height == 0 {
        return Err(AvatarError::ZeroSized);
    }

    Ok(DecodedAvatar {
        mime,
        width: size.width,
        height: size.height,
        data_url: format!("data:{mime};base64,{}", STANDARD.encode(bytes)),
    })
}

/// Whether `src` is an inline base64 image of a supported type, the only
/// shape [`decode_avatar`] produces. Anything else (paths, remote URLs,
/// other schemes) must never reach a painter.
#[must_use]
pub fn is_avatar_data_url(src: &str) -> bool {
    let Some(rest) = src.strip_prefix("data:") else {
        return false;
    };
    MIME_TYPES.iter().any(|mime| {
        rest.strip_prefix(mime)
            .and_then(|r| r.strip_prefix(";base64,"))
            .is_some_and(|payload| !payload.is_empty())
    })
}
