//! Image payload encoding
//!
//! Snaps and profile pictures travel inside JSON as data URIs
//! (`data:image/jpeg;base64,...`). This module builds them from image files
//! and decodes them back into bytes for display.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{FluxNovaError, Result};

/// Decoded data URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    /// MIME type, `text/plain` when the URI omits it
    pub mime: String,
    /// Decoded payload
    pub bytes: Vec<u8>,
}

impl DataUri {
    /// Parse a `data:` URI
    ///
    /// Base64 payloads are decoded; anything else is taken verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`FluxNovaError::Media`] if the prefix or separator is missing
    /// or the base64 payload is invalid.
    pub fn parse(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| FluxNovaError::Media("not a data URI".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| FluxNovaError::Media("data URI has no payload separator".to_string()))?;

        let (mime, is_base64) = match header.strip_suffix(";base64") {
            Some(mime) => (mime, true),
            None => (header, false),
        };
        let mime = if mime.is_empty() { "text/plain" } else { mime };

        let bytes = if is_base64 {
            STANDARD
                .decode(payload.trim())
                .map_err(|e| FluxNovaError::Media(format!("invalid base64 payload: {}", e)))?
        } else {
            payload.as_bytes().to_vec()
        };

        Ok(Self {
            mime: mime.to_string(),
            bytes,
        })
    }

    /// File extension matching the MIME type, if it is a known image type
    pub fn extension(&self) -> Option<&'static str> {
        extension_for(&self.mime)
    }
}

/// File extension for an image MIME type
pub fn extension_for(mime: &str) -> Option<&'static str> {
    match mime {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/bmp" => Some("bmp"),
        _ => None,
    }
}

/// Encode raw image bytes as a base64 data URI
///
/// The MIME type is taken from the detected image format.
///
/// # Errors
///
/// Returns [`FluxNovaError::Media`] if the bytes are not a recognizable
/// image.
pub fn encode_image(bytes: &[u8]) -> Result<String> {
    let format = image::guess_format(bytes)
        .map_err(|e| FluxNovaError::Media(format!("unrecognized image format: {}", e)))?;
    Ok(format!(
        "data:{};base64,{}",
        format.to_mime_type(),
        STANDARD.encode(bytes)
    ))
}

/// Read an image file and encode it as a data URI
pub fn read_image_data_uri(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| {
        FluxNovaError::Media(format!("failed to read {}: {}", path.display(), e))
    })?;
    tracing::debug!(path = %path.display(), size = bytes.len(), "Encoding image");
    encode_image(&bytes)
}
