//! ImageCodec — user file → base64 payload + declared media type.
//!
//! No transcoding, resizing or compression happens here: the bytes are
//! encoded as-is and the declared type is recorded unchanged. Anything that
//! is not declared as a concrete `image/*` type is refused before it can
//! reach the network.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, warn};

use crate::error::InvalidInput;
use crate::types::{EncodedImage, ImageBlob};

/// Check that a declared content type names a concrete image type.
///
/// `image/png` passes; `text/plain`, `image/`, `image/*` and the empty string
/// do not.
///
/// # Errors
/// `MissingMediaType` for empty or wildcard types, `NotAnImage` otherwise.
pub fn validate_media_type(media_type: &str) -> Result<(), InvalidInput> {
    if media_type.trim().is_empty() {
        return Err(InvalidInput::MissingMediaType);
    }
    let Some(subtype) = media_type.strip_prefix("image/") else {
        return Err(InvalidInput::NotAnImage(media_type.to_string()));
    };
    if subtype.trim().is_empty() || subtype.starts_with('*') {
        return Err(InvalidInput::MissingMediaType);
    }
    Ok(())
}

/// Declared content type for a file name, the way a browser fills in `File.type`.
#[must_use]
pub fn media_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let media_type = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" | "jfif" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "tif" | "tiff" => "image/tiff",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        "json" => "application/json",
        _ => return None,
    };
    Some(media_type)
}

/// Stateless image encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec;

impl ImageCodec {
    /// Encode an in-memory file.
    ///
    /// # Errors
    /// Returns `InvalidInput` if the declared type is missing, ambiguous or
    /// not an image, or if the file is empty.
    pub fn encode(blob: &ImageBlob) -> Result<EncodedImage, InvalidInput> {
        let Some(media_type) = blob.content_type.as_deref() else {
            warn!(name = ?blob.name, "rejecting upload without a declared content type");
            return Err(InvalidInput::MissingMediaType);
        };
        if let Err(e) = validate_media_type(media_type) {
            warn!(name = ?blob.name, media_type, "rejecting upload: {e}");
            return Err(e);
        }
        if blob.bytes.is_empty() {
            warn!(name = ?blob.name, "rejecting empty upload");
            return Err(InvalidInput::Empty);
        }

        let data = STANDARD.encode(&blob.bytes);
        debug!(
            name = ?blob.name,
            media_type,
            bytes = blob.bytes.len(),
            "encoded image"
        );
        EncodedImage::new(data, media_type)
    }

    /// Read and encode a file from disk, deriving the declared type from its
    /// extension.
    ///
    /// The type is checked before the file is read, so a non-image path
    /// costs no I/O.
    ///
    /// # Errors
    /// Returns `InvalidInput` on an unknown or non-image extension, an empty
    /// file, or a read failure.
    pub async fn encode_file(path: impl AsRef<Path>) -> Result<EncodedImage, InvalidInput> {
        let path = path.as_ref();
        let media_type = media_type_for_path(path).ok_or(InvalidInput::MissingMediaType)?;
        validate_media_type(media_type)?;

        let bytes = tokio::fs::read(path).await?;
        let blob = ImageBlob {
            bytes,
            content_type: Some(media_type.to_string()),
            name: path.file_name().map(|n| n.to_string_lossy().into_owned()),
        };
        Self::encode(&blob)
    }
}
