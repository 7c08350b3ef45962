//! Core types: the encoded image payload and the decoded analysis record.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::codec::validate_media_type;
use crate::error::InvalidInput;

// ---------------------------------------------------------------------------
// Input side
// ---------------------------------------------------------------------------

/// A user-supplied file as the upload surface hands it over: raw bytes plus
/// whatever content type the platform declared for it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageBlob {
    /// Full binary content.
    pub bytes: Vec<u8>,
    /// Declared content type, e.g. `image/png`. `None` when the platform gave none.
    pub content_type: Option<String>,
    /// Original file name, used for diagnostics only.
    pub name: Option<String>,
}

impl ImageBlob {
    /// Create a blob with a declared content type.
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: Some(content_type.into()),
            name: None,
        }
    }

    /// Attach the original file name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Base64 image payload tagged with its declared media type.
///
/// Invariants: `media_type` starts with `image/` and names a concrete subtype;
/// `data` is non-empty. Both are checked on construction, so every value of
/// this type is ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedImage {
    data: String,
    media_type: String,
}

impl EncodedImage {
    /// Wrap an already base64-encoded payload.
    ///
    /// # Errors
    /// Returns `InvalidInput` if the media type is not a concrete image type
    /// or the payload is empty.
    pub fn new(data: impl Into<String>, media_type: impl Into<String>) -> Result<Self, InvalidInput> {
        let data = data.into();
        let media_type = media_type.into();
        validate_media_type(&media_type)?;
        if data.is_empty() {
            return Err(InvalidInput::Empty);
        }
        Ok(Self { data, media_type })
    }

    /// Parse a `data:<type>;base64,<payload>` URL.
    ///
    /// # Errors
    /// Returns `InvalidInput` if the URL is not a base64 image data URL or the
    /// payload does not decode.
    pub fn from_data_url(url: &str) -> Result<Self, InvalidInput> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| InvalidInput::InvalidEncoding("not a data URL".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| InvalidInput::InvalidEncoding("data URL has no payload".into()))?;
        let media_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| InvalidInput::InvalidEncoding("data URL is not base64".into()))?;
        if media_type.is_empty() {
            return Err(InvalidInput::MissingMediaType);
        }

        STANDARD
            .decode(payload)
            .map_err(|e| InvalidInput::InvalidEncoding(e.to_string()))?;

        Self::new(payload, media_type)
    }

    /// Render as a `data:` URL, suitable for an inline preview.
    #[must_use]
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }

    /// The base64 payload.
    #[must_use]
    pub fn data(&self) -> &str {
        &self.data
    }

    /// The declared media type, exactly as supplied.
    #[must_use]
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Length in bytes of the payload once decoded. Padding is optional.
    #[must_use]
    pub fn decoded_len(&self) -> usize {
        let symbols = self.data.trim_end_matches('=').len();
        symbols * 3 / 4
    }
}

// ---------------------------------------------------------------------------
// Output side
// ---------------------------------------------------------------------------

/// Observed tongue attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualFeatures {
    /// Body colour (舌色).
    pub color: String,
    /// Body shape (舌形).
    pub shape: String,
    /// Coating (苔质).
    pub coating: String,
    /// Moisture (津液).
    pub moisture: String,
}

/// Primary syndrome classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    /// Short label, e.g. "气虚".
    pub main_syndrome: String,
    /// Free-text reasoning.
    pub explanation: String,
}

/// Ordered advice lists. Each list may be empty but is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendations {
    pub dietary: Vec<String>,
    pub lifestyle: Vec<String>,
    /// Common food-grade herbs.
    pub herbal_ingredients: Vec<String>,
}

/// A decoded analysis. Pure value: created once per successful call and
/// handed to the caller in full.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TcmAnalysis {
    pub visual_features: VisualFeatures,
    pub diagnosis: Diagnosis,
    pub recommendations: Recommendations,
}
