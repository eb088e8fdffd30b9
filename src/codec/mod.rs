//! Image transport encoding
//!
//! Converts raw uploaded bytes into base64 [`EncodedImage`] values and
//! to/from `data:<media-type>;base64,<payload>` transport strings.

pub mod mime;

use crate::models::EncodedImage;
use crate::{Error, Result};
use base64::Engine as _;

pub const INVALID_DATA_URI_REASON: &str =
    "Invalid image data URL format. Please upload a valid image.";

const DATA_URI_SCHEME: &str = "data:";
const BASE64_SEPARATOR: &str = ";base64,";

/// Encode raw bytes under the media type the uploader declared.
pub fn encode(raw_bytes: &[u8], declared_media_type: &str) -> Result<EncodedImage> {
    if raw_bytes.is_empty() {
        return Err(Error::Format(
            "Image is empty. Please upload a valid image.".to_string(),
        ));
    }
    if declared_media_type.trim().is_empty() {
        return Err(Error::Format(
            "Image media type is missing. Please upload a valid image.".to_string(),
        ));
    }

    let payload = base64::engine::general_purpose::STANDARD.encode(raw_bytes);
    EncodedImage::new(declared_media_type, payload)
}

/// Parse a `data:` transport string.
///
/// The `;base64,` separator is mandatory; anything else is reported as a
/// format error rather than coerced into an image.
pub fn split_data_uri(uri: &str) -> Result<EncodedImage> {
    let (prefix, payload) = uri
        .split_once(BASE64_SEPARATOR)
        .ok_or_else(|| Error::Format(INVALID_DATA_URI_REASON.to_string()))?;

    let media_type = prefix
        .strip_prefix(DATA_URI_SCHEME)
        .filter(|media_type| !media_type.is_empty())
        .ok_or_else(|| Error::Format(INVALID_DATA_URI_REASON.to_string()))?;

    EncodedImage::new(media_type, payload)
}

pub fn to_data_uri(image: &EncodedImage) -> String {
    format!(
        "{}{}{}{}",
        DATA_URI_SCHEME,
        image.media_type(),
        BASE64_SEPARATOR,
        image.payload()
    )
}
