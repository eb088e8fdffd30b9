//! Data models and structures
//!
//! Defines the encoded image, the request/result pair exchanged with the
//! generation service, the controller state observed by presenters, and the
//! runtime configuration.

use crate::codec::mime;
use crate::{Error, Result};
use base64::Engine as _;
use serde::Serialize;
use std::time::Duration;

/// A base64 image payload tagged with its media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    media_type: String,
    payload: String,
}

impl EncodedImage {
    /// Build an image from an already-encoded payload, validating both halves.
    pub fn new(media_type: impl Into<String>, payload: impl Into<String>) -> Result<Self> {
        let media_type = media_type.into();
        let payload = payload.into();

        if !mime::is_image_media_type(&media_type) {
            return Err(Error::Format(format!(
                "Unrecognized image media type '{}'. Please upload a valid image.",
                media_type
            )));
        }

        let decoded = base64::engine::general_purpose::STANDARD
            .decode(&payload)
            .map_err(|e| Error::Format(format!("Image payload is not valid base64: {}", e)))?;
        if decoded.is_empty() {
            return Err(Error::Format("Image payload is empty.".to_string()));
        }

        Ok(Self {
            media_type,
            payload,
        })
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Raw image bytes behind the payload.
    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.payload)
            .map_err(|e| Error::Invariant(format!("Validated payload failed to decode: {}", e)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutputModality {
    Image,
}

/// One transformation attempt. Built fresh per submission and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformationRequest {
    source_image: EncodedImage,
    instruction: String,
    output_modality: OutputModality,
}

impl TransformationRequest {
    pub fn new(source_image: EncodedImage, instruction: impl Into<String>) -> Self {
        Self {
            source_image,
            instruction: instruction.into(),
            output_modality: OutputModality::Image,
        }
    }

    pub fn source_image(&self) -> &EncodedImage {
        &self.source_image
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn output_modality(&self) -> OutputModality {
        self.output_modality
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformationResult {
    Success { image: EncodedImage },
    Failure { reason: String },
}

impl TransformationResult {
    pub fn failure_from(err: &Error) -> Self {
        Self::Failure {
            reason: err.reason(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Lifecycle of the current image as seen by the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TransformationState {
    #[default]
    Idle,
    InFlight,
    Succeeded(EncodedImage),
    Failed(String),
}

impl TransformationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed(_))
    }
}

impl From<TransformationResult> for TransformationState {
    fn from(result: TransformationResult) -> Self {
        match result {
            TransformationResult::Success { image } => Self::Succeeded(image),
            TransformationResult::Failure { reason } => Self::Failed(reason),
        }
    }
}

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Config {
    pub fn new(gemini_api_key: String) -> Self {
        Self {
            gemini_api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let gemini_api_key = lookup("GEMINI_API_KEY")
            .or_else(|| lookup("API_KEY"))
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Config("GEMINI_API_KEY not set".to_string()))?;

        let timeout_secs = match lookup("GEMINI_TIMEOUT_SECS") {
            Some(raw) => parse_timeout_secs(&raw)?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            gemini_api_key,
            model: lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: lookup("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

pub fn parse_timeout_secs(raw: &str) -> Result<u64> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(Error::Config(format!(
            "GEMINI_TIMEOUT_SECS must be a positive integer, got '{}'",
            raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_encoded_image_rejects_bad_payload() {
        let err = EncodedImage::new("image/png", "not base64!!").unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_encoded_image_rejects_non_image_media_type() {
        let err = EncodedImage::new("text/plain", "AAAA").unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_encoded_image_decode() {
        let image = EncodedImage::new("image/png", "iVBORw==").unwrap();
        assert_eq!(image.decode().unwrap(), vec![0x89, 0x50, 0x4E, 0x47]);
    }

    #[test]
    fn test_request_defaults_to_image_modality() {
        let image = EncodedImage::new("image/png", "iVBORw==").unwrap();
        let request = TransformationRequest::new(image, "cartoonify");
        assert_eq!(request.output_modality(), OutputModality::Image);
        assert_eq!(serde_json::to_string(&OutputModality::Image).unwrap(), "\"IMAGE\"");
    }

    #[test]
    fn test_result_projects_into_state() {
        let image = EncodedImage::new("image/png", "iVBORw==").unwrap();
        let state: TransformationState = TransformationResult::Success {
            image: image.clone(),
        }
        .into();
        assert_eq!(state, TransformationState::Succeeded(image));

        let state: TransformationState = TransformationResult::Failure {
            reason: "boom".to_string(),
        }
        .into();
        assert_eq!(state, TransformationState::Failed("boom".to_string()));
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup_from(&[("GEMINI_API_KEY", "secret")])).unwrap();
        assert_eq!(config.gemini_api_key, "secret");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_config_falls_back_to_api_key() {
        let config = Config::from_lookup(lookup_from(&[("API_KEY", "legacy")])).unwrap();
        assert_eq!(config.gemini_api_key, "legacy");
    }

    #[test]
    fn test_config_requires_key() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_config_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "k"),
            ("GEMINI_MODEL", "gemini-3-pro-image-preview"),
            ("GEMINI_BASE_URL", "http://localhost:9000"),
            ("GEMINI_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();
        assert_eq!(config.model, "gemini-3-pro-image-preview");
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_config_rejects_zero_timeout() {
        let err = Config::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "k"),
            ("GEMINI_TIMEOUT_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
