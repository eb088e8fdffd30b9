use super::client::GeminiHttpClient;
use super::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineData, Part,
};
use crate::ai::GenerationService;
use crate::codec::mime;
use crate::models::{Config, EncodedImage, TransformationRequest, TransformationResult};
use crate::{Error, Result};
use async_trait::async_trait;
use base64::Engine as _;

/// Image-to-image cartoon generation backed by Gemini.
pub struct GeminiCartoonClient {
    http: GeminiHttpClient,
}

impl GeminiCartoonClient {
    pub fn new(http: GeminiHttpClient) -> Self {
        Self { http }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::from_config_with_client(config, reqwest::Client::new())
    }

    pub fn from_config_with_client(config: &Config, client: reqwest::Client) -> Self {
        let http = GeminiHttpClient::new_with_client(
            config.gemini_api_key.clone(),
            config.model.clone(),
            config.timeout,
            client,
        )
        .with_base_url(config.base_url.clone());
        Self::new(http)
    }

    fn build_request(request: &TransformationRequest) -> GenerateContentRequest {
        let source = request.source_image();
        GenerateContentRequest {
            contents: vec![Content {
                role: None,
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: source.media_type().to_string(),
                            data: source.payload().to_string(),
                        },
                    },
                    Part::Text {
                        text: request.instruction().to_string(),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec![request.output_modality()],
            },
        }
    }

    async fn try_generate(&self, request: &TransformationRequest) -> Result<EncodedImage> {
        tracing::debug!(
            "Requesting cartoon from Gemini model {} ({} source, {} base64 chars)",
            self.http.model(),
            request.source_image().media_type(),
            request.source_image().payload().len()
        );

        let response: GenerateContentResponse = self
            .http
            .generate_content(&Self::build_request(request))
            .await?;

        let inline = first_inline_image(&response).ok_or(Error::NoImageProduced)?;
        tracing::debug!("Gemini returned image with mime_type: {}", inline.mime_type);

        let media_type = if inline.mime_type.is_empty() {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(&inline.data)
                .map_err(|e| {
                    Error::Service(format!("Failed to decode Gemini base64 image: {}", e))
                })?;
            mime::detect_image_mime(&bytes).unwrap_or("image/png")
        } else {
            inline.mime_type.as_str()
        };

        EncodedImage::new(media_type, inline.data.clone())
            .map_err(|e| Error::Service(format!("Gemini returned an unusable image: {}", e)))
    }
}

/// The first inline-data part of the first candidate; later parts are ignored.
fn first_inline_image(response: &GenerateContentResponse) -> Option<&InlineData> {
    response.candidates.first().and_then(|c| {
        c.content.parts.iter().find_map(|p| match p {
            Part::InlineData { inline_data } => Some(inline_data),
            _ => None,
        })
    })
}

#[async_trait]
impl GenerationService for GeminiCartoonClient {
    async fn generate(&self, request: &TransformationRequest) -> TransformationResult {
        match self.try_generate(request).await {
            Ok(image) => {
                tracing::info!("Cartoon generated ({})", image.media_type());
                TransformationResult::Success { image }
            }
            Err(Error::NoImageProduced) => {
                tracing::warn!("Gemini response carried no inline image");
                TransformationResult::failure_from(&Error::NoImageProduced)
            }
            Err(e) => {
                tracing::error!("Cartoon generation failed: {}", e);
                TransformationResult::failure_from(&e)
            }
        }
    }
}
