//! Remote image generation
//!
//! The [`GenerationService`] trait is the single network-facing seam of the
//! cartoonizer. Implementations never fail past their boundary: every error is
//! folded into [`TransformationResult::Failure`].

pub mod gemini;
pub mod mock;

pub use gemini::{GeminiCartoonClient, GeminiHttpClient};
pub use mock::MockGenerationClient;

use crate::models::{TransformationRequest, TransformationResult};
use async_trait::async_trait;

#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, request: &TransformationRequest) -> TransformationResult;
}
