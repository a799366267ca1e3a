use std::path::PathBuf;

use async_trait::async_trait;

use crate::processing_errors::ProcessingError;

/// One request to the hosted generation model.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationCall {
    pub prompt: String,
    /// Conditioning image; `None` for text-only generation.
    pub image_path: Option<PathBuf>,
    pub model: String,
}

#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    /// Returns the generated image as base64 text.
    async fn generate(&self, call: &GenerationCall) -> Result<String, ProcessingError>;
}
