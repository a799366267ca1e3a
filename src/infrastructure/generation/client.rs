use std::{path::Path, time::Duration};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use serde_json::Value;
use zeroize::Zeroizing;

use crate::{
    constants::DEFAULT_MODEL,
    generation::models::{parse_image_models, ModelCache, ModelInfo, MODEL_CACHE_TTL},
    processing_errors::ProcessingError,
    repositories::image_generation::{GenerationCall, ImageGenerationService},
    settings::GenerationSettings,
};

const FAST_MODEL_STEPS: u32 = 4;
const DEFAULT_STEPS: u32 = 28;
const TEXT_TO_IMAGE_SIZE: u32 = 1024;
const CONNECTION_TEST_SIZE: u32 = 512;
const CONNECTION_TEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GenerationRequestBody {
    pub model: String,
    pub prompt: String,
    pub steps: u32,
    pub n: u32,
    pub response_format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_b64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl GenerationRequestBody {
    /// Image-conditioned requests carry the encoded image under the field
    /// the model family expects; text-only requests get an explicit size.
    pub fn build(model: &str, prompt: &str, encoded_image: Option<String>) -> Self {
        let mut body = GenerationRequestBody {
            model: model.to_string(),
            prompt: prompt.to_string(),
            steps: steps_for_model(model),
            n: 1,
            response_format: "b64_json",
            image_b64: None,
            condition_image: None,
            width: None,
            height: None,
        };

        match encoded_image {
            Some(image) if model.to_lowercase().contains("kontext") => body.condition_image = Some(image),
            Some(image) => body.image_b64 = Some(image),
            None => {
                body.width = Some(TEXT_TO_IMAGE_SIZE);
                body.height = Some(TEXT_TO_IMAGE_SIZE);
            }
        }
        body
    }
}

pub fn steps_for_model(model: &str) -> u32 {
    if model.to_lowercase().contains("schnell") {
        FAST_MODEL_STEPS
    } else {
        DEFAULT_STEPS
    }
}

/// Human-readable message from an error body: `error.message`, then a
/// top-level `message`, then the raw body.
pub fn extract_error_message(status: u16, body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let from_json = parsed.as_ref().and_then(|v| {
        v.pointer("/error/message")
            .and_then(Value::as_str)
            .or_else(|| v.get("message").and_then(Value::as_str))
            .map(str::to_string)
    });

    match from_json {
        Some(message) => message,
        None if body.trim().is_empty() => format!("HTTP {}", status),
        None => body.to_string(),
    }
}

pub fn interpret_generation_response(status: u16, body: &str) -> Result<String, ProcessingError> {
    if status != 200 {
        return Err(ProcessingError::ApiError {
            code: status,
            message: extract_error_message(status, body),
        });
    }

    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/data/0/b64_json")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .ok_or(ProcessingError::InvalidResponse)
}

/// HTTP client for the hosted image generation API.
#[derive(Clone)]
pub struct GenerationClient {
    http: reqwest::Client,
    api_url: String,
    models_url: String,
    api_key: Zeroizing<String>,
    timeout: Duration,
    model_cache: ModelCache,
}

impl GenerationClient {
    pub fn new(settings: &GenerationSettings) -> Self {
        GenerationClient {
            http: reqwest::Client::new(),
            api_url: settings.api_url.clone(),
            models_url: settings.models_url.clone(),
            api_key: Zeroizing::new(settings.api_key.trim().to_string()),
            timeout: Duration::from_secs(settings.request_timeout_secs),
            model_cache: ModelCache::default(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn ensure_configured(&self) -> Result<(), ProcessingError> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(ProcessingError::ApiNotConfigured)
        }
    }

    async fn post(&self, body: &GenerationRequestBody, timeout: Duration) -> Result<(u16, String), ProcessingError> {
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(self.api_key.as_str())
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| ProcessingError::ConnectionError(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ProcessingError::ConnectionError(e.to_string()))?;
        Ok((status, text))
    }

    async fn encode_image(path: &Path) -> Result<String, ProcessingError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ProcessingError::InvalidImage(format!("could not read {}: {}", path.display(), e))
        })?;
        Ok(STANDARD.encode(bytes))
    }

    /// Sends a minimal text-to-image request to prove the key and endpoint work.
    pub async fn test_connection(&self) -> Result<(), ProcessingError> {
        self.ensure_configured()?;

        let mut body = GenerationRequestBody::build(DEFAULT_MODEL, "test", None);
        body.steps = 1;
        body.width = Some(CONNECTION_TEST_SIZE);
        body.height = Some(CONNECTION_TEST_SIZE);

        let (status, text) = self.post(&body, CONNECTION_TEST_TIMEOUT).await?;
        if status == 200 {
            Ok(())
        } else {
            Err(ProcessingError::ApiError {
                code: status,
                message: extract_error_message(status, &text),
            })
        }
    }

    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, ProcessingError> {
        if let Some(models) = self.model_cache.get(MODEL_CACHE_TTL) {
            return Ok(models);
        }
        self.ensure_configured()?;

        let response = self
            .http
            .get(&self.models_url)
            .bearer_auth(self.api_key.as_str())
            .timeout(CONNECTION_TEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| ProcessingError::ConnectionError(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ProcessingError::ConnectionError(e.to_string()))?;

        if status != 200 {
            return Err(ProcessingError::ApiError {
                code: status,
                message: extract_error_message(status, &text),
            });
        }

        let payload: Value = serde_json::from_str(&text).map_err(|_| ProcessingError::InvalidResponse)?;
        let models = parse_image_models(&payload);
        self.model_cache.store(models.clone());
        Ok(models)
    }
}

#[async_trait]
impl ImageGenerationService for GenerationClient {
    async fn generate(&self, call: &GenerationCall) -> Result<String, ProcessingError> {
        self.ensure_configured()?;

        let encoded = match &call.image_path {
            Some(path) => Some(Self::encode_image(path).await?),
            None => None,
        };
        let body = GenerationRequestBody::build(&call.model, &call.prompt, encoded);

        tracing::info!(
            model = %call.model,
            steps = body.steps,
            image_conditioned = call.image_path.is_some(),
            "Sending image generation request"
        );

        let (status, text) = self.post(&body, self.timeout).await?;
        let result = interpret_generation_response(status, &text);

        if let Err(e) = &result {
            tracing::warn!(status, error = %e, "Image generation request failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn schnell_models_use_four_steps() {
        assert_eq!(steps_for_model("black-forest-labs/FLUX.1-schnell"), 4);
        assert_eq!(steps_for_model("black-forest-labs/FLUX.1-SCHNELL-Free"), 4);
        assert_eq!(steps_for_model("black-forest-labs/FLUX.1-dev"), 28);
    }

    #[test]
    fn text_only_body_has_explicit_size() {
        let body = serde_json::to_value(GenerationRequestBody::build("m/flux-dev", "a cat", None)).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "m/flux-dev",
                "prompt": "a cat",
                "steps": 28,
                "n": 1,
                "response_format": "b64_json",
                "width": 1024,
                "height": 1024
            })
        );
    }

    #[test]
    fn kontext_models_use_condition_image() {
        let body = GenerationRequestBody::build("black-forest-labs/FLUX.1-Kontext-pro", "p", Some("AAA".into()));
        assert_eq!(body.condition_image.as_deref(), Some("AAA"));
        assert!(body.image_b64.is_none());
        assert!(body.width.is_none());
    }

    #[test]
    fn other_models_use_image_b64() {
        let body = GenerationRequestBody::build("black-forest-labs/FLUX.1-schnell", "p", Some("AAA".into()));
        assert_eq!(body.image_b64.as_deref(), Some("AAA"));
        assert!(body.condition_image.is_none());
    }

    #[test]
    fn error_message_prefers_nested_then_top_level_then_raw() {
        assert_eq!(extract_error_message(503, r#"{"error":{"message":"overloaded"}}"#), "overloaded");
        assert_eq!(extract_error_message(400, r#"{"message":"bad prompt"}"#), "bad prompt");
        assert_eq!(extract_error_message(502, "Bad Gateway"), "Bad Gateway");
        assert_eq!(extract_error_message(500, ""), "HTTP 500");
    }

    #[test]
    fn non_200_becomes_api_error_with_status() {
        let err = interpret_generation_response(503, r#"{"error":{"message":"overloaded"}}"#).unwrap_err();
        assert_eq!(err, ProcessingError::ApiError { code: 503, message: "overloaded".into() });
    }

    #[test]
    fn success_without_payload_is_invalid() {
        assert_eq!(
            interpret_generation_response(200, r#"{"data":[]}"#),
            Err(ProcessingError::InvalidResponse)
        );
        assert_eq!(interpret_generation_response(200, "not json"), Err(ProcessingError::InvalidResponse));
        assert_eq!(
            interpret_generation_response(200, r#"{"data":[{"b64_json":"aGk="}]}"#),
            Ok("aGk=".to_string())
        );
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let client = GenerationClient::new(&GenerationSettings {
            api_url: "http://127.0.0.1:9/never".into(),
            ..Default::default()
        });
        let call = GenerationCall { prompt: "p".into(), image_path: None, model: DEFAULT_MODEL.into() };
        assert_eq!(client.generate(&call).await, Err(ProcessingError::ApiNotConfigured));
    }
}
