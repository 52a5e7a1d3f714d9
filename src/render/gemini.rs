//! Direct Gemini image generation backend.

use crate::error::{Result, StudioError};
use crate::render::provider::RenderProvider;
use crate::render::types::{
    ImageFormat, RenderMetadata, RenderRequest, RenderedImage, MODEL_NAME,
};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Instant;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Builder for [`GeminiProvider`].
#[derive(Debug, Clone, Default)]
pub struct GeminiProviderBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
}

impl GeminiProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `GEMINI_API_KEY` env var.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Overrides the API base URL (self-hosted proxies, tests).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builds the provider, resolving the API key.
    pub fn build(self) -> Result<GeminiProvider> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .ok_or_else(|| {
                StudioError::Auth("GEMINI_API_KEY not set and no API Key provided".into())
            })?;

        Ok(GeminiProvider {
            client: reqwest::Client::new(),
            api_key,
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.into()),
        })
    }
}

/// Gemini render backend holding the API key and calling the REST API.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiProvider {
    /// Creates a new [`GeminiProviderBuilder`].
    pub fn builder() -> GeminiProviderBuilder {
        GeminiProviderBuilder::new()
    }

    async fn render_impl(&self, request: &RenderRequest) -> Result<RenderedImage> {
        request.validate()?;
        let start = Instant::now();

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, MODEL_NAME,
        );

        let body = GeminiRequest::from_render_request(request);

        tracing::debug!(
            mode = %request.mode,
            references = request.references.len(),
            "sending render request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(parse_api_error(status.as_u16(), &text));
        }

        let gemini_response: GeminiResponse = response.json().await?;
        let (data, format) = gemini_response.into_image()?;

        let duration_ms = start.elapsed().as_millis() as u64;

        Ok(RenderedImage::new(
            data,
            format,
            RenderMetadata {
                model: Some(MODEL_NAME.to_string()),
                duration_ms: Some(duration_ms),
            },
        ))
    }
}

#[async_trait]
impl RenderProvider for GeminiProvider {
    async fn render(&self, request: &RenderRequest) -> Result<RenderedImage> {
        self.render_impl(request).await
    }

    async fn health_check(&self) -> Result<()> {
        let url = format!("{}/v1beta/models/{}", self.base_url, MODEL_NAME);

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        match response.status().as_u16() {
            401 | 403 => Err(StudioError::Auth("invalid API Key".into())),
            s if !(200..300).contains(&s) => Err(StudioError::Api {
                status: s,
                message: "health check failed".into(),
            }),
            _ => Ok(()),
        }
    }
}

/// Maps an upstream error status and body onto a `StudioError`.
pub(crate) fn parse_api_error(status: u16, text: &str) -> StudioError {
    let text = text.trim().to_string();
    if status == 401 || status == 403 {
        return StudioError::Auth(text);
    }
    let lower = text.to_lowercase();
    if lower.contains("safety") || lower.contains("blocked") || lower.contains("prohibited") {
        return StudioError::ContentBlocked(text);
    }
    StudioError::Api {
        status,
        message: text,
    }
}

// Wire types. The relay client reuses these to build the pass-through body,
// so they are crate-visible rather than private.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiRequest {
    pub(crate) contents: Vec<GeminiContent>,
    pub(crate) generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
pub(crate) struct GeminiContent {
    pub(crate) parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request, either text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum GeminiRequestPart {
    Text { text: String },
    InlineData { inline_data: GeminiInlineData },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiInlineData {
    pub(crate) mime_type: String,
    pub(crate) data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiConfig {
    pub(crate) response_modalities: Vec<String>,
}

impl GeminiRequest {
    /// Builds the wire request: every reference image as inline data first,
    /// then the mode's hidden system prompt as the text part.
    pub(crate) fn from_render_request(req: &RenderRequest) -> Self {
        let mut parts = Vec::with_capacity(req.references.len() + 1);

        for reference in &req.references {
            parts.push(GeminiRequestPart::InlineData {
                inline_data: GeminiInlineData {
                    mime_type: reference.mime_type().to_string(),
                    data: base64::engine::general_purpose::STANDARD.encode(&reference.data),
                },
            });
        }

        parts.push(GeminiRequestPart::Text {
            text: req.mode.system_prompt().to_string(),
        });

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: vec!["IMAGE".to_string()],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiResponse {
    #[serde(default)]
    pub(crate) candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    pub(crate) prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiCandidate {
    #[serde(default)]
    pub(crate) content: Option<GeminiContentResponse>,
    #[serde(default)]
    pub(crate) finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PromptFeedback {
    #[serde(default)]
    pub(crate) block_reason: Option<String>,
    #[serde(default)]
    pub(crate) block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeminiContentResponse {
    pub(crate) parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiPartResponse {
    #[serde(default)]
    pub(crate) inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InlineData {
    pub(crate) mime_type: String,
    pub(crate) data: String,
}

impl GeminiResponse {
    /// Extracts the decoded image payload from a 200 response.
    ///
    /// Blocks are reported back as HTTP 200 with a feedback object or a
    /// safety finish reason, so both are checked here.
    pub(crate) fn into_image(self) -> Result<(Vec<u8>, ImageFormat)> {
        if let Some(ref feedback) = self.prompt_feedback {
            if let Some(ref reason) = feedback.block_reason {
                let msg = feedback
                    .block_reason_message
                    .clone()
                    .unwrap_or_else(|| format!("prompt blocked: {reason}"));
                return Err(StudioError::ContentBlocked(msg));
            }
        }

        let candidate = self.candidates.into_iter().next().ok_or_else(|| {
            StudioError::UnexpectedResponse("no candidates in response".into())
        })?;

        if let Some(ref finish_reason) = candidate.finish_reason {
            match finish_reason.as_str() {
                "SAFETY" | "IMAGE_SAFETY" | "IMAGE_PROHIBITED_CONTENT" | "RECITATION"
                | "IMAGE_RECITATION" | "PROHIBITED_CONTENT" | "BLOCKLIST" => {
                    return Err(StudioError::ContentBlocked(format!(
                        "content blocked by safety filter: {finish_reason}"
                    )));
                }
                "IMAGE_OTHER" | "NO_IMAGE" => {
                    return Err(StudioError::UnexpectedResponse(format!(
                        "generation failed: {finish_reason}"
                    )));
                }
                _ => {} // STOP, MAX_TOKENS, etc. are normal
            }
        }

        let content = candidate
            .content
            .ok_or_else(|| StudioError::UnexpectedResponse("no content in candidate".into()))?;

        let inline_data = content
            .parts
            .into_iter()
            .find_map(|p| p.inline_data)
            .ok_or_else(|| StudioError::UnexpectedResponse("no image data in response".into()))?;

        let data = base64::engine::general_purpose::STANDARD
            .decode(&inline_data.data)
            .map_err(|e| StudioError::Decode(e.to_string()))?;

        let format = ImageFormat::from_mime_type(&inline_data.mime_type)
            .or_else(|| ImageFormat::from_magic_bytes(&data))
            .unwrap_or_default();

        Ok((data, format))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::types::{Mode, ReferenceImage};

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    fn reference() -> ReferenceImage {
        ReferenceImage::from_bytes(PNG_MAGIC.to_vec()).unwrap()
    }

    #[test]
    fn test_builder_with_explicit_key() {
        let provider = GeminiProviderBuilder::new().api_key("test-key").build();
        assert!(provider.is_ok());
    }

    #[test]
    fn test_request_parts_order() {
        let req = RenderRequest::new(Mode::Mix)
            .with_reference(reference())
            .with_reference(reference());
        let wire = GeminiRequest::from_render_request(&req);

        assert_eq!(wire.contents.len(), 1);
        let parts = &wire.contents[0].parts;
        // Two references followed by the hidden prompt.
        assert_eq!(parts.len(), 3);
        assert!(matches!(parts[0], GeminiRequestPart::InlineData { .. }));
        assert!(matches!(parts[1], GeminiRequestPart::InlineData { .. }));
        match &parts[2] {
            GeminiRequestPart::Text { text } => {
                assert_eq!(text, Mode::Mix.system_prompt());
            }
            _ => panic!("last part should be the prompt"),
        }
        assert_eq!(
            wire.generation_config.response_modalities,
            vec!["IMAGE".to_string()]
        );
    }

    #[test]
    fn test_request_serialization_uses_camel_case() {
        let req = RenderRequest::new(Mode::Single).with_reference(reference());
        let wire = GeminiRequest::from_render_request(&req);
        let json = serde_json::to_value(&wire).unwrap();

        assert!(json.get("generationConfig").is_some());
        assert!(json.get("generation_config").is_none());
        let part = &json["contents"][0]["parts"][0];
        assert_eq!(part["inline_data"]["mimeType"], "image/png");
    }

    #[test]
    fn test_response_into_image() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [{
                        "inlineData": {
                            "mimeType": "image/png",
                            "data": "iVBORw0KGgo="
                        }
                    }]
                },
                "finishReason": "STOP"
            }]
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        let (data, format) = resp.into_image().unwrap();
        assert!(!data.is_empty());
        assert_eq!(format, ImageFormat::Png);
    }

    #[test]
    fn test_response_prompt_feedback_block() {
        let json = r#"{
            "candidates": [],
            "promptFeedback": {
                "blockReason": "SAFETY",
                "blockReasonMessage": "Prompt was blocked due to safety"
            }
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        let err = resp.into_image().unwrap_err();
        assert!(matches!(err, StudioError::ContentBlocked(_)));
    }

    #[test]
    fn test_response_safety_finish_reason() {
        let json = r#"{"candidates": [{"finishReason": "IMAGE_SAFETY"}]}"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            resp.into_image().unwrap_err(),
            StudioError::ContentBlocked(_)
        ));
    }

    #[test]
    fn test_response_missing_image_data() {
        let json = r#"{"candidates": [{"content": {"parts": [{}]}}]}"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            resp.into_image().unwrap_err(),
            StudioError::UnexpectedResponse(_)
        ));
    }

    #[test]
    fn test_parse_api_error() {
        assert!(matches!(
            parse_api_error(401, "bad key"),
            StudioError::Auth(_)
        ));
        assert!(matches!(
            parse_api_error(400, "request blocked for safety"),
            StudioError::ContentBlocked(_)
        ));
        assert!(matches!(
            parse_api_error(500, "boom"),
            StudioError::Api { status: 500, .. }
        ));
    }
}
