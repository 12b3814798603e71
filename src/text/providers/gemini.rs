//! Gemini (Google) hosted text generation.

use crate::error::{parse_retry_after, sanitize_error_message, MedScanError, Result};
use crate::text::provider::TextProvider;
use crate::text::types::{ModelReply, PromptRequest};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Instant;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Builder for [`GeminiClient`].
#[derive(Debug, Clone, Default)]
pub struct GeminiClientBuilder {
    api_key: Option<String>,
}

impl GeminiClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to the `GOOGLE_API_KEY` env var.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Builds the client, resolving the API key.
    pub fn build(self) -> Result<GeminiClient> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .ok_or_else(|| {
                MedScanError::Auth("GOOGLE_API_KEY not set and no API key provided".into())
            })?;

        Ok(GeminiClient {
            client: reqwest::Client::new(),
            api_key,
        })
    }
}

/// Client for Gemini's `generateContent` endpoint.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
}

impl GeminiClient {
    /// Creates a new `GeminiClientBuilder`.
    pub fn builder() -> GeminiClientBuilder {
        GeminiClientBuilder::new()
    }

    async fn generate_impl(&self, model_id: &str, request: &PromptRequest) -> Result<ModelReply> {
        let start = Instant::now();

        let url = format!("{API_BASE}/{model_id}:generateContent");
        let body = GeminiRequest::from_prompt_request(request);

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
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text, &headers));
        }

        let parsed: GeminiResponse = response.json().await?;

        // Blocked prompts come back as HTTP 200 with prompt_feedback set
        if let Some(ref feedback) = parsed.prompt_feedback {
            if let Some(ref reason) = feedback.block_reason {
                let msg = feedback
                    .block_reason_message
                    .clone()
                    .unwrap_or_else(|| format!("prompt blocked: {reason}"));
                return Err(MedScanError::ContentBlocked(msg));
            }
        }

        let candidate = parsed.candidates.into_iter().next().ok_or_else(|| {
            MedScanError::UnexpectedResponse("no candidates in Gemini response".into())
        })?;

        if let Some(ref finish_reason) = candidate.finish_reason {
            match finish_reason.as_str() {
                "SAFETY" | "RECITATION" | "PROHIBITED_CONTENT" | "BLOCKLIST" => {
                    return Err(MedScanError::ContentBlocked(format!(
                        "content blocked by Gemini safety filter: {finish_reason}"
                    )));
                }
                _ => {} // STOP, MAX_TOKENS, etc. are normal
            }
        }

        let content = candidate.content.ok_or_else(|| {
            MedScanError::UnexpectedResponse("no content in Gemini candidate".into())
        })?;

        let text: String = content
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(MedScanError::UnexpectedResponse(
                "no text in Gemini response".into(),
            ));
        }

        Ok(ModelReply {
            text,
            model: model_id.to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

fn parse_error(status: u16, text: &str, headers: &reqwest::header::HeaderMap) -> MedScanError {
    let text = sanitize_error_message(text);
    if status == 404 {
        return MedScanError::InvalidRequest(
            "model not found. Verify the model name is correct.".into(),
        );
    }
    if status == 429 {
        let retry_after = parse_retry_after(headers).map(std::time::Duration::from_secs);
        return MedScanError::RateLimited { retry_after };
    }
    if status == 401 || status == 403 {
        return MedScanError::Auth(text);
    }
    let lower = text.to_lowercase();
    if lower.contains("safety")
        || lower.contains("blocked")
        || lower.contains("content_policy")
        || lower.contains("prohibited")
    {
        return MedScanError::ContentBlocked(text);
    }
    MedScanError::Api {
        status,
        message: text,
    }
}

#[async_trait]
impl TextProvider for GeminiClient {
    async fn generate(&self, model_id: &str, request: &PromptRequest) -> Result<ModelReply> {
        self.generate_impl(model_id, request).await
    }

    async fn health_check(&self, model_id: &str) -> Result<()> {
        let url = format!("{API_BASE}/{model_id}");

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        match response.status().as_u16() {
            401 | 403 => Err(MedScanError::Auth("invalid API key".into())),
            404 => Err(MedScanError::InvalidRequest(
                "model not found. Verify the model name is correct.".into(),
            )),
            s if !(200..300).contains(&s) => Err(MedScanError::Api {
                status: s,
                message: "health check failed".into(),
            }),
            _ => Ok(()),
        }
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - can be text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    Text { text: String },
    InlineData { inline_data: GeminiInlineData },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
}

impl GeminiRequest {
    fn from_prompt_request(req: &PromptRequest) -> Self {
        let mut parts = Vec::new();

        // Image first so the prompt text reads as an instruction about it
        if let Some(ref image) = req.image {
            parts.push(GeminiRequestPart::InlineData {
                inline_data: GeminiInlineData {
                    mime_type: image.mime_type().to_string(),
                    data: base64::engine::general_purpose::STANDARD.encode(&image.data),
                },
            });
        }

        parts.push(GeminiRequestPart::Text {
            text: req.prompt.clone(),
        });

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GenerationConfig {
                temperature: req.sampling.temperature,
                top_p: req.sampling.top_p,
                max_output_tokens: req.sampling.max_output_tokens,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
struct GeminiPartResponse {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::types::ImageAttachment;

    #[test]
    fn test_builder_with_explicit_key() {
        let client = GeminiClientBuilder::new().api_key("test-key").build();
        assert!(client.is_ok());
    }

    #[test]
    fn test_request_construction_basic() {
        let req = PromptRequest::new("What does TDS mean on a prescription?");
        let gemini_req = GeminiRequest::from_prompt_request(&req);

        assert_eq!(gemini_req.contents.len(), 1);
        assert_eq!(gemini_req.contents[0].parts.len(), 1);
        assert_eq!(gemini_req.generation_config.temperature, 0.0);
        assert_eq!(gemini_req.generation_config.max_output_tokens, 2048);
    }

    #[test]
    fn test_request_construction_with_image() {
        let png_data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        let req = PromptRequest::new("Read this prescription")
            .with_image(ImageAttachment::from_bytes(png_data).unwrap());
        let gemini_req = GeminiRequest::from_prompt_request(&req);

        // Image part precedes the text part
        assert_eq!(gemini_req.contents[0].parts.len(), 2);
        assert!(matches!(
            gemini_req.contents[0].parts[0],
            GeminiRequestPart::InlineData { .. }
        ));
        assert!(matches!(
            gemini_req.contents[0].parts[1],
            GeminiRequestPart::Text { .. }
        ));
    }

    #[test]
    fn test_request_serialization_uses_camel_case() {
        let req = PromptRequest::new("hello");
        let gemini_req = GeminiRequest::from_prompt_request(&req);
        let json = serde_json::to_value(&gemini_req).unwrap();

        let config = json.get("generationConfig").unwrap();
        assert!(config.get("topP").is_some());
        assert!(config.get("maxOutputTokens").is_some());
        assert!(json.get("generation_config").is_none());
    }

    #[test]
    fn test_response_deserialization() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [{"text": "Paracetamol is an analgesic."}]
                },
                "finishReason": "STOP"
            }]
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.candidates.len(), 1);
        assert_eq!(resp.candidates[0].finish_reason.as_deref(), Some("STOP"));

        let content = resp.candidates[0].content.as_ref().unwrap();
        assert_eq!(
            content.parts[0].text.as_deref(),
            Some("Paracetamol is an analgesic.")
        );
    }

    #[test]
    fn test_multi_part_text_concatenates_in_order() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [{"text": "**Name**: "}, {"text": "Calpol"}]
                }
            }]
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        let content = resp.candidates.into_iter().next().unwrap().content.unwrap();
        let text: String = content
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");
        assert_eq!(text, "**Name**: Calpol");
    }

    #[test]
    fn test_response_with_prompt_feedback_block() {
        let json = r#"{
            "candidates": [],
            "promptFeedback": {
                "blockReason": "SAFETY",
                "blockReasonMessage": "Prompt was blocked due to safety"
            }
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        assert!(resp.candidates.is_empty());
        let feedback = resp.prompt_feedback.unwrap();
        assert_eq!(feedback.block_reason.as_deref(), Some("SAFETY"));
    }

    #[test]
    fn test_parse_error_status_mapping() {
        let headers = reqwest::header::HeaderMap::new();

        assert!(matches!(
            parse_error(401, "bad key", &headers),
            MedScanError::Auth(_)
        ));
        assert!(matches!(
            parse_error(404, "", &headers),
            MedScanError::InvalidRequest(_)
        ));
        assert!(matches!(
            parse_error(429, "", &headers),
            MedScanError::RateLimited { .. }
        ));
        assert!(matches!(
            parse_error(400, "request blocked by safety system", &headers),
            MedScanError::ContentBlocked(_)
        ));
        assert!(matches!(
            parse_error(500, "internal", &headers),
            MedScanError::Api { status: 500, .. }
        ));
    }
}
