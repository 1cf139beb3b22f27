use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::encoded_image::EncodedImage;
use crate::errors::ProviderError;
use crate::providers::{http_client, send_json, Provider};

/// Gemini client for the generateContent REST API
#[derive(Debug)]
pub struct Gemini {
    /// HTTP client for API requests
    client: Client,
    /// API base URL, e.g. `https://generativelanguage.googleapis.com`
    endpoint: String,
    /// Model name, e.g. `gemini-flash-latest`
    model: String,
}

/// generateContent request body
#[derive(Debug, Serialize)]
pub struct GeminiRequest {
    /// Conversation turns; a single user turn for image translation
    pub contents: Vec<GeminiContent>,

    /// Sampling settings
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// A turn made of parts
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiContent {
    /// Role of the turn author (user, model)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Text and inline data parts
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

/// One part of a turn: either text or inline data
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GeminiPart {
    /// Text content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Inline binary content
    #[serde(
        default,
        rename = "inline_data",
        alias = "inlineData",
        skip_serializing_if = "Option::is_none"
    )]
    pub inline_data: Option<InlineData>,

    /// Set by thinking models on reasoning parts
    #[serde(default, skip_serializing)]
    pub thought: Option<bool>,
}

/// Base64 payload with its MIME type
#[derive(Debug, Serialize, Deserialize)]
pub struct InlineData {
    #[serde(rename = "mime_type", alias = "mimeType")]
    pub mime_type: String,
    pub data: String,
}

/// Sampling settings
#[derive(Debug, Serialize)]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// generateContent response
#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    /// Candidate answers; the first one is used
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,

    /// Token usage information
    #[serde(rename = "usageMetadata", default)]
    pub usage_metadata: Option<UsageMetadata>,
}

/// One candidate answer
#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    #[serde(default)]
    pub content: Option<GeminiContent>,

    #[serde(rename = "finishReason", default)]
    pub finish_reason: Option<String>,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    pub prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount", default)]
    pub candidates_token_count: u32,
}

impl GeminiRequest {
    /// Single user turn with the image first and the instruction after it
    pub fn for_image(image: &EncodedImage, instruction: &str) -> Self {
        Self {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![
                    GeminiPart {
                        inline_data: Some(InlineData {
                            mime_type: image.mime_type().to_string(),
                            data: image.base64().to_string(),
                        }),
                        ..Default::default()
                    },
                    GeminiPart {
                        text: Some(instruction.to_string()),
                        ..Default::default()
                    },
                ],
            }],
            generation_config: None,
        }
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.generation_config
            .get_or_insert(GenerationConfig {
                temperature: None,
                max_output_tokens: None,
            })
            .temperature = Some(temperature);
        self
    }

    /// Set the maximum number of tokens to generate
    pub fn max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.generation_config
            .get_or_insert(GenerationConfig {
                temperature: None,
                max_output_tokens: None,
            })
            .max_output_tokens = Some(max_output_tokens);
        self
    }
}

impl Gemini {
    /// Create a new Gemini client
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client()?,
            endpoint: endpoint.into(),
            model: model.into(),
        })
    }

    /// URL of the generateContent method for the configured model
    pub fn api_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl Provider for Gemini {
    type Request = GeminiRequest;
    type Response = GeminiResponse;

    fn name(&self) -> &'static str {
        "Gemini"
    }

    fn build_request(&self, image: &EncodedImage, instruction: &str) -> Self::Request {
        GeminiRequest::for_image(image, instruction)
            .temperature(0.2)
            .max_output_tokens(4096)
    }

    async fn complete(
        &self,
        api_key: &str,
        request: Self::Request,
    ) -> Result<Self::Response, ProviderError> {
        let builder = self
            .client
            .post(self.api_url())
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", api_key)
            .json(&request);

        send_json(self.name(), builder).await
    }

    fn extract_text(response: &Self::Response) -> String {
        response
            .candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter(|part| !part.thought.unwrap_or(false))
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}
