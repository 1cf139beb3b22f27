use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::encoded_image::EncodedImage;
use crate::errors::ProviderError;
use crate::providers::{http_client, send_json, Provider};

/// Anthropic client for interacting with Anthropic API
#[derive(Debug)]
pub struct Anthropic {
    /// HTTP client for API requests
    client: Client,
    /// API endpoint URL
    endpoint: String,
    /// Model name
    model: String,
}

/// Anthropic message request
#[derive(Debug, Serialize)]
pub struct AnthropicRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<AnthropicMessage>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Maximum number of tokens to generate
    max_tokens: u32,
}

/// Anthropic message format
#[derive(Debug, Serialize)]
pub struct AnthropicMessage {
    /// Role of the message sender (user, assistant)
    pub role: String,

    /// Content blocks of the message
    pub content: Vec<AnthropicBlock>,
}

/// Content block of a request message
#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnthropicBlock {
    Text { text: String },
    Image { source: ImageSource },
}

/// Inline base64 image source
#[derive(Debug, Serialize, PartialEq)]
pub struct ImageSource {
    #[serde(rename = "type")]
    pub source_type: String,
    pub media_type: String,
    pub data: String,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct TokenUsage {
    /// Number of input tokens
    pub input_tokens: u32,
    /// Number of output tokens
    pub output_tokens: u32,
}

/// Anthropic response
#[derive(Debug, Deserialize)]
pub struct AnthropicResponse {
    /// The content of the response
    #[serde(default)]
    pub content: Vec<AnthropicContent>,
    /// Token usage information
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

/// Individual content block in an Anthropic response
#[derive(Debug, Deserialize)]
pub struct AnthropicContent {
    /// The type of content
    #[serde(rename = "type")]
    pub content_type: String,

    /// The actual text content
    #[serde(default)]
    pub text: String,
}

impl AnthropicRequest {
    /// Create a new Anthropic request
    pub fn new(model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
            max_tokens,
        }
    }

    /// Add a user message with the image followed by the instruction
    pub fn add_image_message(mut self, image: &EncodedImage, instruction: &str) -> Self {
        self.messages.push(AnthropicMessage {
            role: "user".to_string(),
            content: vec![
                AnthropicBlock::Image {
                    source: ImageSource {
                        source_type: "base64".to_string(),
                        media_type: image.mime_type().to_string(),
                        data: image.base64().to_string(),
                    },
                },
                AnthropicBlock::Text {
                    text: instruction.to_string(),
                },
            ],
        });
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

impl Anthropic {
    /// Create a new Anthropic client
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client()?,
            endpoint: endpoint.into(),
            model: model.into(),
        })
    }

    /// URL of the messages method
    pub fn api_url(&self) -> String {
        if self.endpoint.is_empty() {
            "https://api.anthropic.com/v1/messages".to_string()
        } else {
            format!("{}/v1/messages", self.endpoint.trim_end_matches('/'))
        }
    }
}

#[async_trait]
impl Provider for Anthropic {
    type Request = AnthropicRequest;
    type Response = AnthropicResponse;

    fn name(&self) -> &'static str {
        "Anthropic"
    }

    fn build_request(&self, image: &EncodedImage, instruction: &str) -> Self::Request {
        AnthropicRequest::new(self.model.clone(), 4096)
            .add_image_message(image, instruction)
            .temperature(0.2)
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
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request);

        send_json(self.name(), builder).await
    }

    fn extract_text(response: &Self::Response) -> String {
        response
            .content
            .iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text.clone())
            .collect()
    }
}
