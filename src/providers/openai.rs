use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::encoded_image::EncodedImage;
use crate::errors::ProviderError;
use crate::providers::{http_client, send_json, Provider};

/// OpenAI client for the chat completions API (or any compatible server)
#[derive(Debug)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API base URL including the version, e.g. `https://api.openai.com/v1`
    endpoint: String,
    /// Model name
    model: String,
}

/// Chat completion request
#[derive(Debug, Serialize)]
pub struct OpenAIRequest {
    /// The model to use
    pub model: String,

    /// The messages for the conversation
    pub messages: Vec<OpenAIMessage>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Chat message with multimodal content
#[derive(Debug, Serialize)]
pub struct OpenAIMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content parts of the message
    pub content: Vec<ContentPart>,
}

/// One content part of a user message
#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

/// Image reference, here always a base64 data URL
#[derive(Debug, Serialize, PartialEq)]
pub struct ImageUrl {
    pub url: String,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    /// Generated choices
    #[serde(default)]
    pub choices: Vec<OpenAIChoice>,

    /// Token usage information
    #[serde(default)]
    pub usage: Option<OpenAIUsage>,
}

/// One generated choice
#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    pub message: OpenAIResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Assistant message; content is null when the model refuses
#[derive(Debug, Deserialize)]
pub struct OpenAIResponseMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct OpenAIUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl OpenAIRequest {
    /// Create a new request for the given model
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Add a user message carrying the instruction and the image
    pub fn add_image_message(mut self, image: &EncodedImage, instruction: &str) -> Self {
        self.messages.push(OpenAIMessage {
            role: "user".to_string(),
            content: vec![
                ContentPart::Text {
                    text: instruction.to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image.data_url(),
                    },
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

    /// Set the maximum number of tokens to generate
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

impl OpenAI {
    /// Create a new OpenAI client
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client()?,
            endpoint: endpoint.into(),
            model: model.into(),
        })
    }

    /// URL of the chat completions method
    pub fn api_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl Provider for OpenAI {
    type Request = OpenAIRequest;
    type Response = OpenAIResponse;

    fn name(&self) -> &'static str {
        "OpenAI"
    }

    fn build_request(&self, image: &EncodedImage, instruction: &str) -> Self::Request {
        OpenAIRequest::new(self.model.clone())
            .add_image_message(image, instruction)
            .temperature(0.2)
            .max_tokens(4096)
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
            .bearer_auth(api_key)
            .json(&request);

        send_json(self.name(), builder).await
    }

    fn extract_text(response: &Self::Response) -> String {
        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default()
    }
}
