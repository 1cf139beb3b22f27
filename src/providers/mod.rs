/*!
 * Provider implementations for different inference services.
 *
 * This module contains client implementations for multimodal LLM providers:
 * - Gemini: Google generateContent REST API
 * - OpenAI: chat completions API (and compatible servers)
 * - Anthropic: Anthropic messages API
 * - Mock: scripted provider for tests
 *
 * The controller only sees `ImageTranslator`, a single capability
 * (image in, text out) implemented for every `Provider`.
 */

use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{TranslationConfig, TranslationProvider};
use crate::encoded_image::EncodedImage;
use crate::errors::ProviderError;

pub mod anthropic;
pub mod gemini;
pub mod mock;
pub mod openai;

/// Seconds allowed to establish a connection to a provider
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably by the capture controller.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Short provider name used in logs
    fn name(&self) -> &'static str;

    /// Build the vendor request carrying the image and the instruction
    fn build_request(&self, image: &EncodedImage, instruction: &str) -> Self::Request;

    /// Complete a request using this provider
    ///
    /// # Arguments
    /// * `api_key` - The credential to authenticate with
    /// * `request` - The request to complete
    async fn complete(
        &self,
        api_key: &str,
        request: Self::Request,
    ) -> Result<Self::Response, ProviderError>;

    /// Extract text from the provider response
    fn extract_text(response: &Self::Response) -> String;
}

/// The single capability the controller needs from a backend
#[async_trait]
pub trait ImageTranslator: Send + Sync + Debug {
    /// Send the image and instruction, returning the non-empty translated text
    async fn translate_image(
        &self,
        api_key: &str,
        image: &EncodedImage,
        instruction: &str,
    ) -> Result<String, ProviderError>;
}

#[async_trait]
impl<P: Provider> ImageTranslator for P {
    async fn translate_image(
        &self,
        api_key: &str,
        image: &EncodedImage,
        instruction: &str,
    ) -> Result<String, ProviderError> {
        debug!(
            "Sending {} image ({} bytes) to {}",
            image.mime_type(),
            image.byte_len(),
            self.name()
        );

        let request = self.build_request(image, instruction);
        let response = self.complete(api_key, request).await?;
        let text = P::extract_text(&response);
        let text = text.trim();

        if text.is_empty() {
            warn!("{} returned a response without text", self.name());
            return Err(ProviderError::EmptyResponse);
        }

        Ok(text.to_string())
    }
}

/// Build the translator for the configured provider
pub fn build_translator(config: &TranslationConfig) -> Result<Arc<dyn ImageTranslator>, ProviderError> {
    let endpoint = config.get_endpoint();
    let model = config.get_model();

    let translator: Arc<dyn ImageTranslator> = match config.provider {
        TranslationProvider::Gemini => Arc::new(gemini::Gemini::new(endpoint, model)?),
        TranslationProvider::OpenAI => Arc::new(openai::OpenAI::new(endpoint, model)?),
        TranslationProvider::Anthropic => Arc::new(anthropic::Anthropic::new(endpoint, model)?),
    };
    Ok(translator)
}

/// HTTP client shared by the REST providers
///
/// Only the connect phase is bounded here; the whole request is bounded by the caller.
pub(crate) fn http_client() -> Result<Client, ProviderError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .build()
        .map_err(|e| {
            error!("Failed to build HTTP client: {}", e);
            ProviderError::ConnectionError(format!("failed to build HTTP client: {}", e))
        })
}

/// Send a JSON request and decode the JSON answer, mapping HTTP failures to `ProviderError`
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &str,
    builder: RequestBuilder,
) -> Result<T, ProviderError> {
    let response = builder.send().await.map_err(|e| {
        error!("Failed to send request to {} API: {}", provider, e);
        ProviderError::ConnectionError(e.to_string())
    })?;

    let status = response.status();
    if !status.is_success() {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to get error response text".to_string());
        error!("{} API error ({}): {}", provider, status, error_text);
        return Err(ProviderError::from_status(
            status.as_u16(),
            error_text,
            retry_after_secs,
        ));
    }

    response.json::<T>().await.map_err(|e| {
        error!("Failed to parse {} API response: {}", provider, e);
        ProviderError::ParseError(e.to_string())
    })
}
