/*!
 * Mock provider implementations for testing.
 *
 * This module provides a mock provider that simulates different behaviors:
 * - `MockProvider::working(text)` - Always succeeds with the given text
 * - `MockProvider::empty()` - Succeeds with a response carrying no text
 * - `MockProvider::failing(error)` - Always fails with the given error
 * - `MockProvider::slow(delay_ms, text)` - Succeeds after a delay
 *
 * Clones share their request counter, so a test can keep a handle on the
 * provider after handing it to a controller.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::encoded_image::EncodedImage;
use crate::errors::ProviderError;
use crate::providers::Provider;

/// Mock request for testing
#[derive(Debug, Clone)]
pub struct MockRequest {
    /// MIME type of the submitted image
    pub mime_type: String,
    /// Base64 payload of the submitted image
    pub data: String,
    /// Instruction sent with the image
    pub instruction: String,
}

/// Mock response for testing
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// The translated text
    pub text: String,
}

/// Behavior mode for the mock provider
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with the given text
    Working { text: String },
    /// Returns a response with empty text
    Empty,
    /// Always fails with the given error
    Failing(ProviderError),
    /// Succeeds after a delay (for timeout testing)
    Slow { delay_ms: u64, text: String },
}

/// Mock provider for testing controller behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Number of requests received, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Last request and credential received
    last_request: Arc<Mutex<Option<(String, MockRequest)>>>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Create a working mock provider that always returns `text`
    pub fn working(text: impl Into<String>) -> Self {
        Self::new(MockBehavior::Working { text: text.into() })
    }

    /// Create a mock that returns empty responses
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Create a failing mock provider that always returns `error`
    pub fn failing(error: ProviderError) -> Self {
        Self::new(MockBehavior::Failing(error))
    }

    /// Create a mock that answers after `delay_ms`
    pub fn slow(delay_ms: u64, text: impl Into<String>) -> Self {
        Self::new(MockBehavior::Slow {
            delay_ms,
            text: text.into(),
        })
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Credential and request of the most recent call
    pub fn last_request(&self) -> Option<(String, MockRequest)> {
        self.last_request.lock().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    type Request = MockRequest;
    type Response = MockResponse;

    fn name(&self) -> &'static str {
        "Mock"
    }

    fn build_request(&self, image: &EncodedImage, instruction: &str) -> Self::Request {
        MockRequest {
            mime_type: image.mime_type().to_string(),
            data: image.base64().to_string(),
            instruction: instruction.to_string(),
        }
    }

    async fn complete(
        &self,
        api_key: &str,
        request: Self::Request,
    ) -> Result<Self::Response, ProviderError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock() = Some((api_key.to_string(), request));

        match &self.behavior {
            MockBehavior::Working { text } => Ok(MockResponse { text: text.clone() }),
            MockBehavior::Empty => Ok(MockResponse {
                text: String::new(),
            }),
            MockBehavior::Failing(error) => Err(error.clone()),
            MockBehavior::Slow { delay_ms, text } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(*delay_ms)).await;
                Ok(MockResponse { text: text.clone() })
            }
        }
    }

    fn extract_text(response: &Self::Response) -> String {
        response.text.clone()
    }
}
