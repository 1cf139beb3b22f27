/*!
 * End-to-end tests: image source to translated text through a real provider client
 */

use anyhow::Result;
use snaptrad::app_config::{Config, TranslationProvider};
use snaptrad::app_controller::{CaptureController, ControllerSettings};
use snaptrad::camera::mock::MockCamera;
use snaptrad::errors::SessionError;
use snaptrad::providers::build_translator;
use snaptrad::session::{Session, SessionStatus};
use std::sync::Arc;
use std::time::Duration;
use crate::common::{self, stub_server::StubServer};

fn gemini_text(text: &str) -> String {
    serde_json::json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
    })
    .to_string()
}

fn config_for(server: &StubServer, provider: TranslationProvider) -> Config {
    let mut config = Config::default();
    config.translation.provider = provider;
    config.translation.endpoint = server.url().to_string();
    config.translation.api_key = common::TEST_API_KEY.to_string();
    config.translation.timeout_secs = 5;
    config
}

/// Test selecting a file and translating it ends in Done with the text
#[tokio::test]
async fn test_file_to_text_withGemini_shouldBeDone() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_image(temp_dir.path(), "placa.png", 16, 16)?;
    let server = StubServer::start(200, gemini_text("Olá mundo")).await;

    let mut controller = CaptureController::from_config(&config_for(&server, TranslationProvider::Gemini))?;
    controller.select_file(&path).await;
    controller.submit().await;

    let session = controller.session();
    assert_eq!(session.status, SessionStatus::Done);
    assert_eq!(session.translated_text.as_deref(), Some("Olá mundo"));
    assert_eq!(session.error, None);

    let body = server.requests()[0].json();
    assert_eq!(
        body["contents"][0]["parts"][0]["inline_data"]["mime_type"],
        "image/png"
    );
    Ok(())
}

/// Test a 404 from the service surfaces the status in the message
#[tokio::test]
async fn test_file_to_text_withNotFound_shouldShowStatusInMessage() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_image(temp_dir.path(), "placa.jpg", 16, 16)?;
    let server = StubServer::start(404, r#"{"error": {"code": 404}}"#).await;

    let mut controller = CaptureController::from_config(&config_for(&server, TranslationProvider::Gemini))?;
    controller.select_file(&path).await;
    controller.submit().await;

    let session = controller.session();
    assert_eq!(session.status, SessionStatus::Failed);
    assert_eq!(session.error, Some(SessionError::EndpointNotFound { status: 404 }));
    assert_eq!(
        session.error_message().as_deref(),
        Some("Falha ao traduzir. Modelo ou endpoint não encontrado (HTTP 404).")
    );
    Ok(())
}

/// Test a rejected key is reported as a credential problem
#[tokio::test]
async fn test_file_to_text_withRejectedKey_shouldBeInvalidCredential() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_image(temp_dir.path(), "placa.jpg", 16, 16)?;
    let server = StubServer::start(
        400,
        r#"{"error": {"code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT", "details": [{"reason": "API_KEY_INVALID"}]}}"#,
    )
    .await;

    let mut controller = CaptureController::from_config(&config_for(&server, TranslationProvider::Gemini))?;
    controller.select_file(&path).await;
    controller.submit().await;

    let session = controller.session();
    assert_eq!(session.status, SessionStatus::Failed);
    assert!(matches!(session.error, Some(SessionError::InvalidCredential(_))));
    Ok(())
}

/// Test a success without text is reported as no text identified
#[tokio::test]
async fn test_file_to_text_withBlankText_shouldBeEmptyResult() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_image(temp_dir.path(), "placa.png", 16, 16)?;
    let server = StubServer::start(200, gemini_text("   ")).await;

    let mut controller = CaptureController::from_config(&config_for(&server, TranslationProvider::Gemini))?;
    controller.select_file(&path).await;
    controller.submit().await;

    let session = controller.session();
    assert_eq!(session.status, SessionStatus::Failed);
    assert_eq!(session.error, Some(SessionError::EmptyResult));
    assert_eq!(session.translated_text, None);
    Ok(())
}

/// Test a service that never answers in time is cut off
#[tokio::test]
async fn test_file_to_text_withHangingServer_shouldTimeOut() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_image(temp_dir.path(), "placa.png", 16, 16)?;
    let server =
        StubServer::start_with_delay(200, gemini_text("tarde"), Duration::from_secs(5)).await;

    let mut config = config_for(&server, TranslationProvider::Gemini);
    config.translation.timeout_secs = 1;
    let mut controller = CaptureController::from_config(&config)?;
    controller.select_file(&path).await;
    controller.submit().await;

    let session = controller.session();
    assert_eq!(session.status, SessionStatus::Failed);
    assert_eq!(session.error, Some(SessionError::Timeout(1)));
    Ok(())
}

/// Test a missing key fails before any request reaches the service
#[tokio::test]
async fn test_file_to_text_withoutKey_shouldNotContactService() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_image(temp_dir.path(), "placa.png", 16, 16)?;
    let server = StubServer::start(200, gemini_text("Olá mundo")).await;

    let mut config = config_for(&server, TranslationProvider::Gemini);
    config.translation.api_key = String::new();
    let mut controller = CaptureController::from_config(&config)?;
    controller.select_file(&path).await;
    controller.submit().await;

    assert_eq!(controller.session().error, Some(SessionError::MissingCredential));
    assert_eq!(server.request_count(), 0);
    Ok(())
}

/// Test camera capture through to an OpenAI-compatible service
#[tokio::test]
async fn test_camera_to_text_withOpenAI_shouldSendJpegSnapshot() -> Result<()> {
    let server = StubServer::start(
        200,
        r#"{"choices": [{"message": {"role": "assistant", "content": "Entrada de ar"}}]}"#,
    )
    .await;
    let config = config_for(&server, TranslationProvider::OpenAI);

    let camera = MockCamera::working();
    let mut controller = CaptureController::new(
        Arc::new(camera.clone()),
        build_translator(&config.translation)?,
        ControllerSettings::from_config(&config),
    );

    controller.open_camera().await;
    controller.capture();
    assert_eq!(camera.stop_count(), 1);
    controller.submit().await;

    assert_eq!(controller.session().status, SessionStatus::Done);
    assert_eq!(
        controller.session().translated_text.as_deref(),
        Some("Entrada de ar")
    );

    let body = server.requests()[0].json();
    let url = body["messages"][0]["content"]
        .as_array()
        .and_then(|parts| parts.iter().find(|part| part["type"] == "image_url"))
        .and_then(|part| part["image_url"]["url"].as_str())
        .unwrap_or_default()
        .to_string();
    assert!(url.starts_with("data:image/jpeg;base64,"));

    controller.reset();
    assert_eq!(controller.session(), &Session::default());
    assert_eq!(camera.stop_count(), 1);
    Ok(())
}

/// Test a second attempt after a failure reuses the image
#[tokio::test]
async fn test_retry_afterServiceFailure_shouldResubmitSameImage() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_image(temp_dir.path(), "placa.png", 16, 16)?;
    let server = StubServer::start(503, r#"{"error": "unavailable"}"#).await;

    let mut controller =
        CaptureController::from_config(&config_for(&server, TranslationProvider::Anthropic))?;
    controller.select_file(&path).await;
    controller.submit().await;
    assert!(matches!(
        controller.session().error,
        Some(SessionError::TransportFailure(_))
    ));

    controller.retry();
    assert_eq!(controller.session().status, SessionStatus::ImageReady);
    controller.submit().await;

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].body, requests[1].body);
    Ok(())
}
