/*!
 * Tests for the capture controller state machine
 */

use anyhow::Result;
use snaptrad::app_controller::ControllerSettings;
use snaptrad::camera::mock::MockCamera;
use snaptrad::camera::Facing;
use snaptrad::errors::{AppError, ProviderError, SessionError};
use snaptrad::providers::mock::MockProvider;
use snaptrad::session::{Session, SessionStatus, View};
use std::time::Duration;
use crate::common;

/// Test a fresh controller starts from the zero session
#[test]
fn test_new_shouldStartIdle() {
    let camera = MockCamera::working();
    let provider = MockProvider::working("x");
    let controller = common::controller_with(&camera, &provider, common::test_settings());

    assert_eq!(controller.session(), &Session::default());
    assert!(!controller.is_camera_live());
    assert_eq!(camera.open_count(), 0);
}

/// Test opening the camera requests the rear device
#[tokio::test]
async fn test_open_camera_withWorkingDevice_shouldBeCameraOpen() {
    let camera = MockCamera::working();
    let provider = MockProvider::working("x");
    let mut controller = common::controller_with(&camera, &provider, common::test_settings());

    controller.open_camera().await;

    assert_eq!(controller.session().status, SessionStatus::CameraOpen);
    assert_eq!(controller.session().view(), View::Camera);
    assert_eq!(camera.last_facing(), Some(Facing::Environment));
    assert!(controller.is_camera_live());
}

/// Test a denied camera leaves the session idle with a permission error
#[tokio::test]
async fn test_open_camera_withDeniedDevice_shouldBeIdleWithPermissionError() {
    let camera = MockCamera::denied();
    let provider = MockProvider::working("x");
    let mut controller = common::controller_with(&camera, &provider, common::test_settings());

    controller.open_camera().await;

    let session = controller.session();
    assert_eq!(session.status, SessionStatus::Idle);
    assert!(matches!(session.error, Some(SessionError::PermissionDenied(_))));
    assert_eq!(
        session.error_message().as_deref(),
        Some("Não foi possível acessar a câmera. Verifique as permissões.")
    );
    assert!(!controller.is_camera_live());
}

/// Test a missing device is reported the same way
#[tokio::test]
async fn test_open_camera_withMissingDevice_shouldBeIdleWithPermissionError() {
    let camera = MockCamera::missing();
    let provider = MockProvider::working("x");
    let mut controller = common::controller_with(&camera, &provider, common::test_settings());

    controller.open_camera().await;

    assert_eq!(controller.session().status, SessionStatus::Idle);
    assert!(matches!(
        controller.session().error,
        Some(SessionError::PermissionDenied(_))
    ));
}

/// Test capture stops the stream exactly once and keeps a JPEG
#[tokio::test]
async fn test_capture_withOpenCamera_shouldStopStreamOnceAndBeImageReady() {
    let camera = MockCamera::working();
    let provider = MockProvider::working("x");
    let mut controller = common::controller_with(&camera, &provider, common::test_settings());

    controller.open_camera().await;
    controller.capture();

    let session = controller.session();
    assert_eq!(session.status, SessionStatus::ImageReady);
    assert_eq!(session.view(), View::Preview);
    assert_eq!(session.image.as_ref().map(|i| i.mime_type()), Some("image/jpeg"));
    assert!(session.can_submit());
    assert_eq!(camera.stop_count(), 1);
    assert!(!controller.is_camera_live());

    // leaving the preview later must not stop the stream again
    controller.reset();
    drop(controller);
    assert_eq!(camera.stop_count(), 1);
}

/// Test capture without an open camera
#[test]
fn test_capture_withoutCamera_shouldRecordError() {
    let camera = MockCamera::working();
    let provider = MockProvider::working("x");
    let mut controller = common::controller_with(&camera, &provider, common::test_settings());

    controller.capture();

    assert_eq!(controller.session().status, SessionStatus::Idle);
    assert_eq!(controller.session().error, Some(SessionError::CameraNotOpen));
    assert_eq!(camera.stop_count(), 0);
}

/// Test capture before the first frame keeps the camera open
#[tokio::test]
async fn test_capture_beforeFirstFrame_shouldKeepCameraOpen() {
    let camera = MockCamera::without_frames();
    let provider = MockProvider::working("x");
    let mut controller = common::controller_with(&camera, &provider, common::test_settings());

    controller.open_camera().await;
    controller.capture();

    let session = controller.session();
    assert_eq!(session.status, SessionStatus::CameraOpen);
    assert!(matches!(session.error, Some(SessionError::NoFrame(_))));
    assert!(session.image.is_none());
    assert!(controller.is_camera_live());
    assert_eq!(camera.stop_count(), 0);
}

/// Test a frame that cannot be encoded still releases the camera exactly once
#[tokio::test]
async fn test_capture_withMalformedFrame_shouldStopStreamOnceAndBeIdle() {
    let camera = MockCamera::malformed();
    let provider = MockProvider::working("x");
    let mut controller = common::controller_with(&camera, &provider, common::test_settings());

    controller.open_camera().await;
    controller.capture();

    let session = controller.session();
    assert_eq!(session.status, SessionStatus::Idle);
    assert_eq!(session.view(), View::Picker);
    assert!(matches!(session.error, Some(SessionError::NoFrame(_))));
    assert!(session.image.is_none());
    assert!(session.preview.is_none());
    assert!(!controller.is_camera_live());
    assert_eq!(camera.stop_count(), 1);

    drop(controller);
    assert_eq!(camera.stop_count(), 1);
    assert_eq!(camera.live_streams(), 0);
}

/// Test selecting a file while the camera is open releases the camera
#[tokio::test]
async fn test_select_file_withCameraOpen_shouldStopCameraAndReplaceSource() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_image(temp_dir.path(), "placa.png", 8, 8)?;

    let camera = MockCamera::working();
    let provider = MockProvider::working("x");
    let mut controller = common::controller_with(&camera, &provider, common::test_settings());

    controller.open_camera().await;
    controller.select_file(&path).await;

    let session = controller.session();
    assert_eq!(session.status, SessionStatus::ImageReady);
    assert_eq!(session.view(), View::Preview);
    assert_eq!(session.image.as_ref().map(|i| i.mime_type()), Some("image/png"));
    assert_eq!(camera.stop_count(), 1);
    assert_eq!(camera.live_streams(), 0);
    Ok(())
}

/// Test opening the camera discards a previously selected file
#[tokio::test]
async fn test_open_camera_afterFileSelection_shouldDropPreviousImage() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_image(temp_dir.path(), "placa.png", 8, 8)?;

    let camera = MockCamera::working();
    let provider = MockProvider::working("x");
    let mut controller = common::controller_with(&camera, &provider, common::test_settings());

    controller.select_file(&path).await;
    controller.open_camera().await;

    let session = controller.session();
    assert_eq!(session.status, SessionStatus::CameraOpen);
    assert!(session.image.is_none());
    assert!(session.preview.is_none());
    Ok(())
}

/// Test re-opening the camera stops the previous stream first
#[tokio::test]
async fn test_open_camera_twice_shouldKeepOneLiveStream() {
    let camera = MockCamera::working();
    let provider = MockProvider::working("x");
    let mut controller = common::controller_with(&camera, &provider, common::test_settings());

    controller.open_camera().await;
    controller.open_camera().await;

    assert_eq!(camera.open_count(), 2);
    assert_eq!(camera.stop_count(), 1);
    assert_eq!(camera.live_streams(), 1);
}

/// Test dropping the controller releases an open camera
#[tokio::test]
async fn test_drop_withCameraOpen_shouldStopStream() {
    let camera = MockCamera::working();
    let provider = MockProvider::working("x");
    let mut controller = common::controller_with(&camera, &provider, common::test_settings());

    controller.open_camera().await;
    drop(controller);

    assert_eq!(camera.stop_count(), 1);
    assert_eq!(camera.live_streams(), 0);
}

/// Test an invalid file leaves no image behind
#[tokio::test]
async fn test_select_file_withTextFile_shouldBeIdleWithInvalidImage() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "notes.txt", b"hello")?;

    let camera = MockCamera::working();
    let provider = MockProvider::working("x");
    let mut controller = common::controller_with(&camera, &provider, common::test_settings());

    controller.select_file(&path).await;

    let session = controller.session();
    assert_eq!(session.status, SessionStatus::Idle);
    assert!(session.image.is_none());
    assert!(matches!(session.error, Some(SessionError::InvalidImage(_))));
    Ok(())
}

/// Test submit without an image never reaches the provider
#[tokio::test]
async fn test_submit_withoutImage_shouldNotCallProvider() {
    let camera = MockCamera::working();
    let provider = MockProvider::working("x");
    let mut controller = common::controller_with(&camera, &provider, common::test_settings());

    controller.submit().await;

    let session = controller.session();
    assert_eq!(session.status, SessionStatus::Idle);
    assert_eq!(session.error, Some(SessionError::NoInputSelected));
    assert_eq!(
        session.error_message().as_deref(),
        Some("Nenhuma imagem selecionada para traduzir.")
    );
    assert_eq!(provider.request_count(), 0);
}

/// Test submit without a credential never reaches the provider
#[tokio::test]
async fn test_submit_withoutCredential_shouldFailWithoutCallingProvider() {
    let camera = MockCamera::working();
    let provider = MockProvider::working("x");
    let settings = ControllerSettings {
        api_key: None,
        ..common::test_settings()
    };
    let mut controller = common::controller_with(&camera, &provider, settings);

    controller.select_bytes(&common_png());
    controller.submit().await;

    let session = controller.session();
    assert_eq!(session.status, SessionStatus::Failed);
    assert_eq!(session.error, Some(SessionError::MissingCredential));
    assert!(session.image.is_some());
    assert_eq!(provider.request_count(), 0);
}

/// Test a successful translation
#[tokio::test]
async fn test_submit_withWorkingProvider_shouldBeDoneWithText() {
    common::init_logging();
    let camera = MockCamera::working();
    let provider = MockProvider::working("Olá mundo");
    let mut controller = common::controller_with(&camera, &provider, common::test_settings());

    controller.select_bytes(&common_png());
    controller.submit().await;

    let session = controller.session();
    assert_eq!(session.status, SessionStatus::Done);
    assert_eq!(session.translated_text.as_deref(), Some("Olá mundo"));
    assert_eq!(session.error, None);
    assert_eq!(provider.request_count(), 1);

    let (api_key, request) = provider.last_request().unwrap();
    assert_eq!(api_key, common::TEST_API_KEY);
    assert_eq!(request.mime_type, "image/png");
    assert_eq!(request.instruction, ControllerSettings::default().instruction);
}

/// Test an empty answer is reported as no text identified
#[tokio::test]
async fn test_submit_withEmptyResponse_shouldFailWithEmptyResult() {
    let camera = MockCamera::working();
    let provider = MockProvider::empty();
    let mut controller = common::controller_with(&camera, &provider, common::test_settings());

    controller.select_bytes(&common_png());
    controller.submit().await;

    let session = controller.session();
    assert_eq!(session.status, SessionStatus::Failed);
    assert_eq!(session.error, Some(SessionError::EmptyResult));
    assert_eq!(session.translated_text, None);
    assert_eq!(
        session.error_message().as_deref(),
        Some("Nenhum texto foi identificado na imagem.")
    );
}

/// Test a 404 from the service names the status
#[tokio::test]
async fn test_submit_withNotFound_shouldFailWithEndpointNotFound() {
    let camera = MockCamera::working();
    let provider = MockProvider::failing(ProviderError::ApiError {
        status_code: 404,
        message: "models/unknown is not found".to_string(),
    });
    let mut controller = common::controller_with(&camera, &provider, common::test_settings());

    controller.select_bytes(&common_png());
    controller.submit().await;

    let session = controller.session();
    assert_eq!(session.status, SessionStatus::Failed);
    assert_eq!(session.error, Some(SessionError::EndpointNotFound { status: 404 }));
    assert!(session.error_message().unwrap().contains("404"));
}

/// Test a slow service is cut off by the timeout
#[tokio::test]
async fn test_submit_withSlowProvider_shouldFailWithTimeout() {
    let camera = MockCamera::working();
    let provider = MockProvider::slow(2_000, "late");
    let settings = ControllerSettings {
        timeout: Duration::from_millis(50),
        ..common::test_settings()
    };
    let mut controller = common::controller_with(&camera, &provider, settings);

    controller.select_bytes(&common_png());
    controller.submit().await;

    let session = controller.session();
    assert_eq!(session.status, SessionStatus::Failed);
    assert!(matches!(session.error, Some(SessionError::Timeout(_))));
    assert_eq!(session.translated_text, None);
}

/// Test a failed attempt can be resubmitted without reselecting
#[tokio::test]
async fn test_submit_afterFailure_shouldBeAllowedAgain() {
    let camera = MockCamera::working();
    let provider = MockProvider::failing(ProviderError::ConnectionError("refused".to_string()));
    let mut controller = common::controller_with(&camera, &provider, common::test_settings());

    controller.select_bytes(&common_png());
    controller.submit().await;
    assert!(controller.session().can_submit());
    controller.submit().await;

    assert_eq!(provider.request_count(), 2);
    assert!(matches!(
        controller.session().error,
        Some(SessionError::TransportFailure(_))
    ));
}

/// Test retry returns to the selected image
#[tokio::test]
async fn test_retry_afterDone_shouldBeImageReady() {
    let camera = MockCamera::working();
    let provider = MockProvider::working("Olá mundo");
    let mut controller = common::controller_with(&camera, &provider, common::test_settings());

    controller.select_bytes(&common_png());
    controller.submit().await;
    controller.retry();

    let session = controller.session();
    assert_eq!(session.status, SessionStatus::ImageReady);
    assert!(session.image.is_some());
    assert_eq!(session.translated_text, None);
    assert_eq!(session.error, None);
}

/// Test retry is ignored before any result
#[test]
fn test_retry_whileIdle_shouldDoNothing() {
    let camera = MockCamera::working();
    let provider = MockProvider::working("x");
    let mut controller = common::controller_with(&camera, &provider, common::test_settings());

    controller.retry();
    assert_eq!(controller.session(), &Session::default());
}

/// Test reset from every reachable state returns the zero session
#[tokio::test]
async fn test_reset_fromAnyState_shouldReturnZeroSession() {
    let camera = MockCamera::working();
    let provider = MockProvider::working("Olá mundo");
    let mut controller = common::controller_with(&camera, &provider, common::test_settings());

    controller.open_camera().await;
    controller.reset();
    assert_eq!(controller.session(), &Session::default());
    assert_eq!(camera.live_streams(), 0);

    controller.select_bytes(&common_png());
    controller.reset();
    assert_eq!(controller.session(), &Session::default());

    controller.select_bytes(&common_png());
    controller.submit().await;
    assert_eq!(controller.session().status, SessionStatus::Done);
    controller.reset();
    assert_eq!(controller.session(), &Session::default());
    assert_eq!(controller.session().view(), View::Picker);

    let provider = MockProvider::empty();
    let mut controller = common::controller_with(&camera, &provider, common::test_settings());
    controller.select_bytes(&common_png());
    controller.submit().await;
    assert_eq!(controller.session().status, SessionStatus::Failed);
    controller.reset();
    assert_eq!(controller.session(), &Session::default());
}

/// Test reset clears an error recorded while the camera is open
#[tokio::test]
async fn test_reset_fromCameraOpenWithError_shouldReleaseCamera() {
    let camera = MockCamera::without_frames();
    let provider = MockProvider::working("x");
    let mut controller = common::controller_with(&camera, &provider, common::test_settings());

    controller.open_camera().await;
    controller.capture();
    assert_eq!(controller.session().status, SessionStatus::CameraOpen);
    assert!(controller.session().error.is_some());

    controller.reset();

    assert_eq!(controller.session(), &Session::default());
    assert!(!controller.is_camera_live());
    assert_eq!(camera.stop_count(), 1);
    assert_eq!(camera.live_streams(), 0);
}

/// Test the one-shot file translation used by the CLI
#[tokio::test]
async fn test_translate_file_shouldReturnTextOrSessionError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_image(temp_dir.path(), "placa.jpg", 8, 8)?;

    let camera = MockCamera::working();
    let provider = MockProvider::working("Perigo: alta tensão");
    let mut controller = common::controller_with(&camera, &provider, common::test_settings());
    assert_eq!(controller.translate_file(&path).await?, "Perigo: alta tensão");

    let provider = MockProvider::empty();
    let mut controller = common::controller_with(&camera, &provider, common::test_settings());
    let error = controller.translate_file(&path).await.unwrap_err();
    assert!(matches!(error, AppError::Session(SessionError::EmptyResult)));

    // a file that is not an image stops before any request
    let notes = common::create_test_file(temp_dir.path(), "notes.txt", b"not an image")?;
    let provider = MockProvider::working("unused");
    let mut controller = common::controller_with(&camera, &provider, common::test_settings());
    let error = controller.translate_file(&notes).await.unwrap_err();
    assert!(matches!(error, AppError::Session(SessionError::InvalidImage(_))));
    assert_eq!(provider.request_count(), 0);
    Ok(())
}

fn common_png() -> Vec<u8> {
    let mut raw = Vec::new();
    image::RgbImage::new(6, 4)
        .write_to(&mut std::io::Cursor::new(&mut raw), image::ImageFormat::Png)
        .unwrap();
    raw
}
