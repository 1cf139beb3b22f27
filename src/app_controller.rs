use log::{debug, error, info, warn};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::{Config, TranslationConfig};
use crate::camera::ffmpeg::FfmpegCamera;
use crate::camera::{CameraDevice, CameraStream, Facing};
use crate::encoded_image::{EncodedImage, PreviewHandle};
use crate::errors::{AppError, SessionError};
use crate::providers::{build_translator, ImageTranslator};
use crate::session::{Session, SessionStatus};

// @module: Capture/upload controller driving one translation session

/// Values the controller needs besides its two collaborators
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    // @field: Credential sent to the backend; None means not configured
    pub api_key: Option<String>,
    // @field: Instruction sent with every image
    pub instruction: String,
    // @field: Upper bound for one translation request
    pub timeout: Duration,
    // @field: JPEG quality for camera snapshots
    pub jpeg_quality: u8,
}

impl ControllerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_key: config.translation.get_api_key(),
            instruction: config.translation.instruction.clone(),
            timeout: Duration::from_secs(config.translation.timeout_secs),
            jpeg_quality: config.camera.jpeg_quality,
        }
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        let translation = TranslationConfig::default();
        Self {
            api_key: None,
            instruction: translation.instruction,
            timeout: Duration::from_secs(translation.timeout_secs),
            jpeg_quality: 90,
        }
    }
}

/// Owns the session, the live camera stream and the translator
///
/// Every operation records its failure in the session instead of returning it.
/// The camera stream is stopped whenever the camera state is left, including on drop.
pub struct CaptureController {
    session: Session,
    camera: Arc<dyn CameraDevice>,
    stream: Option<Box<dyn CameraStream>>,
    translator: Arc<dyn ImageTranslator>,
    settings: ControllerSettings,
}

impl CaptureController {
    // @method: Create a controller from explicit collaborators
    pub fn new(
        camera: Arc<dyn CameraDevice>,
        translator: Arc<dyn ImageTranslator>,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            session: Session::default(),
            camera,
            stream: None,
            translator,
            settings,
        }
    }

    // @method: Create a controller wired to the configured camera and provider
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        info!(
            "Using {} - {}",
            config.translation.provider.display_name(),
            config.translation.get_model()
        );
        Ok(Self::new(
            Arc::new(FfmpegCamera::new(config.camera.clone())),
            build_translator(&config.translation)?,
            ControllerSettings::from_config(config),
        ))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Whether a camera stream is currently held
    pub fn is_camera_live(&self) -> bool {
        self.stream.is_some()
    }

    /// Request the environment-facing camera and show its live stream
    pub async fn open_camera(&mut self) {
        if self.reject_while_translating("open camera") {
            return;
        }
        self.begin_attempt();

        match self.camera.open(Facing::Environment).await {
            Ok(stream) => {
                self.stream = Some(stream);
                self.transition(SessionStatus::CameraOpen);
            }
            Err(e) => {
                error!("Camera error: {}", e);
                self.fail(SessionError::from(e), SessionStatus::Idle);
            }
        }
    }

    /// Snapshot the current frame, stop the camera and keep the image
    pub fn capture(&mut self) {
        if self.session.status != SessionStatus::CameraOpen {
            warn!("Capture requested while {}", self.session.status);
            self.session.error = Some(SessionError::CameraNotOpen);
            return;
        }

        let Some(frame) = self.stream.as_ref().and_then(|stream| stream.latest_frame()) else {
            // keep the camera open so the user can try again
            warn!("Capture requested before the camera delivered a frame");
            self.session.error = Some(SessionError::NoFrame(
                "the camera has not delivered a frame yet".to_string(),
            ));
            return;
        };

        self.release_camera();

        match EncodedImage::from_frame(&frame, self.settings.jpeg_quality) {
            Ok((image, preview)) => self.image_ready(image, preview),
            Err(e) => self.fail(e, SessionStatus::Idle),
        }
    }

    /// Read a local image file and keep it as the selected image
    pub async fn select_file(&mut self, path: &Path) {
        if self.reject_while_translating("select file") {
            return;
        }
        self.begin_attempt();
        info!("Reading image file {}", path.display());

        match EncodedImage::from_file(path).await {
            Ok((image, preview)) => self.image_ready(image, preview),
            Err(e) => self.fail(e, SessionStatus::Idle),
        }
    }

    /// Keep raw image bytes (already read by the caller) as the selected image
    pub fn select_bytes(&mut self, raw: &[u8]) {
        if self.reject_while_translating("select image") {
            return;
        }
        self.begin_attempt();

        match EncodedImage::from_bytes(raw) {
            Ok((image, preview)) => self.image_ready(image, preview),
            Err(e) => self.fail(e, SessionStatus::Idle),
        }
    }

    /// Send the selected image to the inference endpoint
    ///
    /// No request is issued without an image or without a credential.
    pub async fn submit(&mut self) {
        if self.reject_while_translating("submit") {
            return;
        }

        let Some(image) = self.session.image.clone() else {
            warn!("Submit requested without an image");
            self.session.error = Some(SessionError::NoInputSelected);
            return;
        };

        let Some(api_key) = self.settings.api_key.clone() else {
            self.fail(SessionError::MissingCredential, SessionStatus::Failed);
            return;
        };

        self.session.error = None;
        self.session.translated_text = None;
        self.transition(SessionStatus::Translating);

        let started = Instant::now();
        let request = self
            .translator
            .translate_image(&api_key, &image, &self.settings.instruction);
        let outcome = tokio::time::timeout(self.settings.timeout, request).await;

        match outcome {
            Ok(Ok(text)) => {
                info!(
                    "Translation received in {} ({} chars)",
                    Self::format_duration(started.elapsed()),
                    text.chars().count()
                );
                self.session.translated_text = Some(text);
                self.transition(SessionStatus::Done);
            }
            Ok(Err(e)) => {
                error!("Translation failed: {}", e);
                self.fail(SessionError::from(e), SessionStatus::Failed);
            }
            Err(_) => {
                error!(
                    "Translation timed out after {}",
                    Self::format_duration(self.settings.timeout)
                );
                self.fail(
                    SessionError::Timeout(self.settings.timeout.as_secs()),
                    SessionStatus::Failed,
                );
            }
        }
    }

    /// Go back from a result to the selected image
    pub fn retry(&mut self) {
        let finished = matches!(
            self.session.status,
            SessionStatus::Done | SessionStatus::Failed
        );
        if !finished || self.session.image.is_none() {
            debug!("Retry ignored while {}", self.session.status);
            return;
        }

        self.session.translated_text = None;
        self.session.error = None;
        self.transition(SessionStatus::ImageReady);
    }

    /// Discard everything and return to the initial state
    pub fn reset(&mut self) {
        self.release_camera();
        self.session = Session::default();
        debug!("Session reset");
    }

    /// Select a file and translate it, returning the text or the failure
    pub async fn translate_file(&mut self, path: &Path) -> Result<String, AppError> {
        self.select_file(path).await;
        if self.session.status != SessionStatus::ImageReady {
            return Err(self.session_failure());
        }
        self.submit().await;

        match &self.session.translated_text {
            Some(text) => Ok(text.clone()),
            None => Err(self.session_failure()),
        }
    }

    fn session_failure(&self) -> AppError {
        match &self.session.error {
            Some(error) => AppError::Session(error.clone()),
            None => AppError::Unknown(format!(
                "translation ended in state {}",
                self.session.status
            )),
        }
    }

    fn begin_attempt(&mut self) {
        self.release_camera();
        self.session = Session::default();
    }

    fn image_ready(&mut self, image: EncodedImage, preview: PreviewHandle) {
        info!("Image ready: {}", preview);
        self.session.image = Some(image);
        self.session.preview = Some(preview);
        self.session.error = None;
        self.transition(SessionStatus::ImageReady);
    }

    fn fail(&mut self, error: SessionError, status: SessionStatus) {
        warn!("{}", error);
        self.session.translated_text = None;
        self.session.error = Some(error);
        self.transition(status);
    }

    fn transition(&mut self, status: SessionStatus) {
        debug!("Session {} -> {}", self.session.status, status);
        self.session.status = status;
    }

    fn release_camera(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.stop();
            debug!("Camera stream stopped");
        }
    }

    fn reject_while_translating(&mut self, action: &str) -> bool {
        if self.session.is_translating() {
            warn!("Cannot {} while a translation is in flight", action);
            self.session.error = Some(SessionError::RequestInFlight);
            return true;
        }
        false
    }

    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;

        if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.release_camera();
    }
}
