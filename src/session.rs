/*!
 * In-memory state of one capture-to-translation attempt.
 */

use std::fmt;

use crate::encoded_image::{EncodedImage, PreviewHandle};
use crate::errors::SessionError;

/// Lifecycle status of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Idle,
    CameraOpen,
    ImageReady,
    Translating,
    Done,
    Failed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::CameraOpen => "camera open",
            Self::ImageReady => "image ready",
            Self::Translating => "translating",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// The three mutually exclusive screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Nothing selected yet: offer camera or file
    Picker,
    /// Live camera with a capture action
    Camera,
    /// Selected image with the translate action and the result panel
    Preview,
}

/// State of one capture-to-translation attempt
///
/// `Session::default()` is the initial zero value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    pub image: Option<EncodedImage>,
    pub preview: Option<PreviewHandle>,
    pub translated_text: Option<String>,
    pub status: SessionStatus,
    pub error: Option<SessionError>,
}

impl Session {
    /// User-facing message of the current error
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(SessionError::user_message)
    }

    /// Screen to render for the current state
    ///
    /// An open camera wins over a stale image; otherwise the image decides.
    pub fn view(&self) -> View {
        if self.status == SessionStatus::CameraOpen {
            View::Camera
        } else if self.image.is_some() {
            View::Preview
        } else {
            View::Picker
        }
    }

    /// Whether the translate action is available
    pub fn can_submit(&self) -> bool {
        self.image.is_some()
            && matches!(
                self.status,
                SessionStatus::ImageReady | SessionStatus::Failed
            )
    }

    pub fn is_translating(&self) -> bool {
        self.status == SessionStatus::Translating
    }
}
