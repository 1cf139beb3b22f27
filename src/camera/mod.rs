/*!
 * Camera capture.
 *
 * The controller talks to a camera through two traits:
 * - `CameraDevice`: opens a live stream for a requested facing
 * - `CameraStream`: exposes the latest frame and releases the hardware on `stop`
 *
 * Backends:
 * - `ffmpeg`: reads a local capture device through an ffmpeg child process
 * - `mock`: scripted device used by tests
 */

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::fmt::{self, Debug};

use crate::errors::CameraError;

pub mod ffmpeg;
pub mod mock;

/// Which physical camera to request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    /// Rear camera, pointed at the scene
    #[default]
    Environment,
    /// Front camera, pointed at the user
    User,
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Environment => write!(f, "environment"),
            Self::User => write!(f, "user"),
        }
    }
}

/// One raw RGB8 video frame
#[derive(Clone, PartialEq)]
pub struct Frame {
    /// Packed RGB bytes, `width * height * 3` long
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
    pub captured_at: DateTime<Utc>,
}

impl Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .field("captured_at", &self.captured_at)
            .finish()
    }
}

/// A device able to start a live video stream
#[async_trait]
pub trait CameraDevice: Send + Sync + Debug {
    /// Request access to the camera with the given facing
    ///
    /// Resolves once the stream is live or access has failed.
    async fn open(&self, facing: Facing) -> Result<Box<dyn CameraStream>, CameraError>;
}

/// A live camera stream exclusively owned by its holder
pub trait CameraStream: Send + Debug {
    /// Most recent frame, if the device has produced one
    fn latest_frame(&self) -> Option<Frame>;

    /// Release the hardware; consumes the stream so it cannot be used afterwards
    fn stop(self: Box<Self>);
}
