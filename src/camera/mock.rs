/*!
 * Mock camera implementations for testing.
 *
 * - `MockCamera::working()` - opens and serves a solid test frame
 * - `MockCamera::without_frames()` - opens but never produces a frame
 * - `MockCamera::malformed()` - serves a frame too short for its size
 * - `MockCamera::denied()` - refuses access like a denied permission prompt
 * - `MockCamera::missing()` - behaves as if no device is attached
 *
 * Every stream shares a tracker with its device so tests can count
 * how many streams were opened and stopped.
 */

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;

use super::{CameraDevice, CameraStream, Facing, Frame};
use crate::errors::CameraError;

/// Behavior mode for the mock camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockCameraBehavior {
    /// Opens and serves frames
    Working,
    /// Opens but never delivers a frame
    NoFrames,
    /// Opens and serves a frame whose buffer does not match its size
    MalformedFrame,
    /// Access is refused
    Denied,
    /// No device present
    Missing,
}

/// Counters shared between a mock device and its streams
#[derive(Debug, Default)]
pub struct CameraTracker {
    /// Number of successful opens
    pub opened: usize,
    /// Number of streams stopped
    pub stopped: usize,
    /// Facing requested on the last open
    pub last_facing: Option<Facing>,
}

/// Scripted camera device
#[derive(Debug, Clone)]
pub struct MockCamera {
    behavior: MockCameraBehavior,
    width: u32,
    height: u32,
    tracker: Arc<Mutex<CameraTracker>>,
}

impl MockCamera {
    pub fn new(behavior: MockCameraBehavior) -> Self {
        Self {
            behavior,
            width: 16,
            height: 12,
            tracker: Arc::new(Mutex::new(CameraTracker::default())),
        }
    }

    pub fn working() -> Self {
        Self::new(MockCameraBehavior::Working)
    }

    pub fn without_frames() -> Self {
        Self::new(MockCameraBehavior::NoFrames)
    }

    pub fn malformed() -> Self {
        Self::new(MockCameraBehavior::MalformedFrame)
    }

    pub fn denied() -> Self {
        Self::new(MockCameraBehavior::Denied)
    }

    pub fn missing() -> Self {
        Self::new(MockCameraBehavior::Missing)
    }

    /// Number of streams opened so far
    pub fn open_count(&self) -> usize {
        self.tracker.lock().opened
    }

    /// Number of streams stopped so far
    pub fn stop_count(&self) -> usize {
        self.tracker.lock().stopped
    }

    /// Facing requested on the most recent open
    pub fn last_facing(&self) -> Option<Facing> {
        self.tracker.lock().last_facing
    }

    /// Streams currently open (opened but not stopped)
    pub fn live_streams(&self) -> usize {
        let tracker = self.tracker.lock();
        tracker.opened - tracker.stopped
    }

    fn test_frame(&self) -> Frame {
        Frame {
            data: Bytes::from(vec![128u8; (self.width * self.height * 3) as usize]),
            width: self.width,
            height: self.height,
            captured_at: Utc::now(),
        }
    }

    fn truncated_frame(&self) -> Frame {
        Frame {
            data: Bytes::from_static(&[128u8; 5]),
            ..self.test_frame()
        }
    }
}

#[async_trait]
impl CameraDevice for MockCamera {
    async fn open(&self, facing: Facing) -> Result<Box<dyn CameraStream>, CameraError> {
        self.tracker.lock().last_facing = Some(facing);

        match self.behavior {
            MockCameraBehavior::Denied => {
                Err(CameraError::PermissionDenied("mock camera".to_string()))
            }
            MockCameraBehavior::Missing => Err(CameraError::NoDevice("mock camera".to_string())),
            MockCameraBehavior::Working
            | MockCameraBehavior::NoFrames
            | MockCameraBehavior::MalformedFrame => {
                self.tracker.lock().opened += 1;
                let frame = match self.behavior {
                    MockCameraBehavior::Working => Some(self.test_frame()),
                    MockCameraBehavior::MalformedFrame => Some(self.truncated_frame()),
                    _ => None,
                };
                Ok(Box::new(MockStream {
                    frame,
                    tracker: Arc::clone(&self.tracker),
                }))
            }
        }
    }
}

/// Stream handed out by `MockCamera`
#[derive(Debug)]
pub struct MockStream {
    frame: Option<Frame>,
    tracker: Arc<Mutex<CameraTracker>>,
}

impl CameraStream for MockStream {
    fn latest_frame(&self) -> Option<Frame> {
        self.frame.clone()
    }

    fn stop(self: Box<Self>) {
        self.tracker.lock().stopped += 1;
    }
}
