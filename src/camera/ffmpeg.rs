use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use log::{debug, info, warn};
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::{CameraDevice, CameraStream, Facing, Frame};
use crate::app_config::CameraConfig;
use crate::errors::CameraError;

/// Camera backed by an ffmpeg child process reading a local capture device
///
/// ffmpeg scales every frame to the configured size and writes packed `rgb24`
/// frames to stdout; a reader task keeps only the most recent one.
#[derive(Debug, Clone)]
pub struct FfmpegCamera {
    config: CameraConfig,
}

impl FfmpegCamera {
    pub fn new(config: CameraConfig) -> Self {
        Self { config }
    }

    /// Device path used for the requested facing
    pub fn device_for(&self, facing: Facing) -> &str {
        match facing {
            Facing::Environment => &self.config.environment_device,
            Facing::User => &self.config.user_device,
        }
    }

    /// Command line passed to ffmpeg for the requested facing
    pub fn build_args(&self, facing: Facing) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-f".to_string(),
            self.config.input_format.clone(),
            "-i".to_string(),
            self.device_for(facing).to_string(),
            "-an".to_string(),
            "-vf".to_string(),
            format!("scale={}:{}", self.config.width, self.config.height),
            "-pix_fmt".to_string(),
            "rgb24".to_string(),
            "-f".to_string(),
            "rawvideo".to_string(),
            "-".to_string(),
        ]
    }
}

#[async_trait]
impl CameraDevice for FfmpegCamera {
    async fn open(&self, facing: Facing) -> Result<Box<dyn CameraStream>, CameraError> {
        let device = self.device_for(facing).to_string();
        info!("Opening {} camera at {}", facing, device);

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(self.build_args(facing))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                CameraError::Device(format!("failed to start {}: {}", self.config.ffmpeg_path, e))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CameraError::Device("failed to capture ffmpeg stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| CameraError::Device("failed to capture ffmpeg stderr".to_string()))?;

        let (tx, mut frames) = watch::channel(None);
        let reader = tokio::spawn(read_frames(stdout, self.config.width, self.config.height, tx));
        let stderr_task = tokio::spawn(collect_stderr(stderr));

        let startup = Duration::from_secs(self.config.startup_timeout_secs);
        let first_frame = tokio::time::timeout(startup, frames.changed()).await;
        match first_frame {
            Ok(Ok(())) => {
                debug!("Camera {} delivered its first frame", device);
                Ok(Box::new(FfmpegStream {
                    device,
                    child,
                    frames,
                    reader,
                    stderr_task,
                }))
            }
            Ok(Err(_)) => {
                // stdout closed before a full frame arrived: ffmpeg is exiting
                let status = child.wait().await;
                let stderr = stderr_task.await.unwrap_or_default();
                warn!("ffmpeg exited while opening {} ({:?}): {}", device, status, stderr.trim());
                Err(classify_failure(&stderr, &device))
            }
            Err(_) => {
                let _ = child.start_kill();
                reader.abort();
                stderr_task.abort();
                warn!("Camera {} produced no frame within {:?}", device, startup);
                Err(CameraError::StartupTimeout(self.config.startup_timeout_secs))
            }
        }
    }
}

/// Live ffmpeg stream
#[derive(Debug)]
pub struct FfmpegStream {
    device: String,
    child: Child,
    frames: watch::Receiver<Option<Frame>>,
    reader: JoinHandle<()>,
    stderr_task: JoinHandle<String>,
}

impl CameraStream for FfmpegStream {
    fn latest_frame(&self) -> Option<Frame> {
        self.frames.borrow().clone()
    }

    fn stop(mut self: Box<Self>) {
        if let Err(e) = self.child.start_kill() {
            debug!("ffmpeg for {} already gone: {}", self.device, e);
        }
        self.reader.abort();
        self.stderr_task.abort();
        info!("Camera {} released", self.device);
    }
}

async fn read_frames(
    mut stdout: ChildStdout,
    width: u32,
    height: u32,
    tx: watch::Sender<Option<Frame>>,
) {
    let frame_len = width as usize * height as usize * 3;
    let mut buffer = vec![0u8; frame_len];

    loop {
        if let Err(e) = stdout.read_exact(&mut buffer).await {
            debug!("Camera frame reader stopped: {}", e);
            break;
        }

        let frame = Frame {
            data: Bytes::copy_from_slice(&buffer),
            width,
            height,
            captured_at: Utc::now(),
        };

        if tx.send(Some(frame)).is_err() {
            break;
        }
    }
}

async fn collect_stderr(mut stderr: ChildStderr) -> String {
    let mut output = String::new();
    let _ = stderr.read_to_string(&mut output).await;
    output
}

/// Map ffmpeg's error output for a failed open to a camera error
pub fn classify_failure(stderr: &str, device: &str) -> CameraError {
    let lowered = stderr.to_lowercase();
    if lowered.contains("permission denied") {
        CameraError::PermissionDenied(device.to_string())
    } else if lowered.contains("no such file or directory") || lowered.contains("no such device") {
        CameraError::NoDevice(device.to_string())
    } else {
        let detail = stderr
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .unwrap_or("ffmpeg exited without output");
        CameraError::Device(format!("{}: {}", device, detail))
    }
}
