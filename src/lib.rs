/*!
 * # SnapTrad - photo-to-translation assistant
 *
 * A Rust library that takes a photo of technical text (from a camera or a
 * local image file) and asks a multimodal inference service to identify and
 * translate the text into Brazilian Portuguese.
 *
 * ## Features
 *
 * - Live camera capture through an `ffmpeg` child process
 * - Local image files in any common raster format
 * - Translation through multimodal providers:
 *   - Google Gemini (default)
 *   - OpenAI chat completions
 *   - Anthropic messages
 * - One request at a time, bounded by a timeout
 * - User-facing error messages for every failure
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `session`: State of one capture-to-translation attempt
 * - `app_controller`: State machine driving a session
 * - `encoded_image`: Image payloads and preview metadata
 * - `camera`: Camera device abstraction:
 *   - `camera::ffmpeg`: ffmpeg-backed device
 *   - `camera::mock`: scripted device for tests
 * - `providers`: Client implementations for inference services:
 *   - `providers::gemini`: Gemini API client
 *   - `providers::openai`: OpenAI API client
 *   - `providers::anthropic`: Anthropic API client
 * - `console`: Terminal views and the interactive loop
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod camera;
pub mod console;
pub mod encoded_image;
pub mod errors;
pub mod providers;
pub mod session;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{CaptureController, ControllerSettings};
pub use encoded_image::{EncodedImage, PreviewHandle};
pub use errors::{AppError, CameraError, ProviderError, SessionError};
pub use session::{Session, SessionStatus, View};
