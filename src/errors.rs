/*!
 * Error types for the snaptrad application.
 *
 * This module contains custom error types for the different layers of the application,
 * using the thiserror crate for ergonomic error definitions:
 * - `ProviderError`: failures reported by an inference backend
 * - `CameraError`: failures opening or reading the camera device
 * - `SessionError`: the user-facing taxonomy stored in a capture session
 * - `AppError`: top-level wrapper used by the binary
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {message}")]
    RateLimitExceeded {
        /// Error message from the API
        message: String,
        /// Value of the retry-after header, when present
        retry_after_secs: Option<u64>,
    },

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The API answered successfully but carried no text
    #[error("API response contained no text")]
    EmptyResponse,
}

impl ProviderError {
    /// Map a non-success HTTP status and its body to the matching variant
    ///
    /// Gemini rejects a bad key with 400 `INVALID_ARGUMENT` rather than 401.
    pub fn from_status(status_code: u16, message: String, retry_after_secs: Option<u64>) -> Self {
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            400 if Self::is_invalid_key_body(&message) => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded { message, retry_after_secs },
            _ => Self::ApiError { status_code, message },
        }
    }

    fn is_invalid_key_body(body: &str) -> bool {
        body.contains("API_KEY_INVALID") || body.to_lowercase().contains("api key not valid")
    }
}

/// Errors that can occur when opening or reading a camera
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CameraError {
    /// The operating system refused access to the device
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),

    /// No device exists at the configured location
    #[error("no camera device found: {0}")]
    NoDevice(String),

    /// The capture process could not be started or died
    #[error("camera device error: {0}")]
    Device(String),

    /// The device opened but never produced a frame
    #[error("camera produced no frame within {0} seconds")]
    StartupTimeout(u64),
}

/// User-facing failures of a capture-to-translation attempt
///
/// Each variant carries a fixed message shown to the user through
/// [`SessionError::user_message`]; `Display` keeps the technical detail for logs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("camera unavailable: {0}")]
    PermissionDenied(String),

    #[error("capture requested while the camera is not open")]
    CameraNotOpen,

    #[error("no camera frame could be captured: {0}")]
    NoFrame(String),

    #[error("invalid image input: {0}")]
    InvalidImage(String),

    #[error("submit requested without an image")]
    NoInputSelected,

    #[error("no API key configured")]
    MissingCredential,

    #[error("API key rejected: {0}")]
    InvalidCredential(String),

    #[error("model or endpoint not found (HTTP {status})")]
    EndpointNotFound { status: u16 },

    #[error("translation service failure: {0}")]
    TransportFailure(String),

    #[error("translation timed out after {0} seconds")]
    Timeout(u64),

    #[error("the service returned no text")]
    EmptyResult,

    #[error("rate limited by the translation service")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("a translation request is already in flight")]
    RequestInFlight,
}

impl SessionError {
    /// Message shown to the user for this failure
    pub fn user_message(&self) -> String {
        match self {
            Self::PermissionDenied(_) => {
                "Não foi possível acessar a câmera. Verifique as permissões.".to_string()
            }
            Self::CameraNotOpen => "A câmera não está ativa.".to_string(),
            Self::NoFrame(_) => "Não foi possível capturar a imagem da câmera.".to_string(),
            Self::InvalidImage(_) => "O arquivo selecionado não é uma imagem válida.".to_string(),
            Self::NoInputSelected => "Nenhuma imagem selecionada para traduzir.".to_string(),
            Self::MissingCredential => {
                "Chave de API não configurada. Defina SNAPTRAD_API_KEY ou translation.api_key."
                    .to_string()
            }
            Self::InvalidCredential(_) => {
                "Falha ao traduzir. A chave de API é inválida ou não tem permissão.".to_string()
            }
            Self::EndpointNotFound { status } => format!(
                "Falha ao traduzir. Modelo ou endpoint não encontrado (HTTP {}).",
                status
            ),
            Self::TransportFailure(_) => {
                "Falha ao traduzir. O serviço está indisponível.".to_string()
            }
            Self::Timeout(_) => "Falha ao traduzir. O serviço não respondeu a tempo.".to_string(),
            Self::EmptyResult => "Nenhum texto foi identificado na imagem.".to_string(),
            Self::RateLimited {
                retry_after_secs: Some(secs),
            } => format!(
                "Falha ao traduzir. Limite de requisições atingido, tente novamente em {} s.",
                secs
            ),
            Self::RateLimited {
                retry_after_secs: None,
            } => "Falha ao traduzir. Limite de requisições atingido, tente novamente mais tarde."
                .to_string(),
            Self::RequestInFlight => "Uma tradução já está em andamento.".to_string(),
        }
    }
}

impl From<CameraError> for SessionError {
    fn from(error: CameraError) -> Self {
        Self::PermissionDenied(error.to_string())
    }
}

impl From<ProviderError> for SessionError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::AuthenticationError(message) => Self::InvalidCredential(message),
            ProviderError::ApiError { status_code: 404, .. } => {
                Self::EndpointNotFound { status: 404 }
            }
            ProviderError::EmptyResponse => Self::EmptyResult,
            ProviderError::RateLimitExceeded {
                retry_after_secs, ..
            } => Self::RateLimited { retry_after_secs },
            other => Self::TransportFailure(other.to_string()),
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// A capture session ended in failure
    #[error("Translation failed: {0}")]
    Session(#[from] SessionError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}
