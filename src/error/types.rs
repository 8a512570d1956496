use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Every failure the engine can surface, normalized so that `Display` is the
/// single user-facing error string. The registry, orchestrator and viewer all
/// store `to_string()` of these.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// Non-2xx response. `detail` comes from the response body's `detail`
    /// field, falling back to the HTTP status text.
    #[error("{detail}")]
    Rejected { status: u16, detail: String },

    /// No usable response received (DNS, connect, timeout, broken body).
    #[error("request failed: {message}")]
    Transport { message: String },

    /// 2xx response whose payload lacks the expected fields.
    #[error("Invalid response format from server")]
    MalformedResponse,

    /// Client-side allow-list rejection; never reaches the wire.
    #[error("File type .{extension} is not supported")]
    UnsupportedFileType { extension: String },

    #[error("File too large: {size}MB exceeds limit of {limit}MB")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Invalid file: {message}")]
    InvalidFile { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Rejected { .. } => "REJECTED",
            AppError::Transport { .. } => "TRANSPORT_ERROR",
            AppError::MalformedResponse => "MALFORMED_RESPONSE",
            AppError::UnsupportedFileType { .. } => "UNSUPPORTED_FILE_TYPE",
            AppError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            AppError::InvalidFile { .. } => "INVALID_FILE",
            AppError::ConfigError { .. } => "CONFIG_ERROR",
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        AppError::Transport {
            message: message.into(),
        }
    }

    pub fn invalid_file(message: impl Into<String>) -> Self {
        AppError::InvalidFile {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        AppError::ConfigError {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::MalformedResponse
        } else {
            AppError::Transport {
                message: err.to_string(),
            }
        }
    }
}
