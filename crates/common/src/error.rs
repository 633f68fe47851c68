//! Error types shared across webprep crates.

use std::path::PathBuf;

/// Top-level error type for webprep operations.
#[derive(Debug, thiserror::Error)]
pub enum WebprepError {
    #[error("Image error: {message}")]
    Image { message: String },

    #[error("Font error: {message}")]
    Font { message: String },

    #[error("Typing error: {message}")]
    Typing { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias using WebprepError.
pub type WebprepResult<T> = Result<T, WebprepError>;

impl WebprepError {
    pub fn image(msg: impl Into<String>) -> Self {
        Self::Image {
            message: msg.into(),
        }
    }

    pub fn font(msg: impl Into<String>) -> Self {
        Self::Font {
            message: msg.into(),
        }
    }

    pub fn typing(msg: impl Into<String>) -> Self {
        Self::Typing {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }
}
