//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Source file missing or unreadable: {0}")]
    SourceUnreadable(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Encoder diagnostic for logging. Never exposed to callers verbatim.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::FfmpegFailed {
                message,
                stderr,
                exit_code,
            } => match stderr {
                Some(s) => format!("{} (exit: {:?}): {}", message, exit_code, s),
                None => format!("{} (exit: {:?})", message, exit_code),
            },
            other => other.to_string(),
        }
    }
}
