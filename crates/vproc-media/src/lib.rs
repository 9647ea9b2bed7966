//! FFmpeg CLI wrapper for video transcoding.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Progress parsing from `-progress pipe:2`
//! - The scale-to-height transcode operation used by the pipeline

pub mod command;
pub mod error;
pub mod progress;
pub mod transcode;

pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use progress::FfmpegProgress;
pub use transcode::transcode_to_height;
