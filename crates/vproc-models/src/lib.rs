//! Shared data models for the vproc transcoding service.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs and their terminal outcomes
//! - The transcode policy (target resolution)

pub mod job;
pub mod transcode;

// Re-export common types
pub use job::{FailureStage, Job, JobId, JobOutcome, PROCESSED_PREFIX};
pub use transcode::TranscodeSpec;
