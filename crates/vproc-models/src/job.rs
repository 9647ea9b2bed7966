//! Job definitions for pipeline processing.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Prefix applied to raw object names to derive the processed object name.
///
/// Consumers of the processed store rely on this mapping, so it must stay
/// stable.
pub const PROCESSED_PREFIX: &str = "processed-";

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One pipeline execution: a raw object to fetch and the processed object
/// name it publishes under.
///
/// Immutable once admitted; never persisted. The id keys local staged file
/// paths so two jobs for the same raw object never collide on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job ID, generated when the notification is admitted
    pub id: JobId,

    /// Name of the raw object in the source store
    pub source_object: String,

    /// Name of the processed object in the destination store
    pub output_object: String,
}

impl Job {
    /// Create a job for a raw object name.
    pub fn new(source_object: impl Into<String>) -> Self {
        let source_object = source_object.into();
        let output_object = format!("{}{}", PROCESSED_PREFIX, source_object);

        Self {
            id: JobId::new(),
            source_object,
            output_object,
        }
    }
}

/// Pipeline stage a job failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Download,
    Transcode,
    Upload,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureStage::Download => "download",
            FailureStage::Transcode => "transcode",
            FailureStage::Upload => "upload",
        }
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of one job. Produced exactly once; cleanup is
/// side-effect-only and never changes the outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Pipeline completed; the processed object is public at this URL.
    Succeeded { public_url: String },
    /// Notification payload was malformed; nothing was attempted.
    RejectedInvalidPayload,
    /// A pipeline stage failed after cleanup ran.
    Failed {
        stage: FailureStage,
        message: String,
    },
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Succeeded { .. })
    }
}
