//! Notification intake: decode and validate the triggering payload.
//!
//! The push envelope carries `message.data`, base64-encoded UTF-8 JSON with
//! at least a `name` field identifying the raw object. Anything malformed is
//! rejected before any filesystem or store side effect occurs.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use thiserror::Error;

use vproc_models::Job;

/// Validation failures for the triggering notification.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("envelope is not a valid push message")]
    MalformedEnvelope,

    #[error("message.data is missing")]
    MissingData,

    #[error("message.data is not valid base64")]
    InvalidBase64,

    #[error("decoded payload is not valid UTF-8 JSON")]
    InvalidJson,

    #[error("payload has no non-empty name field")]
    MissingName,
}

/// Push envelope as delivered by the notification transport.
#[derive(Debug, Deserialize)]
struct PushEnvelope {
    message: PushMessage,
}

#[derive(Debug, Deserialize)]
struct PushMessage {
    data: Option<String>,
}

/// Decoded notification body.
#[derive(Debug, Deserialize)]
struct NotificationBody {
    name: Option<String>,
}

/// Decode a raw envelope into an admitted [`Job`].
pub fn decode_notification(envelope: &serde_json::Value) -> Result<Job, PayloadError> {
    let envelope: PushEnvelope =
        serde_json::from_value(envelope.clone()).map_err(|_| PayloadError::MalformedEnvelope)?;

    let data = envelope.message.data.ok_or(PayloadError::MissingData)?;

    let decoded = STANDARD
        .decode(data.as_bytes())
        .map_err(|_| PayloadError::InvalidBase64)?;

    let body: NotificationBody =
        serde_json::from_slice(&decoded).map_err(|_| PayloadError::InvalidJson)?;

    match body.name {
        Some(name) if !name.trim().is_empty() => Ok(Job::new(name)),
        _ => Err(PayloadError::MissingName),
    }
}
