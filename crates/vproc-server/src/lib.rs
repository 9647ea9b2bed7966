//! Triggered video transcoding service.
//!
//! Receives "file uploaded" push notifications, stages the raw object
//! locally, transcodes it to a lower resolution, republishes it, and
//! guarantees cleanup of local scratch state on every exit path.

pub mod config;
pub mod error;
pub mod handlers;
pub mod intake;
pub mod pipeline;
pub mod routes;
pub mod state;
pub mod workspace;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use pipeline::{FfmpegTranscoder, ObjectStore, Transcoder};
pub use routes::create_router;
pub use state::AppState;
pub use workspace::{StagedPaths, Workspace};
