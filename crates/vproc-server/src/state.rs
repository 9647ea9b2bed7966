//! Application state.

use std::sync::Arc;

use vproc_models::TranscodeSpec;
use vproc_storage::StoreClient;

use crate::config::ServerConfig;
use crate::pipeline::{FfmpegTranscoder, ObjectStore, Transcoder};
use crate::workspace::Workspace;

/// Shared application state.
///
/// The store client and transcoder sit behind trait objects so the pipeline
/// can be exercised with fakes in tests.
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub workspace: Workspace,
    pub store: Arc<dyn ObjectStore>,
    pub transcoder: Arc<dyn Transcoder>,
    pub spec: TranscodeSpec,
}

impl AppState {
    /// Create application state with explicit collaborators.
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn ObjectStore>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        let workspace = Workspace::new(&config.incoming_dir, &config.outgoing_dir);
        Self {
            config,
            workspace,
            store,
            transcoder,
            spec: TranscodeSpec::default(),
        }
    }

    /// Create production state: real store client from the environment and
    /// the FFmpeg transcoder.
    pub async fn from_env(config: ServerConfig) -> Result<Self, vproc_storage::StorageError> {
        let store = StoreClient::from_env().await?;
        Ok(Self::new(config, Arc::new(store), Arc::new(FfmpegTranscoder)))
    }
}
