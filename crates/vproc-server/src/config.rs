//! Server configuration.

use std::path::PathBuf;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Scratch directory for downloaded raw videos
    pub incoming_dir: PathBuf,
    /// Scratch directory for transcoded output
    pub outgoing_dir: PathBuf,
    /// Max request body size
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            incoming_dir: PathBuf::from("/tmp/vproc/incoming"),
            outgoing_dir: PathBuf::from("/tmp/vproc/outgoing"),
            max_body_size: 1024 * 1024, // 1MB, notifications are small
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            incoming_dir: std::env::var("INCOMING_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.incoming_dir),
            outgoing_dir: std::env::var("OUTGOING_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.outgoing_dir),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
        }
    }
}
