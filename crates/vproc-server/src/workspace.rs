//! Local scratch workspace for staged files.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use vproc_models::Job;

/// Resolved local paths for one job's staged files.
#[derive(Debug, Clone)]
pub struct StagedPaths {
    /// Local copy of the raw object
    pub incoming: PathBuf,
    /// Transcoded output before upload
    pub outgoing: PathBuf,
}

/// Owns the incoming and outgoing scratch directories.
#[derive(Debug, Clone)]
pub struct Workspace {
    incoming_dir: PathBuf,
    outgoing_dir: PathBuf,
}

impl Workspace {
    /// Create a workspace over the two scratch directories.
    pub fn new(incoming_dir: impl AsRef<Path>, outgoing_dir: impl AsRef<Path>) -> Self {
        Self {
            incoming_dir: incoming_dir.as_ref().to_path_buf(),
            outgoing_dir: outgoing_dir.as_ref().to_path_buf(),
        }
    }

    /// Create both scratch directories if absent.
    ///
    /// Idempotent. Called once at startup, before the listener accepts
    /// jobs; failure here is a fatal startup error, not a mid-job surprise.
    pub async fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.incoming_dir).await?;
        fs::create_dir_all(&self.outgoing_dir).await?;
        info!(
            "Scratch directories ready: {} / {}",
            self.incoming_dir.display(),
            self.outgoing_dir.display()
        );
        Ok(())
    }

    /// Resolve the staged file paths for a job.
    ///
    /// File names embed the job id, so two jobs for the same raw object
    /// name never share staged paths.
    pub fn staged_paths(&self, job: &Job) -> StagedPaths {
        let file = format!("{}-{}", job.id, sanitize_object_name(&job.source_object));
        StagedPaths {
            incoming: self.incoming_dir.join(&file),
            outgoing: self.outgoing_dir.join(&file),
        }
    }

    /// Remove a file if present.
    ///
    /// Already-absent is success. Any other failure is logged and swallowed;
    /// cleanup is best-effort and must never replace a job's real outcome.
    pub async fn delete_if_exists(&self, path: &Path) {
        match fs::remove_file(path).await {
            Ok(()) => debug!("Deleted staged file {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to delete staged file {}: {}", path.display(), e),
        }
    }

    /// Remove both of a job's staged files.
    pub async fn cleanup(&self, paths: &StagedPaths) {
        self.delete_if_exists(&paths.incoming).await;
        self.delete_if_exists(&paths.outgoing).await;
    }

    pub fn incoming_dir(&self) -> &Path {
        &self.incoming_dir
    }

    pub fn outgoing_dir(&self) -> &Path {
        &self.outgoing_dir
    }
}

/// Flatten an object name into a single path component.
///
/// Object names are external input; they must not be able to escape the
/// scratch directories.
fn sanitize_object_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c => c,
        })
        .collect::<String>()
        .replace("..", "_")
}
