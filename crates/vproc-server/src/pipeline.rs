//! Pipeline orchestrator: download, transcode, upload, always clean up.
//!
//! One invocation per admitted job. Cleanup of both staged files runs on
//! every path out of the download, transcode, and upload stages; local disk
//! is shared and size-bounded, so failed jobs must not leave orphans.

use std::path::Path;

use async_trait::async_trait;
use tracing::{error, info};

use vproc_media::{transcode_to_height, MediaError};
use vproc_models::{FailureStage, Job, JobOutcome, TranscodeSpec};
use vproc_storage::{StorageError, StorageResult, StoreClient};

use crate::workspace::{StagedPaths, Workspace};

/// Object store operations the pipeline needs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch a raw object into the incoming workspace.
    async fn download_raw(&self, object: &str, dest: &Path) -> StorageResult<()>;

    /// Publish a processed file and return its public URL.
    async fn upload_processed(&self, path: &Path, object: &str) -> StorageResult<String>;

    /// Verify the store backend is reachable (readiness probe).
    async fn check_connectivity(&self) -> StorageResult<()>;
}

#[async_trait]
impl ObjectStore for StoreClient {
    async fn download_raw(&self, object: &str, dest: &Path) -> StorageResult<()> {
        StoreClient::download_raw(self, object, dest).await
    }

    async fn upload_processed(&self, path: &Path, object: &str) -> StorageResult<String> {
        StoreClient::upload_processed(self, path, object).await
    }

    async fn check_connectivity(&self) -> StorageResult<()> {
        StoreClient::check_connectivity(self).await
    }
}

/// Transcoding seam.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        spec: &TranscodeSpec,
    ) -> Result<(), MediaError>;
}

/// Production transcoder backed by the FFmpeg CLI.
pub struct FfmpegTranscoder;

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        spec: &TranscodeSpec,
    ) -> Result<(), MediaError> {
        transcode_to_height(input, output, spec).await
    }
}

/// Run one job to its terminal outcome.
///
/// Both staged files are removed before the outcome is reported, whichever
/// stage failed. If the future is dropped mid-flight (deployment-level
/// timeout abandoning the request), a drop guard still releases the staged
/// files.
pub async fn run_job(
    job: Job,
    workspace: &Workspace,
    store: &dyn ObjectStore,
    transcoder: &dyn Transcoder,
    spec: &TranscodeSpec,
) -> JobOutcome {
    let paths = workspace.staged_paths(&job);

    let abandon_guard = {
        let incoming = paths.incoming.clone();
        let outgoing = paths.outgoing.clone();
        scopeguard::guard((), move |_| {
            let _ = std::fs::remove_file(&incoming);
            let _ = std::fs::remove_file(&outgoing);
        })
    };

    let result = run_stages(&job, &paths, store, transcoder, spec).await;

    // Normal exit: cleanup runs here, with logging; defuse the guard.
    workspace.cleanup(&paths).await;
    let () = scopeguard::ScopeGuard::into_inner(abandon_guard);

    match result {
        Ok(public_url) => {
            info!(
                job_id = %job.id,
                object = %job.output_object,
                url = %public_url,
                "Job succeeded"
            );
            JobOutcome::Succeeded { public_url }
        }
        Err((stage, message)) => {
            error!(job_id = %job.id, stage = %stage, "Job failed: {}", message);
            JobOutcome::Failed { stage, message }
        }
    }
}

/// The three sequenced stages. Cleanup is the caller's responsibility so it
/// covers every early return, the download stage included.
async fn run_stages(
    job: &Job,
    paths: &StagedPaths,
    store: &dyn ObjectStore,
    transcoder: &dyn Transcoder,
    spec: &TranscodeSpec,
) -> Result<String, (FailureStage, String)> {
    info!(job_id = %job.id, object = %job.source_object, "Downloading raw object");
    store
        .download_raw(&job.source_object, &paths.incoming)
        .await
        .map_err(|e| (FailureStage::Download, stage_message(&e)))?;

    info!(job_id = %job.id, "Transcoding to {}p", spec.target_height);
    transcoder
        .transcode(&paths.incoming, &paths.outgoing, spec)
        .await
        .map_err(|e| (FailureStage::Transcode, e.diagnostic()))?;

    info!(job_id = %job.id, object = %job.output_object, "Uploading processed object");
    let public_url = store
        .upload_processed(&paths.outgoing, &job.output_object)
        .await
        .map_err(|e| (FailureStage::Upload, stage_message(&e)))?;

    Ok(public_url)
}

fn stage_message(e: &StorageError) -> String {
    e.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;
    use vproc_storage::StorageError;

    /// In-memory store: one raw object, records every published upload.
    struct FakeStore {
        raw_object: String,
        raw_content: Vec<u8>,
        fail_download: bool,
        fail_upload: bool,
        uploads: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl FakeStore {
        fn with_object(name: &str, content: &[u8]) -> Self {
            Self {
                raw_object: name.to_string(),
                raw_content: content.to_vec(),
                fail_download: false,
                fail_upload: false,
                uploads: Mutex::new(Vec::new()),
            }
        }

        fn uploads(&self) -> Vec<(String, Vec<u8>)> {
            self.uploads.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ObjectStore for FakeStore {
        async fn download_raw(&self, object: &str, dest: &Path) -> StorageResult<()> {
            if self.fail_download {
                // Partial download before the failure
                tokio::fs::write(dest, b"partial").await?;
                return Err(StorageError::unavailable("store offline"));
            }
            if object != self.raw_object {
                return Err(StorageError::not_found(object));
            }
            tokio::fs::write(dest, &self.raw_content).await?;
            Ok(())
        }

        async fn upload_processed(&self, path: &Path, object: &str) -> StorageResult<String> {
            if self.fail_upload {
                return Err(StorageError::unavailable("store offline"));
            }
            let bytes = tokio::fs::read(path).await?;
            self.uploads
                .lock()
                .unwrap()
                .push((object.to_string(), bytes));
            Ok(format!("https://store.test/processed/{}", object))
        }

        async fn check_connectivity(&self) -> StorageResult<()> {
            Ok(())
        }
    }

    /// Fake encoder: appends a marker, or fails after writing partial output.
    struct FakeTranscoder {
        fail: bool,
        delay: Option<Duration>,
    }

    impl FakeTranscoder {
        fn ok() -> Self {
            Self {
                fail: false,
                delay: None,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                delay: None,
            }
        }
    }

    #[async_trait]
    impl Transcoder for FakeTranscoder {
        async fn transcode(
            &self,
            input: &Path,
            output: &Path,
            _spec: &TranscodeSpec,
        ) -> Result<(), MediaError> {
            if !input.is_file() {
                return Err(MediaError::SourceUnreadable(input.to_path_buf()));
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                tokio::fs::write(output, b"partial output").await?;
                return Err(MediaError::ffmpeg_failed(
                    "encoder error",
                    Some("stream corrupt".to_string()),
                    Some(1),
                ));
            }
            let mut bytes = tokio::fs::read(input).await?;
            bytes.extend_from_slice(b" [360p]");
            tokio::fs::write(output, bytes).await?;
            Ok(())
        }
    }

    async fn scratch() -> (TempDir, Workspace) {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::new(dir.path().join("in"), dir.path().join("out"));
        ws.ensure_directories().await.unwrap();
        (dir, ws)
    }

    async fn assert_no_orphans(ws: &Workspace) {
        for dir in [ws.incoming_dir(), ws.outgoing_dir()] {
            let mut entries = tokio::fs::read_dir(dir).await.unwrap();
            assert!(
                entries.next_entry().await.unwrap().is_none(),
                "orphaned file left in {}",
                dir.display()
            );
        }
    }

    #[tokio::test]
    async fn test_successful_job_publishes_and_cleans_up() {
        let (_dir, ws) = scratch().await;
        let store = FakeStore::with_object("clip1.mp4", b"raw video");
        let spec = TranscodeSpec::default();

        let outcome = run_job(
            Job::new("clip1.mp4"),
            &ws,
            &store,
            &FakeTranscoder::ok(),
            &spec,
        )
        .await;

        match outcome {
            JobOutcome::Succeeded { public_url } => {
                assert!(public_url.ends_with("processed-clip1.mp4"));
            }
            other => panic!("expected success, got {:?}", other),
        }

        let uploads = store.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].0, "processed-clip1.mp4");
        assert_eq!(uploads[0].1, b"raw video [360p]");

        assert_no_orphans(&ws).await;
    }

    #[tokio::test]
    async fn test_download_failure_cleans_partial_file() {
        let (_dir, ws) = scratch().await;
        let mut store = FakeStore::with_object("clip1.mp4", b"raw");
        store.fail_download = true;
        let spec = TranscodeSpec::default();

        let outcome = run_job(
            Job::new("clip1.mp4"),
            &ws,
            &store,
            &FakeTranscoder::ok(),
            &spec,
        )
        .await;

        assert!(matches!(
            outcome,
            JobOutcome::Failed {
                stage: FailureStage::Download,
                ..
            }
        ));
        assert!(store.uploads().is_empty());
        assert_no_orphans(&ws).await;
    }

    #[tokio::test]
    async fn test_missing_object_fails_download_stage() {
        let (_dir, ws) = scratch().await;
        let store = FakeStore::with_object("other.mp4", b"raw");
        let spec = TranscodeSpec::default();

        let outcome = run_job(
            Job::new("clip1.mp4"),
            &ws,
            &store,
            &FakeTranscoder::ok(),
            &spec,
        )
        .await;

        assert!(matches!(
            outcome,
            JobOutcome::Failed {
                stage: FailureStage::Download,
                ..
            }
        ));
        assert_no_orphans(&ws).await;
    }

    #[tokio::test]
    async fn test_transcode_failure_cleans_both_staged_files() {
        let (_dir, ws) = scratch().await;
        let store = FakeStore::with_object("clip1.mp4", b"raw");
        let spec = TranscodeSpec::default();

        let outcome = run_job(
            Job::new("clip1.mp4"),
            &ws,
            &store,
            &FakeTranscoder::failing(),
            &spec,
        )
        .await;

        assert!(matches!(
            outcome,
            JobOutcome::Failed {
                stage: FailureStage::Transcode,
                ..
            }
        ));
        assert!(store.uploads().is_empty());
        assert_no_orphans(&ws).await;
    }

    #[tokio::test]
    async fn test_upload_failure_cleans_up_and_publishes_nothing() {
        let (_dir, ws) = scratch().await;
        let mut store = FakeStore::with_object("clip1.mp4", b"raw");
        store.fail_upload = true;
        let spec = TranscodeSpec::default();

        let outcome = run_job(
            Job::new("clip1.mp4"),
            &ws,
            &store,
            &FakeTranscoder::ok(),
            &spec,
        )
        .await;

        assert!(matches!(
            outcome,
            JobOutcome::Failed {
                stage: FailureStage::Upload,
                ..
            }
        ));
        assert!(store.uploads().is_empty());
        assert_no_orphans(&ws).await;
    }

    #[tokio::test]
    async fn test_abandoned_job_releases_staged_files() {
        let (_dir, ws) = scratch().await;
        let store = FakeStore::with_object("clip1.mp4", b"raw");
        let spec = TranscodeSpec::default();
        let transcoder = FakeTranscoder {
            fail: false,
            delay: Some(Duration::from_secs(60)),
        };

        let fut = run_job(Job::new("clip1.mp4"), &ws, &store, &transcoder, &spec);

        // Abandon mid-transcode, as a request timeout would
        let abandoned = tokio::time::timeout(Duration::from_millis(100), fut).await;
        assert!(abandoned.is_err());

        assert_no_orphans(&ws).await;
    }

    #[tokio::test]
    async fn test_concurrent_same_name_jobs_do_not_corrupt_each_other() {
        let (_dir, ws) = scratch().await;
        let store = FakeStore::with_object("clip1.mp4", b"raw video");
        let spec = TranscodeSpec::default();
        let transcoder = FakeTranscoder {
            fail: false,
            delay: Some(Duration::from_millis(20)),
        };

        let (a, b) = tokio::join!(
            run_job(Job::new("clip1.mp4"), &ws, &store, &transcoder, &spec),
            run_job(Job::new("clip1.mp4"), &ws, &store, &transcoder, &spec),
        );

        assert!(a.is_success());
        assert!(b.is_success());

        // Both uploads carry the full, uncorrupted derivative
        let uploads = store.uploads();
        assert_eq!(uploads.len(), 2);
        for (object, bytes) in uploads {
            assert_eq!(object, "processed-clip1.mp4");
            assert_eq!(bytes, b"raw video [360p]");
        }

        assert_no_orphans(&ws).await;
    }

    #[tokio::test]
    async fn test_outcome_is_terminal_and_exclusive() {
        let (_dir, ws) = scratch().await;
        let store = FakeStore::with_object("clip1.mp4", b"raw");
        let spec = TranscodeSpec::default();

        let success = run_job(
            Job::new("clip1.mp4"),
            &ws,
            &store,
            &FakeTranscoder::ok(),
            &spec,
        )
        .await;
        assert!(success.is_success());

        let failure = run_job(
            Job::new("clip1.mp4"),
            &ws,
            &store,
            &FakeTranscoder::failing(),
            &spec,
        )
        .await;
        assert!(!failure.is_success());
        assert!(matches!(failure, JobOutcome::Failed { .. }));
    }
}
