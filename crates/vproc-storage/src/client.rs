//! S3-compatible store client for the raw and processed buckets.

use std::path::Path;

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};

/// Configuration for the store client.
///
/// Bucket identities are deployment configuration; a job can only address
/// objects by name within them.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Custom S3 API endpoint (unset for AWS proper)
    pub endpoint_url: Option<String>,
    /// Region
    pub region: String,
    /// Bucket holding raw uploads
    pub raw_bucket: String,
    /// Bucket holding processed derivatives
    pub processed_bucket: String,
    /// Static access key (unset to use the default provider chain)
    pub access_key_id: Option<String>,
    /// Static secret key
    pub secret_access_key: Option<String>,
}

impl StoreConfig {
    /// Create config from environment variables.
    ///
    /// Fails fast when a bucket name is unset or blank; a misconfigured
    /// deployment must not come up and fail mid-job.
    pub fn from_env() -> StorageResult<Self> {
        let config = Self {
            endpoint_url: std::env::var("STORE_ENDPOINT_URL").ok(),
            region: std::env::var("STORE_REGION").unwrap_or_else(|_| "auto".to_string()),
            raw_bucket: std::env::var("RAW_VIDEO_BUCKET")
                .map_err(|_| StorageError::config_error("RAW_VIDEO_BUCKET not set"))?,
            processed_bucket: std::env::var("PROCESSED_VIDEO_BUCKET")
                .map_err(|_| StorageError::config_error("PROCESSED_VIDEO_BUCKET not set"))?,
            access_key_id: std::env::var("STORE_ACCESS_KEY_ID").ok(),
            secret_access_key: std::env::var("STORE_SECRET_ACCESS_KEY").ok(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject blank bucket identifiers.
    pub fn validate(&self) -> StorageResult<()> {
        if self.raw_bucket.trim().is_empty() {
            return Err(StorageError::config_error("raw bucket name is blank"));
        }
        if self.processed_bucket.trim().is_empty() {
            return Err(StorageError::config_error("processed bucket name is blank"));
        }
        Ok(())
    }
}

/// Client for the raw and processed object stores.
#[derive(Clone)]
pub struct StoreClient {
    client: Client,
    raw_bucket: String,
    processed_bucket: String,
    endpoint_url: Option<String>,
    region: String,
}

impl StoreClient {
    /// Create a new store client from configuration.
    pub async fn new(config: StoreConfig) -> StorageResult<Self> {
        config.validate()?;

        let base = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = Builder::from(&base);

        if let Some(ref endpoint) = config.endpoint_url {
            // Custom endpoints (interop gateways) want path-style addressing
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        if let (Some(key), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            let credentials = Credentials::new(key, secret, None, None, "vproc");
            builder = builder.credentials_provider(credentials);
        }

        let client = Client::from_conf(builder.build());

        Ok(Self {
            client,
            raw_bucket: config.raw_bucket,
            processed_bucket: config.processed_bucket,
            endpoint_url: config.endpoint_url,
            region: config.region,
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> StorageResult<Self> {
        let config = StoreConfig::from_env()?;
        Self::new(config).await
    }

    /// Download a raw object to a local file.
    pub async fn download_raw(&self, object: &str, dest: impl AsRef<Path>) -> StorageResult<()> {
        let dest = dest.as_ref();
        debug!("Downloading {} to {}", object, dest.display());

        let response = self
            .client
            .get_object()
            .bucket(&self.raw_bucket)
            .key(object)
            .send()
            .await
            .map_err(|e| {
                if e.to_string().contains("NoSuchKey") {
                    StorageError::not_found(object)
                } else {
                    StorageError::unavailable(e.to_string())
                }
            })?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::unavailable(e.to_string()))?
            .into_bytes();

        tokio::fs::write(dest, &bytes).await?;

        info!(
            "Downloaded {}/{} to {}",
            self.raw_bucket,
            object,
            dest.display()
        );
        Ok(())
    }

    /// Upload a local file as a processed object and mark it publicly
    /// readable. Returns the public URL.
    pub async fn upload_processed(
        &self,
        path: impl AsRef<Path>,
        object: &str,
    ) -> StorageResult<String> {
        let path = path.as_ref();
        debug!("Uploading {} to {}", path.display(), object);

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::unavailable(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.processed_bucket)
            .key(object)
            .body(body)
            .content_type("video/mp4")
            .send()
            .await
            .map_err(|e| StorageError::unavailable(e.to_string()))?;

        // Visibility change is a distinct call; its failure also fails the
        // upload stage.
        self.client
            .put_object_acl()
            .bucket(&self.processed_bucket)
            .key(object)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| StorageError::unavailable(e.to_string()))?;

        let url = self.public_url(object);
        info!(
            "Uploaded {} to {}/{}",
            path.display(),
            self.processed_bucket,
            object
        );
        Ok(url)
    }

    /// Public URL of a processed object.
    fn public_url(&self, object: &str) -> String {
        match &self.endpoint_url {
            Some(endpoint) => format!(
                "{}/{}/{}",
                endpoint.trim_end_matches('/'),
                self.processed_bucket,
                object
            ),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.processed_bucket, self.region, object
            ),
        }
    }

    /// Check connectivity by heading both buckets.
    pub async fn check_connectivity(&self) -> StorageResult<()> {
        for bucket in [&self.raw_bucket, &self.processed_bucket] {
            self.client
                .head_bucket()
                .bucket(bucket)
                .send()
                .await
                .map_err(|e| {
                    StorageError::unavailable(format!("head bucket {} failed: {}", bucket, e))
                })?;
        }
        Ok(())
    }
}
