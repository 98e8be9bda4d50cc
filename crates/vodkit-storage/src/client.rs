//! S3-compatible object store client (MinIO, AWS S3).

use std::path::Path;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::object_store::ObjectStore;

/// Configuration for the S3 client.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// S3 API endpoint URL (e.g. a local MinIO endpoint)
    pub endpoint_url: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Region
    pub region: String,
}

impl S3Config {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            endpoint_url: std::env::var("S3_ENDPOINT_URL")
                .map_err(|_| StorageError::config_error("S3_ENDPOINT_URL not set"))?,
            access_key_id: std::env::var("S3_ACCESS_KEY_ID")
                .map_err(|_| StorageError::config_error("S3_ACCESS_KEY_ID not set"))?,
            secret_access_key: std::env::var("S3_SECRET_ACCESS_KEY")
                .map_err(|_| StorageError::config_error("S3_SECRET_ACCESS_KEY not set"))?,
            region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
        })
    }
}

/// S3-compatible [`ObjectStore`] implementation.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    region: String,
}

impl S3ObjectStore {
    /// Create a new client from configuration.
    pub fn new(config: S3Config) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "vodkit",
        );

        // Path-style addressing keeps MinIO endpoints working.
        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(sdk_config),
            region: config.region,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self::new(S3Config::from_env()?))
    }

    /// Ensure a bucket exists, creating it when the head probe 404s.
    pub async fn ensure_bucket(&self, bucket: &str) -> StorageResult<()> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(()),
            Err(head_err) => {
                debug!(bucket = bucket, "Head bucket failed, creating: {}", head_err);
                let mut request = self.client.create_bucket().bucket(bucket);
                if !self.region.eq_ignore_ascii_case("us-east-1") {
                    request = request.create_bucket_configuration(
                        aws_sdk_s3::types::CreateBucketConfiguration::builder()
                            .location_constraint(aws_sdk_s3::types::BucketLocationConstraint::from(
                                self.region.as_str(),
                            ))
                            .build(),
                    );
                }
                match request.send().await {
                    Ok(_) => {
                        info!(bucket = bucket, "Created bucket");
                        Ok(())
                    }
                    // A concurrent creator winning the race is fine.
                    Err(e)
                        if e.as_service_error()
                            .is_some_and(|s| s.is_bucket_already_owned_by_you()) =>
                    {
                        Ok(())
                    }
                    Err(e) => Err(StorageError::bucket_failed(bucket, e.to_string())),
                }
            }
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn download(&self, bucket: &str, key: &str, local_path: &Path) -> StorageResult<()> {
        debug!("Downloading s3://{}/{} to {}", bucket, key, local_path.display());

        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::download_failed(key, e.to_string()))?;

        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::download_failed(key, e.to_string()))?;
        }

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::download_failed(key, e.to_string()))?
            .into_bytes();
        tokio::fs::write(local_path, &bytes)
            .await
            .map_err(|e| StorageError::download_failed(key, e.to_string()))?;

        info!("Downloaded s3://{}/{} to {}", bucket, key, local_path.display());
        Ok(())
    }

    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        local_path: &Path,
        content_type: &str,
    ) -> StorageResult<()> {
        debug!("Uploading {} to s3://{}/{}", local_path.display(), bucket, key);

        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|e| StorageError::upload_failed(key, e.to_string()))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(key, e.to_string()))?;

        info!("Uploaded {} ({})", key, content_type);
        Ok(())
    }
}
