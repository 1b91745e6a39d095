//! Object storage for the landing, clean and quarantine zones

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::{config::Region, error::DisplayErrorContext, primitives::ByteStream, Client};
use tracing::{debug, info, instrument};

use crate::error::StorageError;

pub mod config;

/// Prefix-addressed, flat object store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Write `body` under `key`, replacing any existing object.
    async fn put(&self, key: &str, body: Vec<u8>, content_type: Option<&str>) -> Result<(), StorageError>;
}

/// S3 bucket-backed object store
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    pub async fn new(config: config::StorageConfig) -> Self {
        debug!("Initializing storage with config: {:?}", config);

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            loader = loader.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "healthwatch-storage",
            ));
        }

        let sdk_config = loader.load().await;

        let mut s3_config_builder =
            aws_sdk_s3::config::Builder::from(&sdk_config).force_path_style(config.path_style);

        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(s3_config_builder.build());

        info!("Storage client initialized for bucket: {}", config.bucket);

        Self {
            client,
            bucket: config.bucket,
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        debug!("Downloading from s3://{}/{}", self.bucket, key);

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Get {
                key: key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Get {
                key: key.to_string(),
                message: format!("Failed to read S3 response body: {}", e),
            })?
            .into_bytes()
            .to_vec();

        debug!("Downloaded {} bytes from s3://{}/{}", data.len(), self.bucket, key);

        Ok(data)
    }

    #[instrument(skip(self, body))]
    async fn put(&self, key: &str, body: Vec<u8>, content_type: Option<&str>) -> Result<(), StorageError> {
        debug!("Uploading {} bytes to s3://{}/{}", body.len(), self.bucket, key);

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body));

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        request.send().await.map_err(|e| StorageError::Put {
            key: key.to_string(),
            message: DisplayErrorContext(&e).to_string(),
        })?;

        info!("Successfully uploaded to s3://{}/{}", self.bucket, key);

        Ok(())
    }
}
