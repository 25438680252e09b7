//! S3-compatible content store (AWS S3, Cloudflare R2, MinIO).

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;

use crate::error::{AppError, Result};
use crate::models::S3Config;
use crate::storage::ContentStore;

/// Uploads menu sources into a bucket.
pub struct S3ContentStore {
    client: Client,
    bucket: String,
    public_base_url: Option<String>,
}

impl S3ContentStore {
    /// Create a new S3 content store.
    pub fn new(client: Client, bucket: impl Into<String>, public_base_url: Option<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            public_base_url: public_base_url.map(|url| url.trim_end_matches('/').to_string()),
        }
    }

    /// Create a store from configuration, taking credentials from the
    /// standard AWS environment.
    pub async fn from_config(config: &S3Config) -> Result<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let shared = loader.load().await;

        // Path-style addressing is required by R2 and MinIO endpoints
        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.endpoint_url.is_some())
            .build();

        Ok(Self::new(
            Client::from_conf(s3_config),
            &config.bucket,
            config.public_base_url.clone(),
        ))
    }

    /// Public URL when a base URL is configured, else an `s3://` URI.
    fn locator(&self, key: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/{}", base, key),
            None => format!("s3://{}/{}", self.bucket, key),
        }
    }
}

#[async_trait]
impl ContentStore for S3ContentStore {
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes.to_vec()))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::storage(e.into_service_error()))?;

        log::debug!("Uploaded {} bytes to s3://{}/{}", bytes.len(), self.bucket, key);
        Ok(self.locator(key))
    }
}
