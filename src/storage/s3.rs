use anyhow::Context;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client as S3Client;
use std::path::Path;

use super::{public_url, ObjectStorage};
use crate::config::StorageConfig;
use crate::extractors::AudioFormat;

/// S3 (or S3-compatible, e.g. Backblaze B2) bucket serving clips publicly
pub struct S3Storage {
    client: S3Client,
    bucket: String,
    key_prefix: String,
    public_base: String,
}

impl S3Storage {
    /// Build a client from the storage config; credentials come from the environment
    pub async fn new(config: &StorageConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint.is_some())
            .build();

        Self {
            client: S3Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            key_prefix: config.key_prefix.clone().unwrap_or_default(),
            public_base: config.public_base(),
        }
    }

    fn object_key(&self, destination: &str) -> String {
        format!("{}{}", self.key_prefix, destination)
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn upload(&self, local_path: &Path, destination: &str) -> anyhow::Result<String> {
        crate::utils::check_file_accessible(local_path)?;

        let key = self.object_key(destination);
        tracing::info!("Uploading clip to s3://{}/{}", self.bucket, key);

        let content_type = local_path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(AudioFormat::from_extension)
            .map(|format| format.mime_type())
            .unwrap_or("application/octet-stream");

        let content = fs_err::read(local_path)?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(content.into())
            .content_type(content_type)
            .send()
            .await
            .context("Failed to upload clip to object storage")?;

        Ok(public_url(&self.public_base, &key))
    }
}
