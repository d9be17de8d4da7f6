use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use std::path::Path;
use tracing::debug;

use super::bucket::Bucket;
use crate::credentials::S3Config;

/// Bucket implementation for S3-compatible object stores
#[derive(Clone)]
pub struct S3Bucket {
    s3_client: S3Client,
    bucket: String,
}

impl S3Bucket {
    pub fn new(s3_client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            s3_client,
            bucket: bucket.into(),
        }
    }
}

/// Build an S3 client for `config` and return a handle on its bucket
///
/// Uses the configured endpoint with static credentials and path-style
/// addressing, which S3-compatible stores generally require.
pub async fn attach_s3_bucket(config: &S3Config) -> Result<S3Bucket> {
    let credentials = Credentials::new(
        &config.access_key,
        &config.secret_key,
        None,
        None,
        "trino-ingest",
    );

    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .endpoint_url(&config.endpoint)
        .credentials_provider(credentials)
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(true)
        .build();

    debug!(endpoint = %config.endpoint, bucket = %config.bucket, "attached S3 bucket");
    Ok(S3Bucket::new(S3Client::from_conf(s3_config), &config.bucket))
}

#[async_trait]
impl Bucket for S3Bucket {
    fn name(&self) -> &str {
        &self.bucket
    }

    async fn upload_file(&self, path: &Path, key: &str) -> Result<()> {
        let body = ByteStream::from_path(path)
            .await
            .with_context(|| format!("Failed to open {}", path.display()))?;

        self.s3_client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .with_context(|| format!("Failed to upload s3://{}/{key}", self.bucket))?;

        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation_token = None;

        loop {
            let response = self
                .s3_client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .with_context(|| format!("Failed to list s3://{}/{prefix}", self.bucket))?;

            keys.extend(
                response
                    .contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );

            match response.next_continuation_token() {
                Some(token) => continuation_token = Some(token.to_string()),
                None => break,
            }
        }

        keys.sort();
        Ok(keys)
    }

    async fn delete_keys(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let objects = keys
            .iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to build delete request")?;
        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(true)
            .build()
            .context("Failed to build delete request")?;

        let response = self
            .s3_client
            .delete_objects()
            .bucket(&self.bucket)
            .delete(delete)
            .send()
            .await
            .with_context(|| format!("Failed to delete objects from s3://{}", self.bucket))?;

        if let Some(error) = response.errors().first() {
            bail!(
                "Failed to delete s3://{}/{}: {}",
                self.bucket,
                error.key().unwrap_or_default(),
                error.message().unwrap_or("unknown error")
            );
        }

        Ok(())
    }
}
