use anyhow::Result;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;

use super::{Location, ObjectStore};

const PARQUET_CONTENT_TYPE: &str = "application/vnd.apache.parquet";

/// Uploads objects with `PutObject`.
pub struct S3Store {
    client: aws_sdk_s3::Client,
}

impl S3Store {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    /// Builds a client from the ambient AWS configuration (env vars, profile,
    /// execution role).
    pub async fn from_env() -> Self {
        let config = aws_config::load_from_env().await;
        Self::new(aws_sdk_s3::Client::new(&config))
    }
}

#[async_trait::async_trait]
impl ObjectStore for S3Store {
    async fn put(&self, location: &Location, body: Bytes) -> Result<()> {
        let Location::S3 { bucket, key } = location else {
            anyhow::bail!("S3 store cannot write {location}");
        };
        let size = body.len();

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(PARQUET_CONTENT_TYPE)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("{}", DisplayErrorContext(&e)))?;

        info!(bucket = %bucket, key = %key, bytes = size, "S3 upload complete");
        Ok(())
    }
}
