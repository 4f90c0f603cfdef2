//! Object storage for session photos

use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_s3::{Client, primitives::ByteStream};
use tracing::info;

#[async_trait]
pub trait PhotoStorage: Send + Sync {
    /// Store the object and return its public URL
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;
}

#[derive(Clone)]
pub struct S3PhotoStorage {
    s3_client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3PhotoStorage {
    pub fn new(s3_client: Client, bucket: String, public_base_url: String) -> Self {
        Self {
            s3_client,
            bucket,
            public_base_url,
        }
    }
}

fn public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}

#[async_trait]
impl PhotoStorage for S3PhotoStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        info!("Uploading photo to S3: {}", key);

        self.s3_client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await?;

        Ok(public_url(&self.public_base_url, key))
    }
}
