//! Contracts over the hosted storage tiers. Both services are consumed as
//! opaque capabilities; these traits are the entire surface the pipelines
//! may touch.

pub mod redis_kv;
pub mod s3_blobs;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key-value read failed: {0}")]
    Read(String),
    #[error("key-value write failed: {0}")]
    Write(String),
}

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob upload failed for '{key}': {detail}")]
    Put { key: String, detail: String },
    #[error("blob read failed for '{key}': {detail}")]
    Get { key: String, detail: String },
    #[error("blob link resolution failed for '{key}': {detail}")]
    Presign { key: String, detail: String },
}

/// String keys to string values, nothing else.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Upload, read back, and mint transient links for stored bytes.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), BlobError>;
    async fn get(&self, key: &str) -> Result<Vec<u8>, BlobError>;
    /// Mints an expiring URL for direct client access to a blob. Expiry is
    /// the unconditional release of the handle.
    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, BlobError>;
}
