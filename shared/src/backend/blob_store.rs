use async_trait::async_trait;

use super::BackendResult;

/// Options for [`BlobStore::put`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutOptions {
    /// Overwrite an existing object under the same key
    pub upsert: bool,
    pub content_type: Option<String>,
    /// Cache directive served with the object
    pub cache_control: Option<String>,
}

/// Blob store contract (one bucket)
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, content: Vec<u8>, options: PutOptions) -> BackendResult<()>;

    /// Stable public URL of an object
    fn public_url(&self, key: &str) -> String;

    /// All object keys in the bucket
    async fn list(&self) -> BackendResult<Vec<String>>;

    /// Remove objects; missing keys are not an error
    async fn remove(&self, keys: &[String]) -> BackendResult<()>;
}
