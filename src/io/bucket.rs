use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

use crate::config::DELETE_BATCH_SIZE;

/// Abstraction over an object-storage bucket
///
/// Keys are `/`-separated strings relative to the bucket root. Listing and
/// deleting by prefix is all the staging code needs, so the trait stays small.
#[async_trait]
pub trait Bucket: Send + Sync {
    /// Bucket name as used in `s3a://` locations
    fn name(&self) -> &str;

    /// Upload a local file to `key`, replacing any existing object
    async fn upload_file(&self, path: &Path, key: &str) -> Result<()>;

    /// All keys starting with `prefix`, in lexicographic order
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// Delete the given keys; keys that do not exist are ignored
    async fn delete_keys(&self, keys: &[String]) -> Result<()>;

    /// Delete every object whose key starts with `prefix`
    ///
    /// Returns the number of objects deleted.
    async fn delete_prefix(&self, prefix: &str) -> Result<usize> {
        let keys = self.list_keys(prefix).await?;
        for chunk in keys.chunks(DELETE_BATCH_SIZE) {
            self.delete_keys(chunk).await?;
        }
        Ok(keys.len())
    }
}
