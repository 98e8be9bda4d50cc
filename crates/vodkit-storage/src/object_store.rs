//! The object store contract consumed by the transcode core.

use std::path::Path;

use async_trait::async_trait;

use crate::error::StorageResult;

/// Get/put contract against an object store, addressed by bucket + key.
///
/// Transport errors surface as [`crate::StorageError`] naming the key; the
/// core wraps them, it never retries them silently.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Download an object into a local file.
    async fn download(&self, bucket: &str, key: &str, local_path: &Path) -> StorageResult<()>;

    /// Upload a local file as an object with the given content type.
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        local_path: &Path,
        content_type: &str,
    ) -> StorageResult<()>;
}
