//! Playlist content checksums.

use std::path::Path;

use md5::{Digest, Md5};

use crate::error::MediaResult;

/// MD5 hex digest of a playlist file.
///
/// Used as a tamper/identity check on the sub-playlist, not as a full-asset
/// hash. Returns `None` when the file does not exist.
pub async fn playlist_checksum(path: &Path) -> MediaResult<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = tokio::fs::read(path).await?;
    let digest = Md5::digest(&bytes);
    Ok(Some(format!("{:x}", digest)))
}
