//! Persisted rendition variants.

use serde::{Deserialize, Serialize};

use crate::asset::AssetId;
use crate::job::JobId;
use crate::transcode::VariantDescriptor;

/// One rendition row produced by a successful job.
///
/// The set of variants for a given `job_id` is replaced atomically; rows are
/// only ever written on job success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    /// Owning job
    pub job_id: JobId,

    /// Owning asset
    pub video_id: AssetId,

    /// Ladder rank, 0 = highest quality
    pub level: u32,

    /// Encoded resolution, e.g. "1920x1080"
    pub resolution: String,

    /// Target video bitrate in kbps
    pub bitrate_kbps: u32,

    /// Object key of the rendition sub-playlist
    pub playlist_path: String,

    /// Object key prefix under which the segments live
    pub segment_path_prefix: String,

    /// Total duration in whole seconds, if the playlist was parseable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,

    /// Hex digest of the sub-playlist content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl Variant {
    /// Build a persisted variant row from a transcode descriptor.
    pub fn from_descriptor(job_id: JobId, video_id: AssetId, d: VariantDescriptor) -> Self {
        Self {
            job_id,
            video_id,
            level: d.level,
            resolution: d.resolution,
            bitrate_kbps: d.bitrate_kbps,
            playlist_path: d.playlist_path,
            segment_path_prefix: d.segment_path_prefix,
            duration_seconds: d.duration_seconds,
            checksum: d.checksum,
        }
    }
}
