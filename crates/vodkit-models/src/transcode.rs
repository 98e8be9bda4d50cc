//! Transcode output value types.

use serde::{Deserialize, Serialize};

/// Everything the transcoder learned about one produced rendition.
///
/// Descriptors are values handed back to the dispatcher; they become
/// [`crate::Variant`] rows only when the job is marked successful.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantDescriptor {
    /// Ladder rank, 0 = highest quality
    pub level: u32,
    /// Encoded resolution parsed from the master playlist
    pub resolution: String,
    /// Target video bitrate in kbps
    pub bitrate_kbps: u32,
    /// Object key of the rendition sub-playlist
    pub playlist_path: String,
    /// Object key prefix for the rendition segments
    pub segment_path_prefix: String,
    /// Total rendition duration in whole seconds
    pub duration_seconds: Option<u32>,
    /// Hex digest of the sub-playlist content
    pub checksum: Option<String>,
}

/// Result of one successful transcode attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeResult {
    /// Public URL of the master playlist
    pub playback_url: String,
    /// One descriptor per ladder tier, ordered by level
    pub variants: Vec<VariantDescriptor>,
}
