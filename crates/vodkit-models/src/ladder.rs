//! Rendition ladder configuration.

use serde::{Deserialize, Serialize};

/// Audio bitrate applied to every rendition.
pub const AUDIO_BITRATE: &str = "128k";
/// Audio channel count applied to every rendition.
pub const AUDIO_CHANNELS: &str = "2";
/// x264 preset for ladder encodes.
pub const VIDEO_PRESET: &str = "veryfast";
/// Target segment duration in seconds.
pub const SEGMENT_SECONDS: u32 = 4;

/// One tier of the rendition ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenditionTier {
    /// Output height in pixels (width follows the source aspect)
    pub height: u32,
    /// Target video bitrate in kbps
    pub video_bitrate_kbps: u32,
    /// VBV max rate in kbps
    pub max_bitrate_kbps: u32,
    /// VBV buffer size in kbps
    pub buffer_size_kbps: u32,
    /// Constant rate factor (lower is higher quality)
    pub crf: u8,
}

impl RenditionTier {
    pub fn new(
        height: u32,
        video_bitrate_kbps: u32,
        max_bitrate_kbps: u32,
        buffer_size_kbps: u32,
        crf: u8,
    ) -> Self {
        Self {
            height,
            video_bitrate_kbps,
            max_bitrate_kbps,
            buffer_size_kbps,
            crf,
        }
    }

    /// Video bitrate as an ffmpeg argument, e.g. "5000k".
    pub fn video_bitrate(&self) -> String {
        format!("{}k", self.video_bitrate_kbps)
    }

    /// Max rate as an ffmpeg argument.
    pub fn max_rate(&self) -> String {
        format!("{}k", self.max_bitrate_kbps)
    }

    /// Buffer size as an ffmpeg argument.
    pub fn buffer_size(&self) -> String {
        format!("{}k", self.buffer_size_kbps)
    }

    /// Fallback resolution label when the master playlist cannot be parsed.
    pub fn fallback_resolution(&self) -> String {
        format!("{}p", self.height)
    }
}

/// The ordered list of rendition tiers to produce per job.
///
/// Index 0 is the highest quality tier and maps to the `v0` output
/// directory; the mechanism supports any number of tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenditionLadder {
    pub tiers: Vec<RenditionTier>,
}

impl RenditionLadder {
    pub fn new(tiers: Vec<RenditionTier>) -> Self {
        Self { tiers }
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RenditionTier> {
        self.tiers.iter()
    }
}

impl Default for RenditionLadder {
    /// The current deployment ladder: a single 1080p tier.
    fn default() -> Self {
        Self::new(vec![RenditionTier::new(1080, 5000, 5350, 7500, 22)])
    }
}
