//! FFmpeg command construction, execution and HLS playlist inspection.
//!
//! This crate provides:
//! - The [`CommandRunner`] seam and its FFmpeg implementation
//! - The rendition-ladder HLS command builder
//! - Master/sub-playlist parsing (resolutions, durations)
//! - Playlist content checksums

pub mod checksum;
pub mod command;
pub mod error;
pub mod hls;
pub mod playlist;

pub use checksum::playlist_checksum;
pub use command::{check_ffmpeg, CommandRunner, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use hls::HlsLadderCommand;
pub use playlist::{master_resolutions, playlist_duration_seconds};
