//! Rendition-ladder HLS command construction.

use std::path::{Path, PathBuf};

use vodkit_models::ladder::{AUDIO_BITRATE, AUDIO_CHANNELS, SEGMENT_SECONDS, VIDEO_PRESET};
use vodkit_models::RenditionLadder;

/// Name of the emitted master playlist.
pub const MASTER_PLAYLIST: &str = "master.m3u8";
/// Name of each rendition's sub-playlist.
pub const STREAM_PLAYLIST: &str = "stream.m3u8";

/// Builder for the single multi-rendition FFmpeg invocation.
///
/// The command maps the input's video and audio once per ladder tier,
/// encodes each tier at its target height/bitrate/crf with a fixed GOP
/// (keyframe every 60 frames at 30 fps, scene-cut detection disabled so
/// segment boundaries are deterministic), strips source metadata and
/// chapters, and emits a master playlist plus one sub-playlist and fMP4
/// segment set per tier.
#[derive(Debug, Clone)]
pub struct HlsLadderCommand {
    input: PathBuf,
    output_dir: PathBuf,
    ladder: RenditionLadder,
}

impl HlsLadderCommand {
    pub fn new(
        input: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
        ladder: RenditionLadder,
    ) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
            ladder,
        }
    }

    /// Relative output directory for a ladder tier, e.g. `v0`.
    pub fn tier_dir(level: usize) -> String {
        format!("v{}", level)
    }

    /// Build the full argv, program name included.
    pub fn build_argv(&self) -> Vec<String> {
        let mut argv: Vec<String> = vec![
            "ffmpeg".into(),
            "-y".into(),
            "-i".into(),
            self.input.to_string_lossy().into_owned(),
        ];

        for _ in self.ladder.iter() {
            argv.push("-map".into());
            argv.push("0:v:0".into());
            argv.push("-map".into());
            // Optional stream selector keeps audio-less sources encodable.
            argv.push("0:a:0?".into());
        }

        for (i, tier) in self.ladder.iter().enumerate() {
            argv.push(format!("-c:v:{}", i));
            argv.push("libx264".into());
            argv.push("-preset".into());
            argv.push(VIDEO_PRESET.into());
            argv.push("-crf".into());
            argv.push(tier.crf.to_string());
            argv.push(format!("-filter:v:{}", i));
            argv.push(format!("scale=-2:{}", tier.height));
            argv.push(format!("-b:v:{}", i));
            argv.push(tier.video_bitrate());
            argv.push(format!("-maxrate:v:{}", i));
            argv.push(tier.max_rate());
            argv.push(format!("-bufsize:v:{}", i));
            argv.push(tier.buffer_size());

            argv.push(format!("-c:a:{}", i));
            argv.push("aac".into());
            argv.push(format!("-ac:{}", i));
            argv.push(AUDIO_CHANNELS.into());
            argv.push(format!("-b:a:{}", i));
            argv.push(AUDIO_BITRATE.into());
        }

        let segment_template = self.output_dir.join("v%v").join("seg_%06d.m4s");
        let playlist_template = self.output_dir.join("v%v").join(STREAM_PLAYLIST);

        argv.extend(
            [
                "-r",
                "30",
                "-g",
                "60",
                "-keyint_min",
                "60",
                "-sc_threshold",
                "0",
                "-map_metadata",
                "-1",
                "-map_chapters",
                "-1",
                "-f",
                "hls",
                "-hls_time",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        argv.push(SEGMENT_SECONDS.to_string());
        argv.extend(
            [
                "-hls_playlist_type",
                "vod",
                "-hls_segment_type",
                "fmp4",
                "-hls_flags",
                "independent_segments+split_by_time",
                "-master_pl_name",
                MASTER_PLAYLIST,
                "-var_stream_map",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        argv.push(self.var_stream_map());
        argv.push("-hls_segment_filename".into());
        argv.push(segment_template.to_string_lossy().replace('\\', "/"));
        argv.push(playlist_template.to_string_lossy().replace('\\', "/"));

        argv
    }

    fn var_stream_map(&self) -> String {
        (0..self.ladder.len())
            .map(|i| format!("v:{},a:{}", i, i))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
