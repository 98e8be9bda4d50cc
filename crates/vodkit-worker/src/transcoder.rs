//! The transcoder: source download, ladder encode, inspection, upload.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use vodkit_media::hls::{HlsLadderCommand, MASTER_PLAYLIST, STREAM_PLAYLIST};
use vodkit_media::{
    master_resolutions, playlist_checksum, playlist_duration_seconds, CommandRunner, FfmpegRunner,
};
use vodkit_models::{TranscodeResult, VariantDescriptor};
use vodkit_storage::{guess_content_type, ObjectStore};

use crate::config::TranscodeConfig;
use crate::error::{WorkerError, WorkerResult};

/// Turns one uploaded source object into a set of HLS renditions.
///
/// The transcoder never writes to the record store; it returns a
/// [`TranscodeResult`] value the dispatcher persists. Every failure mode is
/// fatal to the single attempt, retry is the caller's responsibility via a
/// new job.
pub struct Transcoder {
    objects: Arc<dyn ObjectStore>,
    runner: Arc<dyn CommandRunner>,
    config: TranscodeConfig,
}

impl Transcoder {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        runner: Arc<dyn CommandRunner>,
        config: TranscodeConfig,
    ) -> Self {
        Self {
            objects,
            runner,
            config,
        }
    }

    /// Builds a transcoder backed by the real FFmpeg runner, honoring the
    /// configured process timeout.
    pub fn with_ffmpeg(objects: Arc<dyn ObjectStore>, config: TranscodeConfig) -> Self {
        let runner = match config.process_timeout {
            Some(timeout) => FfmpegRunner::new().with_timeout(timeout),
            None => FfmpegRunner::new(),
        };
        Self::new(objects, Arc::new(runner), config)
    }

    /// Transcode a source object into the configured rendition ladder.
    ///
    /// The per-invocation working directory is unique, so concurrent jobs
    /// cannot collide on the filesystem, and it is removed on success and
    /// failure alike.
    pub async fn transcode_to_hls(
        &self,
        source_bucket: &str,
        source_object: &str,
    ) -> WorkerResult<TranscodeResult> {
        let base_name = strip_ext(file_name(source_object));

        tokio::fs::create_dir_all(&self.config.work_root).await?;
        // TempDir removes the whole tree when dropped, covering every exit
        // path out of this function.
        let working_dir = tempfile::Builder::new()
            .prefix(&format!("hls-{}-", base_name))
            .tempdir_in(&self.config.work_root)?;
        let output_dir = working_dir.path().join("hls");
        tokio::fs::create_dir_all(&output_dir).await?;
        let input_file = working_dir.path().join("input.mp4");

        self.objects
            .download(source_bucket, source_object, &input_file)
            .await?;

        for level in 0..self.config.ladder.len() {
            tokio::fs::create_dir_all(output_dir.join(HlsLadderCommand::tier_dir(level))).await?;
        }

        let argv =
            HlsLadderCommand::new(&input_file, &output_dir, self.config.ladder.clone()).build_argv();
        info!("Invoking ffmpeg with {} arguments", argv.len());
        let exit_code = self.runner.run(&argv).await?;
        if exit_code != 0 {
            return Err(WorkerError::ProcessFailed(exit_code));
        }

        let key_prefix = format!("{}{}/", self.config.output_prefix, base_name);
        let variants = self.collect_variant_metadata(&output_dir, &key_prefix).await?;
        self.upload_output_tree(&output_dir, &key_prefix).await?;

        Ok(TranscodeResult {
            playback_url: format!("{}{}/{}", self.config.playback_base, base_name, MASTER_PLAYLIST),
            variants,
        })
    }

    async fn collect_variant_metadata(
        &self,
        output_dir: &Path,
        key_prefix: &str,
    ) -> WorkerResult<Vec<VariantDescriptor>> {
        let resolutions = master_resolutions(&output_dir.join(MASTER_PLAYLIST)).await?;

        let mut variants = Vec::with_capacity(self.config.ladder.len());
        for (level, tier) in self.config.ladder.iter().enumerate() {
            let tier_dir = output_dir.join(HlsLadderCommand::tier_dir(level));
            let playlist = tier_dir.join(STREAM_PLAYLIST);

            let parsed = resolutions.get(level).cloned().flatten();
            if parsed.is_none() {
                warn!(
                    level = level,
                    "Master playlist missing resolution, falling back to {}p", tier.height
                );
            }
            let resolution = parsed.unwrap_or_else(|| tier.fallback_resolution());

            variants.push(VariantDescriptor {
                level: level as u32,
                resolution,
                bitrate_kbps: tier.video_bitrate_kbps,
                playlist_path: format!("{}v{}/{}", key_prefix, level, STREAM_PLAYLIST),
                segment_path_prefix: format!("{}v{}/", key_prefix, level),
                duration_seconds: playlist_duration_seconds(&playlist).await?,
                checksum: playlist_checksum(&playlist).await?,
            });
        }
        Ok(variants)
    }

    /// Upload every regular file under the output directory, mirroring the
    /// local relative path into the object key.
    async fn upload_output_tree(&self, output_dir: &Path, key_prefix: &str) -> WorkerResult<()> {
        let files = collect_files(output_dir).await?;

        for file in files {
            let rel = file
                .strip_prefix(output_dir)
                .unwrap_or(&file)
                .to_string_lossy()
                .replace('\\', "/");
            let key = format!("{}{}", key_prefix, rel);
            let content_type = guess_content_type(&file);

            self.objects
                .upload(&self.config.output_bucket, &key, &file, content_type)
                .await?;
        }
        Ok(())
    }
}

/// Recursively collect the regular files under a directory, sorted by path.
async fn collect_files(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                stack.push(entry.path());
            } else if file_type.is_file() {
                files.push(entry.path());
            }
        }
    }

    files.sort();
    Ok(files)
}

fn file_name(object_key: &str) -> &str {
    object_key.rsplit('/').next().unwrap_or(object_key)
}

fn strip_ext(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}
