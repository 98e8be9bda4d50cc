//! External process execution.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};

/// Seam for spawning the external transcoding process.
///
/// `argv[0]` is the program; the runner streams the process output to the
/// log while it runs and returns the exit code. Mapping a non-zero code to
/// a failure is the caller's decision.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, argv: &[String]) -> MediaResult<i32>;
}

/// [`CommandRunner`] backed by a real FFmpeg child process.
///
/// stdout and stderr are consumed line-by-line as the process runs, so
/// memory stays bounded and operators see live progress.
#[derive(Debug, Clone, Default)]
pub struct FfmpegRunner {
    /// Hard timeout for the child process; the child is killed on expiry.
    timeout: Option<Duration>,
}

impl FfmpegRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a hard timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl CommandRunner for FfmpegRunner {
    async fn run(&self, argv: &[String]) -> MediaResult<i32> {
        let (program, args) = argv.split_first().ok_or(MediaError::FfmpegNotFound)?;
        which::which(program).map_err(|_| MediaError::FfmpegNotFound)?;

        debug!("Running {} with {} arguments", program, args.len());

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdout_task = tokio::spawn(stream_lines(stdout));
        let stderr_task = tokio::spawn(stream_lines(stderr));

        let status = if let Some(timeout) = self.timeout {
            match tokio::time::timeout(timeout, child.wait()).await {
                Ok(result) => result?,
                Err(_) => {
                    warn!("Process timed out after {:?}, killing", timeout);
                    let _ = child.kill().await;
                    let _ = stdout_task.await;
                    let _ = stderr_task.await;
                    return Err(MediaError::Timeout(timeout.as_secs()));
                }
            }
        } else {
            child.wait().await?
        };

        let _ = stdout_task.await;
        let _ = stderr_task.await;

        status.code().ok_or(MediaError::Terminated)
    }
}

async fn stream_lines<R: AsyncRead + Unpin>(reader: Option<R>) {
    let Some(reader) = reader else {
        return;
    };
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        info!(target: "ffmpeg", "{}", line);
    }
}

/// Check that FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_argv_is_rejected() {
        let runner = FfmpegRunner::new();
        let result = runner.run(&[]).await;
        assert!(matches!(result, Err(MediaError::FfmpegNotFound)));
    }

    #[tokio::test]
    async fn test_missing_program_is_rejected() {
        let runner = FfmpegRunner::new();
        let result = runner
            .run(&["definitely-not-a-real-encoder".to_string()])
            .await;
        assert!(matches!(result, Err(MediaError::FfmpegNotFound)));
    }

    #[tokio::test]
    async fn test_timeout_kills_a_hung_process() {
        let runner = FfmpegRunner::new().with_timeout(Duration::from_millis(100));
        let result = runner
            .run(&["sleep".to_string(), "30".to_string()])
            .await;
        assert!(matches!(result, Err(MediaError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_run_without_timeout_returns_exit_code() {
        let runner = FfmpegRunner::new();
        let code = runner
            .run(&["true".to_string()])
            .await
            .unwrap();
        assert_eq!(code, 0);
    }
}
