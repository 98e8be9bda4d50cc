//! Transcode job models and the job state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::asset::AssetId;

/// Unique identifier for a transcode job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Job state machine status.
///
/// Status only moves forward: Pending -> Dispatched -> Running ->
/// {Success, Failed}. Retries create a new job row rather than reusing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created, not yet handed to the worker pool
    #[default]
    Pending,
    /// Claimed by dispatch, queued for execution
    Dispatched,
    /// Executing on a worker
    Running,
    /// Renditions produced and persisted
    Success,
    /// Attempt failed; `error_message` carries the reason
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Dispatched => "dispatched",
            JobStatus::Running => "running",
            JobStatus::Success => "success",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One attempt to transcode an asset into playable renditions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeJob {
    /// Unique job ID
    pub id: JobId,

    /// Owning asset
    pub video_id: AssetId,

    /// Job kind (currently always an HLS ladder transcode)
    pub job_type: String,

    /// Named encode profile this job targets
    pub target_profile: String,

    /// Scheduling priority (higher runs first when the caller orders work)
    #[serde(default)]
    pub priority: i32,

    /// State machine status
    #[serde(default)]
    pub status: JobStatus,

    /// Failure reason (set only in Failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// When the worker picked the job up
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// When the job reached a terminal state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl TranscodeJob {
    /// Create a new Pending HLS transcode job for an asset.
    pub fn new_hls(video_id: AssetId, target_profile: impl Into<String>) -> Self {
        Self {
            id: JobId::new(),
            video_id,
            job_type: "hls_ladder".to_string(),
            target_profile: target_profile.into(),
            priority: 0,
            status: JobStatus::Pending,
            error_message: None,
            started_at: None,
            finished_at: None,
            created_at: Utc::now(),
        }
    }

    /// Claim the job for execution (Pending -> Dispatched).
    pub fn dispatched(mut self) -> Self {
        self.status = JobStatus::Dispatched;
        self
    }

    /// Release a dispatched job that could not be queued (Dispatched -> Pending).
    pub fn released(mut self) -> Self {
        self.status = JobStatus::Pending;
        self
    }

    /// Start executing on a worker (Dispatched -> Running).
    pub fn running(mut self) -> Self {
        self.status = JobStatus::Running;
        self.started_at = Some(Utc::now());
        self
    }

    /// Finish successfully (Running -> Success).
    pub fn succeeded(mut self) -> Self {
        self.status = JobStatus::Success;
        self.finished_at = Some(Utc::now());
        self.error_message = None;
        self
    }

    /// Finish with an error (-> Failed).
    pub fn failed(mut self, reason: impl Into<String>) -> Self {
        self.status = JobStatus::Failed;
        self.finished_at = Some(Utc::now());
        self.error_message = Some(reason.into());
        self
    }
}
