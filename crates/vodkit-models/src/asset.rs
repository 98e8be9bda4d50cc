//! Source asset models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a source asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub String);

impl AssetId {
    /// Generate a new random asset ID.
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

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AssetId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Asset lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    /// Upload ticket issued, bytes still arriving
    #[default]
    Uploading,
    /// Source object fully uploaded
    Uploaded,
    /// Source object validated
    Validated,
    /// A transcode job exists for this asset
    Processing,
    /// Renditions available, playback URL set
    Ready,
    /// Transcoding failed
    Failed,
    /// Retired from playback
    Archived,
}

impl AssetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetStatus::Uploading => "uploading",
            AssetStatus::Uploaded => "uploaded",
            AssetStatus::Validated => "validated",
            AssetStatus::Processing => "processing",
            AssetStatus::Ready => "ready",
            AssetStatus::Failed => "failed",
            AssetStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One source media item tracked through its processing lifecycle.
///
/// Invariant: `playback_url` is `Some` iff `status == Ready`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    /// Unique asset ID
    pub id: AssetId,

    /// Display title
    pub title: String,

    /// Bucket holding the uploaded source object
    pub source_bucket: String,

    /// Key of the uploaded source object
    pub source_object: String,

    /// Source size in bytes, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,

    /// Source content type, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Lifecycle status
    #[serde(default)]
    pub status: AssetStatus,

    /// Public playback URL of the master playlist (set when Ready)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playback_url: Option<String>,

    /// When the asset became playable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready_at: Option<DateTime<Utc>>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Asset {
    /// Create a new asset in the Uploading state.
    pub fn new(
        title: impl Into<String>,
        source_bucket: impl Into<String>,
        source_object: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: AssetId::new(),
            title: title.into(),
            source_bucket: source_bucket.into(),
            source_object: source_object.into(),
            size_bytes: None,
            content_type: None,
            status: AssetStatus::Uploading,
            playback_url: None,
            ready_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition to Processing (a transcode job was created).
    pub fn processing(mut self) -> Self {
        self.status = AssetStatus::Processing;
        self.updated_at = Utc::now();
        self
    }

    /// Transition to Ready with a playback URL.
    pub fn ready(mut self, playback_url: impl Into<String>) -> Self {
        self.status = AssetStatus::Ready;
        self.playback_url = Some(playback_url.into());
        self.ready_at = Some(Utc::now());
        self.updated_at = Utc::now();
        self
    }

    /// Transition to Failed. Clears the playback URL to keep the
    /// status/playback invariant.
    pub fn failed(mut self) -> Self {
        self.status = AssetStatus::Failed;
        self.playback_url = None;
        self.updated_at = Utc::now();
        self
    }
}
