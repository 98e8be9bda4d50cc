//! Shared data models for the vodkit transcode pipeline.
//!
//! This crate provides serde-serializable types for:
//! - Assets (source media items) and their lifecycle status
//! - Transcode jobs and the job state machine
//! - Rendition variants produced by successful jobs
//! - The rendition ladder configuration
//! - Transcode results handed from the transcoder to the dispatcher

pub mod asset;
pub mod job;
pub mod ladder;
pub mod transcode;
pub mod variant;

// Re-export common types
pub use asset::{Asset, AssetId, AssetStatus};
pub use job::{JobId, JobStatus, TranscodeJob};
pub use ladder::{RenditionLadder, RenditionTier};
pub use transcode::{TranscodeResult, VariantDescriptor};
pub use variant::Variant;
