//! Object storage for the vodkit pipeline.
//!
//! This crate provides:
//! - The narrow [`ObjectStore`] contract the transcode core consumes
//! - An S3-compatible implementation (MinIO, AWS S3)
//! - Content-type guessing for HLS artifacts

pub mod client;
pub mod content_type;
pub mod error;
pub mod object_store;

pub use client::{S3Config, S3ObjectStore};
pub use content_type::guess_content_type;
pub use error::{StorageError, StorageResult};
pub use object_store::ObjectStore;
