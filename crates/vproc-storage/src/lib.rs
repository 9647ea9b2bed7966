//! Object store client for the transcoding pipeline.
//!
//! This crate provides:
//! - Raw-object download into the local incoming workspace
//! - Processed-object upload with public-read visibility
//! - Fail-fast bucket configuration
//!
//! Buckets are fixed configuration, never derived from job input.

pub mod client;
pub mod error;

pub use client::{StoreClient, StoreConfig};
pub use error::{StorageError, StorageResult};
