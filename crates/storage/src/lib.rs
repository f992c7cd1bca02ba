//! Artifact storage for packaged scripts.
//!
//! Provides the [`ArtifactStore`] seam the orchestrator writes
//! through, an S3-backed implementation, and access-link generation
//! (presigned URL or storage-native URI plus pre-shared token).

pub mod artifact;
pub mod link;

pub use artifact::{ArtifactStore, S3ArtifactStore, StorageError};
pub use link::ArtifactLink;
