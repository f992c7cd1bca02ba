//! Artifact store seam and S3 implementation.
//!
//! One artifact is written per run, named `<appName>.py`, overwriting
//! any previous object of the same name. A storage failure aborts the
//! run; no read-back verification is performed after the write.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use sparkjob_core::config::{LinkConfig, StorageParameters};
use sparkjob_core::error::RunError;

use crate::link::{native_object_uri, ArtifactLink};

/// Failures talking to the artifact store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The artifact write failed (auth, quota, transport).
    #[error("Artifact upload of '{object_name}' failed: {message}")]
    Upload {
        object_name: String,
        message: String,
    },

    /// Access-link generation failed.
    #[error("Failed to generate access link for '{object_name}': {message}")]
    Link {
        object_name: String,
        message: String,
    },
}

impl From<StorageError> for RunError {
    fn from(e: StorageError) -> Self {
        RunError::User(e.to_string())
    }
}

/// Write access to the artifact store plus link generation.
///
/// The orchestrator is generic over this trait; tests swap in an
/// in-memory store.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persist the packaged script under `object_name`, overwriting
    /// any existing object.
    async fn put(&self, object_name: &str, bytes: Vec<u8>) -> Result<(), StorageError>;

    /// Produce the access link the remote compute service uses to
    /// fetch the artifact.
    async fn link(&self, object_name: &str) -> Result<ArtifactLink, StorageError>;
}

#[async_trait]
impl<T: ArtifactStore> ArtifactStore for std::sync::Arc<T> {
    async fn put(&self, object_name: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        (**self).put(object_name, bytes).await
    }

    async fn link(&self, object_name: &str) -> Result<ArtifactLink, StorageError> {
        (**self).link(object_name).await
    }
}

/// S3-backed artifact store.
pub struct S3ArtifactStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    endpoint: Option<String>,
    link: LinkConfig,
}

impl S3ArtifactStore {
    /// Build a store from the configured storage parameters.
    ///
    /// Credentials come from the ambient AWS provider chain; region
    /// and endpoint come from the config when set.
    pub async fn from_config(storage: &StorageParameters) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &storage.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &storage.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: aws_sdk_s3::Client::from_conf(builder.build()),
            bucket: storage.bucket.clone(),
            endpoint: storage.endpoint.clone(),
            link: storage.link.clone(),
        }
    }
}

#[async_trait]
impl ArtifactStore for S3ArtifactStore {
    async fn put(&self, object_name: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(object_name)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                object_name: object_name.to_string(),
                message: e.to_string(),
            })?;

        tracing::info!(
            bucket = %self.bucket,
            object_name,
            size_bytes = size,
            "Artifact uploaded",
        );
        Ok(())
    }

    async fn link(&self, object_name: &str) -> Result<ArtifactLink, StorageError> {
        match &self.link {
            LinkConfig::SignedUrl { expiry_hours } => {
                let expires_in = Duration::from_secs(expiry_hours * 3600);
                let presigning =
                    PresigningConfig::expires_in(expires_in).map_err(|e| StorageError::Link {
                        object_name: object_name.to_string(),
                        message: e.to_string(),
                    })?;
                let presigned = self
                    .client
                    .get_object()
                    .bucket(&self.bucket)
                    .key(object_name)
                    .presigned(presigning)
                    .await
                    .map_err(|e| StorageError::Link {
                        object_name: object_name.to_string(),
                        message: e.to_string(),
                    })?;

                tracing::debug!(object_name, expiry_hours, "Generated signed artifact link");
                Ok(ArtifactLink::bare(presigned.uri().to_string()))
            }
            LinkConfig::PresharedToken {
                token,
                override_key,
            } => {
                let uri = native_object_uri(self.endpoint.as_deref(), &self.bucket, object_name);
                tracing::debug!(object_name, %uri, "Using pre-shared token artifact link");
                Ok(ArtifactLink {
                    uri,
                    config_overrides: vec![(override_key.clone(), token.clone())],
                })
            }
        }
    }
}
