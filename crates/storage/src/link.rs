//! Access links to stored artifacts.
//!
//! The remote compute service fetches the artifact over one of two
//! addressing schemes: a generator-issued signed URL with an explicit
//! expiration, or a storage-native URI paired with a pre-shared token
//! that travels separately as a runtime configuration override.

/// A resolved artifact link.
///
/// `uri` goes into the job's `mainApplicationFile` override; any
/// entries in `config_overrides` are merged into the job's
/// `configOverrides` map alongside it (the pre-shared token scheme
/// uses this to hand the token to the remote runtime).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLink {
    pub uri: String,
    pub config_overrides: Vec<(String, String)>,
}

impl ArtifactLink {
    /// Link carrying no extra overrides (signed-URL scheme).
    pub fn bare(uri: String) -> Self {
        Self {
            uri,
            config_overrides: Vec::new(),
        }
    }
}

/// Build the storage-native URI for an object.
///
/// With a custom endpoint the URI is path-style
/// (`<endpoint>/<bucket>/<object>`); otherwise the runtime-native
/// `s3://<bucket>/<object>` form is used.
pub fn native_object_uri(endpoint: Option<&str>, bucket: &str, object_name: &str) -> String {
    match endpoint {
        Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, object_name),
        None => format!("s3://{}/{}", bucket, object_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_uri_without_endpoint_uses_s3_scheme() {
        assert_eq!(
            native_object_uri(None, "artifacts", "helloworld-1.py"),
            "s3://artifacts/helloworld-1.py"
        );
    }

    #[test]
    fn native_uri_with_endpoint_is_path_style() {
        assert_eq!(
            native_object_uri(Some("https://storage.example.com"), "artifacts", "app.py"),
            "https://storage.example.com/artifacts/app.py"
        );
    }

    #[test]
    fn endpoint_trailing_slash_is_not_doubled() {
        assert_eq!(
            native_object_uri(Some("https://storage.example.com/"), "artifacts", "app.py"),
            "https://storage.example.com/artifacts/app.py"
        );
    }

    #[test]
    fn bare_link_has_no_overrides() {
        let link = ArtifactLink::bare("s3://artifacts/app.py".into());
        assert!(link.config_overrides.is_empty());
    }
}
