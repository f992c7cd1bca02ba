//! Run configuration.
//!
//! The whole configuration is an explicit struct handed to the
//! orchestrator; components never read ambient environment variables.
//! The JSON shape mirrors the platform's config file: user-level
//! `parameters` (the block tree, app name base) and deployment-level
//! `image_parameters` (API endpoint, token, configuration template,
//! storage account details).

use serde::Deserialize;
use validator::Validate;

use crate::error::ConfigError;
use crate::transformation::Block;

/// Default expiration for generator-issued signed links, in hours.
/// Long enough to cover expected job runtime.
pub const DEFAULT_LINK_EXPIRY_HOURS: u64 = 12;

fn default_link_expiry_hours() -> u64 {
    DEFAULT_LINK_EXPIRY_HOURS
}

fn default_app_name() -> String {
    "spark-transformation".into()
}

fn default_token_override_key() -> String {
    "storageAccessToken".into()
}

/// Complete run configuration, loaded once at startup.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Config {
    #[validate(nested)]
    pub parameters: Parameters,
    #[validate(nested)]
    pub image_parameters: ImageParameters,
}

/// User-supplied parameters: the transformation itself.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Parameters {
    /// Base application name; a per-run suffix is appended so every
    /// submission uses a unique `appName`.
    #[serde(default = "default_app_name")]
    #[validate(length(min = 1, message = "app name must not be empty"))]
    pub app_name: String,
    /// Ordered block tree holding the script fragments.
    #[validate(length(min = 1, message = "at least one block is required"), nested)]
    pub blocks: Vec<Block>,
}

/// Deployment-supplied parameters: remote service and storage account.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ImageParameters {
    /// Base URL of the Data Mechanics API.
    #[serde(rename = "dataMechanicsUrl")]
    #[validate(url(message = "dataMechanicsUrl must be a valid URL"))]
    pub api_url: String,
    /// API key sent with every request.
    #[serde(rename = "#dataMechanicsToken")]
    #[validate(length(min = 1, message = "API token must not be empty"))]
    pub api_token: String,
    /// Server-side configuration template the job is created from.
    #[serde(rename = "configurationTemplate")]
    #[validate(length(min = 1, message = "configuration template must not be empty"))]
    pub configuration_template: String,
    /// Artifact storage account details.
    #[validate(nested)]
    pub storage: StorageParameters,
}

/// Object-storage account the packaged script is written to.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StorageParameters {
    /// Bucket (container) receiving the artifact object.
    #[validate(length(min = 1, message = "storage bucket must not be empty"))]
    pub bucket: String,
    /// Storage region, when the account requires one.
    #[serde(default)]
    pub region: Option<String>,
    /// Custom endpoint for non-default deployments. Also used as the
    /// base of storage-native artifact URIs.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// How the remote runtime is given access to the artifact.
    #[serde(default)]
    pub link: LinkConfig,
}

/// Addressing scheme for the artifact access link.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum LinkConfig {
    /// Generator-issued signed URL with an explicit expiration.
    SignedUrl {
        #[serde(default = "default_link_expiry_hours")]
        expiry_hours: u64,
    },
    /// Storage-native URI plus an externally supplied access token,
    /// passed to the remote runtime as a configuration override. The
    /// token is never regenerated or rotated here.
    PresharedToken {
        #[serde(rename = "#token")]
        token: String,
        /// `configOverrides` key the token is injected under.
        #[serde(default = "default_token_override_key")]
        override_key: String,
    },
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig::SignedUrl {
            expiry_hours: DEFAULT_LINK_EXPIRY_HOURS,
        }
    }
}

impl Config {
    /// Load and validate a configuration from a JSON file.
    pub fn from_file(path: &str) -> Result<Config, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Config::from_json(&raw)
    }

    /// Parse and validate a configuration from a JSON string.
    pub fn from_json(raw: &str) -> Result<Config, ConfigError> {
        let config: Config = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }
}
