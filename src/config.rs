//! Connector configuration
//!
//! This module contains the configuration a Confluence connector is set up
//! with (deployment flavour, wiki base URL, credentials, HTTP tuning), loaded
//! from YAML or JSON, and the connection check run before a client is handed
//! out.

use crate::auth::AuthConfig;
use crate::confluence::ConfluenceClient;
use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig, RetryConfig};
use crate::types::Deployment;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

// ============================================================================
// Connector Config
// ============================================================================

/// Complete connector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Atlassian cloud (`true`) or server / data center (`false`)
    pub is_cloud: bool,

    /// Wiki base URL, e.g. `https://acme.atlassian.net/wiki`
    pub wiki_base: String,

    /// Credentials
    pub credentials: Credentials,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpSettings,
}

/// Connector credentials
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Account email (cloud only)
    #[serde(default, alias = "confluence_username")]
    pub username: Option<String>,

    /// API token (cloud) or personal access token (server)
    #[serde(alias = "confluence_access_token")]
    pub access_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Client-side request rate; `0` disables throttling
    #[serde(default = "default_rps")]
    pub requests_per_second: u32,

    /// Burst allowance for the client-side throttle
    #[serde(default = "default_burst")]
    pub burst_size: u32,

    /// Attempts per request while rate limited
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Wall-clock budget per request, retries included, in seconds
    #[serde(default = "default_retry_timeout")]
    pub retry_timeout_seconds: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            requests_per_second: default_rps(),
            burst_size: default_burst(),
            max_attempts: default_max_attempts(),
            retry_timeout_seconds: default_retry_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_rps() -> u32 {
    10
}

fn default_burst() -> u32 {
    10
}

fn default_max_attempts() -> u32 {
    5
}

fn default_retry_timeout() -> u64 {
    600
}

impl ConnectorConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse connector YAML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Failed to parse connector JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the fields a client cannot be built without
    pub fn validate(&self) -> Result<()> {
        if self.wiki_base.trim().is_empty() {
            return Err(Error::missing_field("wiki_base"));
        }
        let url = url::Url::parse(self.base_url())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "wiki_base must be an http(s) URL, got '{}'",
                self.wiki_base
            )));
        }
        if self.credentials.access_token.is_empty() {
            return Err(Error::missing_field("credentials.access_token"));
        }
        self.auth()?;
        Ok(())
    }

    /// Deployment flavour
    pub fn deployment(&self) -> Deployment {
        Deployment::from_is_cloud(self.is_cloud)
    }

    /// Wiki base without trailing slashes
    pub fn base_url(&self) -> &str {
        self.wiki_base.trim_end_matches('/')
    }

    /// Credentials in the shape the deployment expects
    pub fn auth(&self) -> Result<AuthConfig> {
        AuthConfig::for_deployment(
            self.deployment(),
            self.credentials.username.as_deref(),
            &self.credentials.access_token,
        )
    }

    /// Transport configuration
    pub fn http_client_config(&self) -> Result<HttpClientConfig> {
        let mut builder = HttpClientConfig::builder()
            .base_url(self.base_url())
            .timeout(Duration::from_secs(self.http.timeout_seconds))
            .auth(self.auth()?);

        builder = if self.http.requests_per_second == 0 {
            builder.no_rate_limit()
        } else {
            builder.rate_limit(RateLimiterConfig::new(
                self.http.requests_per_second,
                self.http.burst_size,
            ))
        };

        Ok(builder.build())
    }

    /// Retry configuration for production clients
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::builder()
            .max_attempts(self.http.max_attempts)
            .timeout(Duration::from_secs(self.http.retry_timeout_seconds))
            .build()
    }
}

/// Load a connector configuration file.
///
/// `.json` files are parsed as JSON, everything else as YAML.
pub fn load_config(path: impl AsRef<Path>) -> Result<ConnectorConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        Error::config(format!(
            "Failed to read config file '{}': {}",
            path.display(),
            e
        ))
    })?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        ConnectorConfig::from_json_str(&content)
    } else {
        ConnectorConfig::from_yaml_str(&content)
    }
}

// ============================================================================
// Connection check
// ============================================================================

/// Check that the configuration reaches a wiki with at least one visible
/// space.
///
/// Uses a low-retry client so bad credentials fail fast. Every failure is
/// reported as `Error::ConnectorValidation`.
pub async fn validate_connector_configuration(config: &ConnectorConfig) -> Result<()> {
    let probe = ConfluenceClient::new(
        config.http_client_config().map_err(into_validation)?,
        RetryConfig::minimal(),
        config.deployment(),
    )
    .map_err(into_validation)?;

    check_connection(&probe, config.base_url()).await
}

/// Probe `rest/api/space?limit=1` through an existing client
pub async fn check_connection(client: &ConfluenceClient, wiki_base: &str) -> Result<()> {
    let spaces = client.get_spaces(1).await.map_err(into_validation)?;

    let found = spaces
        .get("results")
        .and_then(|results| results.as_array())
        .is_some_and(|results| !results.is_empty());
    if !found {
        return Err(Error::validation(format!(
            "No spaces found at {wiki_base}! Check your credentials and wiki_base \
             and make sure is_cloud is set correctly."
        )));
    }

    debug!(wiki_base, "Connector configuration validated");
    Ok(())
}

/// Validate the configuration, then build the production client
pub async fn build_confluence_client(config: &ConnectorConfig) -> Result<ConfluenceClient> {
    validate_connector_configuration(config).await?;

    info!(
        wiki_base = config.base_url(),
        deployment = %config.deployment(),
        "Building Confluence client"
    );
    ConfluenceClient::new(
        config.http_client_config()?,
        config.retry_config(),
        config.deployment(),
    )
}

fn into_validation(err: Error) -> Error {
    match err {
        Error::ConnectorValidation { .. } => err,
        other => Error::validation(other.to_string()),
    }
}
