//! Host identity: instance id and region of the current machine.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::error::HostError;
use crate::obs;

/// Resolves the identity of the host.
///
/// `instance_id` and `region` are independent: a failure of one says nothing
/// about the other. Implementations may cache internally, but callers must
/// not assume lookups are cheap.
#[async_trait]
pub trait HostIdentity: Send + Sync {
    async fn instance_id(&self) -> Result<String, HostError>;
    async fn region(&self) -> Result<String, HostError>;
}

const TOKEN_PATH: &str = "/latest/api/token";
const INSTANCE_ID_PATH: &str = "/latest/meta-data/instance-id";
const REGION_PATH: &str = "/latest/meta-data/placement/region";
const TOKEN_TTL_HEADER: &str = "X-aws-ec2-metadata-token-ttl-seconds";
const TOKEN_HEADER: &str = "X-aws-ec2-metadata-token";

/// Settings for [`MetadataServiceResolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostIdentityConfig {
    /// Base URL of the instance metadata service
    pub endpoint: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Static instance id; skips the metadata service when set
    pub instance_id_override: Option<String>,
    /// Static region; skips the metadata service when set
    pub region_override: Option<String>,
}

impl Default for HostIdentityConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://169.254.169.254".to_string(),
            timeout: Duration::from_millis(2000),
            instance_id_override: None,
            region_override: None,
        }
    }
}

/// Resolves host identity from static overrides or the instance metadata
/// service (session token first, falling back to unauthenticated requests).
#[derive(Debug, Clone)]
pub struct MetadataServiceResolver {
    client: reqwest::Client,
    config: HostIdentityConfig,
}

impl MetadataServiceResolver {
    pub fn new(config: HostIdentityConfig) -> Result<Self, HostError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| HostError::unavailable("client", e))?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    async fn session_token(&self) -> Option<String> {
        let response = self
            .client
            .put(self.url(TOKEN_PATH))
            .header(TOKEN_TTL_HEADER, "21600")
            .send()
            .await
            .and_then(|r| r.error_for_status());
        match response {
            Ok(r) => r.text().await.ok().filter(|t| !t.trim().is_empty()),
            Err(e) => {
                debug!(error = %e, "Metadata token request failed, continuing without token");
                None
            }
        }
    }

    async fn fetch(&self, attribute: &'static str, path: &str) -> Result<String, HostError> {
        let mut request = self.client.get(self.url(path));
        if let Some(token) = self.session_token().await {
            request = request.header(TOKEN_HEADER, token);
        }

        let body = request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| HostError::unavailable(attribute, e))?
            .text()
            .await
            .map_err(|e| HostError::unavailable(attribute, e))?;

        let value = body.trim();
        if value.is_empty() {
            return Err(HostError::unavailable(attribute, "empty response"));
        }
        Ok(value.to_string())
    }
}

#[async_trait]
impl HostIdentity for MetadataServiceResolver {
    async fn instance_id(&self) -> Result<String, HostError> {
        if let Some(id) = &self.config.instance_id_override {
            return Ok(id.clone());
        }
        self.fetch("instance_id", INSTANCE_ID_PATH).await
    }

    async fn region(&self) -> Result<String, HostError> {
        if let Some(region) = &self.config.region_override {
            return Ok(region.clone());
        }
        self.fetch("region", REGION_PATH).await
    }
}

/// Host identity as observed for one run. Each field is resolved separately.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HostContext {
    pub instance_id: Option<String>,
    pub region: Option<String>,
}

impl HostContext {
    /// Resolve both attributes; a failed lookup leaves only its own field empty.
    pub async fn resolve(host: &dyn HostIdentity) -> Self {
        let (instance_id, region) = tokio::join!(host.instance_id(), host.region());
        Self {
            instance_id: instance_id
                .map_err(|e| obs::emit_host_lookup_failed("instance_id", &e))
                .ok(),
            region: region.map_err(|e| obs::emit_host_lookup_failed("region", &e)).ok(),
        }
    }
}
