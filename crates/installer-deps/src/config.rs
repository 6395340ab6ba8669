//! Runtime configuration for the production adapters.

use std::path::PathBuf;
use std::time::Duration;

use crate::host::HostIdentityConfig;

/// Configuration shared by the production collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerConfig {
    pub host: HostIdentityConfig,
    /// Shell used for `aws:runShellScript` steps
    pub shell: PathBuf,
    /// Timeout for steps that do not declare `timeoutSeconds`
    pub step_timeout: Duration,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            host: HostIdentityConfig::default(),
            shell: PathBuf::from("/bin/sh"),
            step_timeout: Duration::from_secs(3600),
        }
    }
}

impl InstallerConfig {
    /// Load configuration from environment variables:
    /// - INSTALLER_METADATA_ENDPOINT (default: "http://169.254.169.254")
    /// - INSTALLER_METADATA_TIMEOUT_MS (default: 2000)
    /// - INSTALLER_INSTANCE_ID (optional static instance id)
    /// - INSTALLER_REGION (optional static region)
    /// - INSTALLER_SHELL (default: "/bin/sh")
    /// - INSTALLER_STEP_TIMEOUT_SECS (default: 3600)
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let mut config = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(endpoint) = non_empty("INSTALLER_METADATA_ENDPOINT") {
            config.host.endpoint = endpoint;
        }
        if let Some(ms) = non_empty("INSTALLER_METADATA_TIMEOUT_MS") {
            config.host.timeout = Duration::from_millis(parse_u64("INSTALLER_METADATA_TIMEOUT_MS", &ms)?);
        }
        config.host.instance_id_override = non_empty("INSTALLER_INSTANCE_ID");
        config.host.region_override = non_empty("INSTALLER_REGION");
        if let Some(shell) = non_empty("INSTALLER_SHELL") {
            config.shell = PathBuf::from(shell);
        }
        if let Some(secs) = non_empty("INSTALLER_STEP_TIMEOUT_SECS") {
            config.step_timeout = Duration::from_secs(parse_u64("INSTALLER_STEP_TIMEOUT_SECS", &secs)?);
        }
        Ok(config)
    }

    /// Set the metadata service endpoint
    pub fn with_metadata_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.host.endpoint = endpoint.into();
        self
    }

    /// Set a static instance id
    pub fn with_instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.host.instance_id_override = Some(instance_id.into());
        self
    }

    /// Set a static region
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.host.region_override = Some(region.into());
        self
    }

    /// Set the shell used for script steps
    pub fn with_shell(mut self, shell: impl Into<PathBuf>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Set the default step timeout
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("{} must be a non-negative integer, got {:?}", key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<InstallerConfig, String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        InstallerConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn test_defaults_without_env() {
        let config = load(&[]).unwrap();
        assert_eq!(config, InstallerConfig::default());
        assert_eq!(config.host.endpoint, "http://169.254.169.254");
        assert_eq!(config.shell, PathBuf::from("/bin/sh"));
    }

    #[test]
    fn test_env_overrides() {
        let config = load(&[
            ("INSTALLER_METADATA_ENDPOINT", "http://localhost:1338"),
            ("INSTALLER_METADATA_TIMEOUT_MS", "250"),
            ("INSTALLER_INSTANCE_ID", "i-123"),
            ("INSTALLER_REGION", "us-west-2"),
            ("INSTALLER_SHELL", "/bin/bash"),
            ("INSTALLER_STEP_TIMEOUT_SECS", "90"),
        ])
        .unwrap();

        assert_eq!(config.host.endpoint, "http://localhost:1338");
        assert_eq!(config.host.timeout, Duration::from_millis(250));
        assert_eq!(config.host.instance_id_override.as_deref(), Some("i-123"));
        assert_eq!(config.host.region_override.as_deref(), Some("us-west-2"));
        assert_eq!(config.shell, PathBuf::from("/bin/bash"));
        assert_eq!(config.step_timeout, Duration::from_secs(90));
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let config = load(&[("INSTALLER_REGION", "  ")]).unwrap();
        assert!(config.host.region_override.is_none());
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let err = load(&[("INSTALLER_STEP_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(err.contains("INSTALLER_STEP_TIMEOUT_SECS"));
    }

    #[test]
    fn test_builder_setters() {
        let config = InstallerConfig::default()
            .with_metadata_endpoint("http://imds")
            .with_instance_id("i-b")
            .with_region("sa-east-1")
            .with_shell("/usr/bin/dash")
            .with_step_timeout(Duration::from_secs(5));
        assert_eq!(config.host.endpoint, "http://imds");
        assert_eq!(config.host.instance_id_override.as_deref(), Some("i-b"));
        assert_eq!(config.host.region_override.as_deref(), Some("sa-east-1"));
        assert_eq!(config.shell, PathBuf::from("/usr/bin/dash"));
        assert_eq!(config.step_timeout, Duration::from_secs(5));
    }
}
