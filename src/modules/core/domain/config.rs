//! Connector configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{CqlError, Result};

/// Connection settings handed to the transport when a connector opens.
///
/// ```ignore
/// let config = ConnectorConfig::new(vec!["127.0.0.1:9042"])
///     .with_datacenter("datacenter1")
///     .with_keyspace("test");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Contact points (host:port pairs)
    pub contact_points: Vec<String>,

    /// Datacenter preferred by the load balancing policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_datacenter: Option<String>,

    /// Default keyspace, also used to qualify table handles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyspace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Connection timeout in seconds (default: 10)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_secs: Option<u64>,

    /// Request timeout in seconds (default: 30)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl ConnectorConfig {
    /// Create a configuration with the given contact points
    pub fn new<S: Into<String>>(contact_points: Vec<S>) -> Self {
        Self {
            contact_points: contact_points.into_iter().map(Into::into).collect(),
            local_datacenter: None,
            keyspace: None,
            username: None,
            password: None,
            connect_timeout_secs: None,
            request_timeout_secs: None,
        }
    }

    /// Parse a configuration from YAML
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| CqlError::Configuration(format!("Failed to parse YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration from JSON
    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_datacenter(mut self, datacenter: impl Into<String>) -> Self {
        self.local_datacenter = Some(datacenter.into());
        self
    }

    pub fn with_keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.keyspace = Some(keyspace.into());
        self
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = Some(secs);
        self
    }

    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    /// Get the keyspace
    pub fn keyspace(&self) -> Option<&str> {
        self.keyspace.as_deref()
    }

    /// Get connect timeout with default fallback
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.unwrap_or(10))
    }

    /// Get request timeout with default fallback
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(30))
    }

    /// Check the configuration for values no transport can use
    pub fn validate(&self) -> Result<()> {
        if self.contact_points.is_empty() {
            return Err(CqlError::Configuration(
                "At least one contact point is required".to_string(),
            ));
        }

        if let Some(point) = self.contact_points.iter().find(|p| p.trim().is_empty()) {
            return Err(CqlError::Configuration(format!(
                "Invalid contact point '{}'",
                point
            )));
        }

        if matches!(self.keyspace.as_deref(), Some("")) {
            return Err(CqlError::Configuration(
                "Keyspace name cannot be empty".to_string(),
            ));
        }

        if self.username.is_some() != self.password.is_some() {
            return Err(CqlError::Configuration(
                "Username and password must be set together".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self::new(vec!["127.0.0.1:9042"])
    }
}
