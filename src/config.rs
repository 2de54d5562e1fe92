//! Client configuration.
//!
//! All client behaviour is controlled through [`ClientConfig`], built via its
//! [`ClientConfigBuilder`]. Keeping every knob in one struct makes it trivial
//! to share a config across tasks, serialise it for logging, and diff two
//! runs to understand why their outcomes differ.

use serde::{Deserialize, Serialize};

use crate::error::IngestError;

/// Configuration for a pagegate client.
///
/// Built via [`ClientConfig::builder()`].
///
/// # Example
/// ```rust
/// use pagegate::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .discovery_url("https://config.example.com/backend")
///     .request_timeout_secs(20)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// URL of the zero-argument endpoint-discovery lookup. Required.
    ///
    /// A successful response must carry `{"apiBase": "..."}`; a 2xx body
    /// without `apiBase` counts as a discovery failure.
    pub discovery_url: String,

    /// Timeout for each HTTP request (discovery and submission), in seconds.
    /// Default: 30.
    pub request_timeout_secs: u64,

    /// Number of files counted concurrently in a metering batch. Default: 4.
    ///
    /// Counting is CPU-bound and runs on the blocking thread pool; a small
    /// fan-out keeps large batches moving without saturating the pool.
    pub meter_concurrency: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            discovery_url: String::new(),
            request_timeout_secs: 30,
            meter_concurrency: 4,
        }
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn discovery_url(mut self, url: impl Into<String>) -> Self {
        self.config.discovery_url = url.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn meter_concurrency(mut self, n: usize) -> Self {
        self.config.meter_concurrency = n.max(1);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, IngestError> {
        let c = &self.config;
        if c.discovery_url.is_empty() {
            return Err(IngestError::InvalidConfig(
                "discovery_url must be set".into(),
            ));
        }
        if !c.discovery_url.starts_with("http://") && !c.discovery_url.starts_with("https://") {
            return Err(IngestError::InvalidConfig(format!(
                "discovery_url must be an HTTP/HTTPS URL, got '{}'",
                c.discovery_url
            )));
        }
        Ok(self.config)
    }
}
