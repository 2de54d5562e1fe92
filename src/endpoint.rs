//! Backend endpoint discovery and caching.
//!
//! The processing backend's base URL is not static configuration — it is
//! looked up at runtime through a discovery call and cached for the lifetime
//! of the process. [`EndpointResolver`] owns that cache explicitly (injected
//! where needed, never module-level state) and layers two behaviours on top:
//!
//! * **Single-flight resolution** — many operations starting concurrently on
//!   a cold cache would otherwise each issue their own discovery call. The
//!   resolver holds an in-flight guard so exactly one lookup runs; the rest
//!   wait and read the freshly cached value.
//! * **Invalidate-and-retry** — a transport failure against a cached URL
//!   usually means the backend moved. [`EndpointResolver::with_retry`] clears
//!   the cache, re-resolves, and reruns the call exactly once more before
//!   propagating.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::IngestError;

/// The zero-argument backend lookup.
///
/// Injected as a trait object so tests can fake the discovery service; the
/// production implementation is [`HttpDiscovery`].
#[async_trait]
pub trait Discovery: Send + Sync {
    /// Return the backend base URL.
    async fn api_base(&self) -> Result<String, IngestError>;
}

/// Wire shape of the discovery response.
#[derive(Debug, Deserialize)]
struct DiscoveryDoc {
    #[serde(rename = "apiBase")]
    api_base: Option<String>,
}

/// HTTP implementation of [`Discovery`]: `GET` the configured discovery URL
/// and read `apiBase` out of the JSON response.
pub struct HttpDiscovery {
    http: reqwest::Client,
    url: String,
}

impl HttpDiscovery {
    pub fn new(config: &ClientConfig) -> Result<Self, IngestError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| IngestError::Internal(e.to_string()))?;
        Ok(Self {
            http,
            url: config.discovery_url.clone(),
        })
    }
}

#[async_trait]
impl Discovery for HttpDiscovery {
    async fn api_base(&self) -> Result<String, IngestError> {
        let response = self.http.get(&self.url).send().await.map_err(|e| {
            IngestError::ConfigUnavailable {
                detail: e.to_string(),
            }
        })?;

        if !response.status().is_success() {
            return Err(IngestError::ConfigUnavailable {
                detail: format!("discovery returned HTTP {}", response.status()),
            });
        }

        let doc: DiscoveryDoc =
            response
                .json()
                .await
                .map_err(|e| IngestError::ConfigUnavailable {
                    detail: format!("discovery response was not valid JSON: {e}"),
                })?;

        // A 2xx body without apiBase is still a discovery failure.
        doc.api_base
            .filter(|base| !base.is_empty())
            .ok_or_else(|| IngestError::ConfigUnavailable {
                detail: "discovery response is missing apiBase".into(),
            })
    }
}

/// Process-lifetime cache of the backend base URL.
///
/// Empty at start; populated on first successful [`resolve`](Self::resolve);
/// cleared only by [`invalidate`](Self::invalidate). The cached value never
/// expires on its own.
pub struct EndpointResolver {
    discovery: Arc<dyn Discovery>,
    cached: Mutex<Option<String>>,
    /// In-flight guard: held across the discovery call so concurrent cold
    /// resolutions collapse into one lookup.
    flight: tokio::sync::Mutex<()>,
}

impl EndpointResolver {
    pub fn new(discovery: Arc<dyn Discovery>) -> Self {
        Self {
            discovery,
            cached: Mutex::new(None),
            flight: tokio::sync::Mutex::new(()),
        }
    }

    /// Resolve the backend base URL, from cache when possible.
    ///
    /// # Errors
    /// [`IngestError::ConfigUnavailable`] when the discovery call fails and
    /// no cached value exists.
    pub async fn resolve(&self) -> Result<String, IngestError> {
        if let Some(base) = self.cached.lock().unwrap().clone() {
            return Ok(base);
        }

        let _guard = self.flight.lock().await;

        // Another caller may have resolved while we waited for the guard.
        if let Some(base) = self.cached.lock().unwrap().clone() {
            return Ok(base);
        }

        debug!("endpoint cache cold, running discovery");
        let base = self.discovery.api_base().await?;
        info!("resolved backend endpoint: {}", base);
        *self.cached.lock().unwrap() = Some(base.clone());
        Ok(base)
    }

    /// Clear the cached endpoint unconditionally; the next
    /// [`resolve`](Self::resolve) performs a fresh discovery call.
    pub fn invalidate(&self) {
        debug!("endpoint cache invalidated");
        *self.cached.lock().unwrap() = None;
    }

    /// Run `action` against the resolved endpoint, invalidating and retrying
    /// exactly once on a transport-classified failure.
    ///
    /// Non-transport failures (an explicit backend rejection, a quota denial)
    /// propagate immediately without touching the cache.
    pub async fn with_retry<T, F, Fut>(&self, mut action: F) -> Result<T, IngestError>
    where
        F: FnMut(String) -> Fut,
        Fut: std::future::Future<Output = Result<T, IngestError>>,
    {
        let base = self.resolve().await?;
        match action(base).await {
            Ok(value) => Ok(value),
            Err(e) if e.is_transport() => {
                warn!("transport failure against cached endpoint, re-resolving once: {e}");
                self.invalidate();
                let base = self.resolve().await?;
                action(base).await
            }
            Err(e) => Err(e),
        }
    }
}
