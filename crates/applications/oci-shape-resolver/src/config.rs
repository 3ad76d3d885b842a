//! Resolver and client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default timeout for a single remote call (milliseconds)
pub const DEFAULT_REMOTE_CALL_TIMEOUT_MS: u64 = 30_000;

/// Default HTTP request timeout for the OCI client (milliseconds)
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;

/// Default OCI region
pub const DEFAULT_REGION: &str = "us-ashburn-1";

/// What to do when listing the shape catalog fails
///
/// `TreatAsEmpty` keeps the long-standing behaviour: the failure is logged and
/// the pool ends up as "shape not found". `Propagate` surfaces the listing
/// error itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogErrorPolicy {
    #[default]
    TreatAsEmpty,
    Propagate,
}

/// Configuration for [`ShapeResolver`](crate::ShapeResolver)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Upper bound on each remote call (milliseconds)
    #[serde(default = "default_remote_call_timeout_ms")]
    pub remote_call_timeout_ms: u64,

    #[serde(default)]
    pub catalog_error_policy: CatalogErrorPolicy,
}

fn default_remote_call_timeout_ms() -> u64 {
    DEFAULT_REMOTE_CALL_TIMEOUT_MS
}

/// Whole milliseconds, rounding a non-zero sub-millisecond duration up to 1ms
fn duration_to_millis(timeout: Duration) -> u64 {
    let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
    if millis == 0 && !timeout.is_zero() { 1 } else { millis }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            remote_call_timeout_ms: DEFAULT_REMOTE_CALL_TIMEOUT_MS,
            catalog_error_policy: CatalogErrorPolicy::default(),
        }
    }
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-call timeout
    pub fn with_remote_call_timeout(mut self, timeout: Duration) -> Self {
        self.remote_call_timeout_ms = duration_to_millis(timeout);
        self
    }

    /// Set the catalog error policy
    pub fn with_catalog_error_policy(mut self, policy: CatalogErrorPolicy) -> Self {
        self.catalog_error_policy = policy;
        self
    }

    pub fn remote_call_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_call_timeout_ms)
    }
}

/// Configuration for [`OciComputeClient`](crate::OciComputeClient)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OciClientConfig {
    /// Core Services endpoint, e.g. `https://iaas.us-ashburn-1.oraclecloud.com`
    pub endpoint: String,

    /// HTTP request timeout (milliseconds)
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,
}

fn default_http_timeout_ms() -> u64 {
    DEFAULT_HTTP_TIMEOUT_MS
}

impl Default for OciClientConfig {
    fn default() -> Self {
        Self::for_region(DEFAULT_REGION)
    }
}

impl OciClientConfig {
    /// Endpoint for a region's Core Services API
    pub fn for_region(region: &str) -> Self {
        Self::with_endpoint(format!("https://iaas.{region}.oraclecloud.com"))
    }

    /// Explicit endpoint (proxies, tests)
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http_timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
        }
    }

    /// Set the HTTP request timeout
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout_ms = duration_to_millis(timeout);
        self
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolver_config_builder() {
        let config = ResolverConfig::new()
            .with_remote_call_timeout(Duration::from_secs(5))
            .with_catalog_error_policy(CatalogErrorPolicy::Propagate);

        assert_eq!(config.remote_call_timeout(), Duration::from_secs(5));
        assert_eq!(config.catalog_error_policy, CatalogErrorPolicy::Propagate);
    }

    #[test]
    fn test_resolver_config_defaults_from_partial_json() {
        let config: ResolverConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ResolverConfig::default());
        assert_eq!(config.catalog_error_policy, CatalogErrorPolicy::TreatAsEmpty);

        let config: ResolverConfig =
            serde_json::from_str(r#"{"catalog_error_policy": "propagate"}"#).unwrap();
        assert_eq!(config.catalog_error_policy, CatalogErrorPolicy::Propagate);
        assert_eq!(config.remote_call_timeout_ms, DEFAULT_REMOTE_CALL_TIMEOUT_MS);
    }

    #[test]
    fn test_sub_second_timeouts_are_kept() {
        let config = ResolverConfig::new().with_remote_call_timeout(Duration::from_millis(500));
        assert_eq!(config.remote_call_timeout(), Duration::from_millis(500));

        let config = ResolverConfig::new().with_remote_call_timeout(Duration::from_micros(200));
        assert_eq!(config.remote_call_timeout(), Duration::from_millis(1));

        let client = OciClientConfig::default().with_http_timeout(Duration::from_millis(750));
        assert_eq!(client.http_timeout(), Duration::from_millis(750));
        assert_eq!(client.http_timeout_ms, 750);
    }

    #[test]
    fn test_client_config_endpoint_from_region() {
        assert_eq!(
            OciClientConfig::for_region("eu-frankfurt-1").endpoint,
            "https://iaas.eu-frankfurt-1.oraclecloud.com"
        );
        assert_eq!(
            OciClientConfig::default().endpoint,
            "https://iaas.us-ashburn-1.oraclecloud.com"
        );
    }
}
