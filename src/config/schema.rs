//! Configuration schema definitions.
//!
//! The resolved configuration is a plain value: built once by the loader,
//! then only read by the cache wiring, the listener and the metrics exporter.

use std::path::PathBuf;

/// Default listen address, all interfaces on port 8080.
pub const DEFAULT_LISTEN_ADDRESS: &str = ":8080";

/// Bytes per configured cache megabyte.
pub const BYTES_PER_MEGABYTE: u64 = 1024 * 1024;

/// Root configuration for the module proxy server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// TCP listen address (`host:port` or `:port`).
    pub listen_address: String,

    /// Directory used for the persistent disk cache, if enabled.
    pub cache_dir: Option<PathBuf>,

    /// Upper bound for the disk cache, in bytes. Zero means unbounded.
    pub cache_max_bytes: u64,

    /// Address of the Prometheus scrape endpoint, if enabled.
    pub metrics_address: Option<String>,
}

impl ProxyConfig {
    /// Build a configuration from the raw option values.
    ///
    /// Empty strings disable the optional features, matching how an unset
    /// environment variable behaves.
    pub fn new(
        listen_address: impl Into<String>,
        cache_dir: &str,
        cache_max_megabytes: u64,
        metrics_address: &str,
    ) -> Self {
        Self {
            listen_address: listen_address.into(),
            cache_dir: non_empty(cache_dir).map(PathBuf::from),
            cache_max_bytes: cache_max_megabytes.saturating_mul(BYTES_PER_MEGABYTE),
            metrics_address: non_empty(metrics_address).map(str::to_string),
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self::new(DEFAULT_LISTEN_ADDRESS, "", 0, "")
    }
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}
