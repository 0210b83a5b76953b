//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use discovery::domain::DiscoveryConfig;
use discovery::settings::DiscoverySettings;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) discovery: DiscoveryConfig,
    pub(crate) listings_path: Option<PathBuf>,
    pub(crate) events_path: Option<PathBuf>,
    pub(crate) proximity_index: bool,
    pub(crate) cache_capacity: usize,
    pub(crate) sweep_interval: Duration,
    pub(crate) search_event_capacity: usize,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Construct a server configuration from loaded settings.
    #[must_use]
    pub fn from_settings(settings: &DiscoverySettings) -> Self {
        Self {
            bind_addr: settings.bind_addr(),
            discovery: settings.discovery_config(),
            listings_path: settings.listings_path.clone(),
            events_path: settings.events_path.clone(),
            proximity_index: settings.proximity_index,
            cache_capacity: settings.cache_capacity(),
            sweep_interval: settings.sweep_interval(),
            search_event_capacity: settings.search_event_capacity(),
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    /// Override the socket address the server binds to.
    #[cfg_attr(
        not(test),
        expect(dead_code, reason = "Tests bind to an ephemeral port")
    )]
    #[must_use]
    pub fn with_bind_addr(mut self, bind_addr: SocketAddr) -> Self {
        self.bind_addr = bind_addr;
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware to the configuration.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}
