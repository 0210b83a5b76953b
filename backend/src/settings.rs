//! Service configuration loaded via OrthoConfig.
//!
//! Values come from `DISCOVERY_*` environment variables, CLI flags or a
//! configuration file. Every field is optional; accessors fall back to the
//! defaults the engine and adapters ship with.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::DiscoveryConfig;
use crate::domain::geo::MAX_GEOHASH_PRECISION;
use crate::outbound::cache::DEFAULT_CACHE_CAPACITY;
use crate::outbound::queue::DEFAULT_SEARCH_EVENT_CAPACITY;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Configuration values for the discovery service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "DISCOVERY")]
pub struct DiscoverySettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<SocketAddr>,
    /// JSON array of listing projections used to seed the listing store.
    pub listings_path: Option<PathBuf>,
    /// JSON array of activity events used to seed the event log.
    pub events_path: Option<PathBuf>,
    /// Whether the listing store answers proximity queries natively.
    #[ortho_config(default = true)]
    pub proximity_index: bool,
    /// Maximum number of cached responses.
    pub cache_capacity: Option<usize>,
    /// Feed cache lifetime in seconds.
    pub feed_ttl_secs: Option<u64>,
    /// Cluster cache lifetime in seconds.
    pub cluster_ttl_secs: Option<u64>,
    /// Hotspot and trending cache lifetime in seconds.
    pub trend_ttl_secs: Option<u64>,
    /// Interval between expired-entry sweeps in seconds.
    pub sweep_interval_secs: Option<u64>,
    /// Listings examined by a fallback scan.
    pub fallback_scan_cap: Option<usize>,
    /// Opportunity score reported for demand without supply.
    pub opportunity_ceiling: Option<f64>,
    /// Geohash length used to key hotspot cells.
    pub hotspot_precision: Option<usize>,
    /// Buffered search events before new ones are dropped.
    pub search_event_capacity: Option<usize>,
}

impl DiscoverySettings {
    /// Return the bind address, defaulting to `0.0.0.0:8080`.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
            .unwrap_or_else(|| SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)))
    }

    /// Return the listing fixture path, if configured.
    #[must_use]
    pub fn listings_path(&self) -> Option<&Path> {
        self.listings_path.as_deref()
    }

    /// Return the event fixture path, if configured.
    #[must_use]
    pub fn events_path(&self) -> Option<&Path> {
        self.events_path.as_deref()
    }

    /// Return the cache capacity.
    #[must_use]
    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity.unwrap_or(DEFAULT_CACHE_CAPACITY)
    }

    /// Return the sweep interval. Zero is lifted to one second.
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(
            self.sweep_interval_secs
                .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS)
                .max(1),
        )
    }

    /// Return the search event channel capacity.
    #[must_use]
    pub fn search_event_capacity(&self) -> usize {
        self.search_event_capacity
            .unwrap_or(DEFAULT_SEARCH_EVENT_CAPACITY)
    }

    /// Build engine tunables, keeping defaults for unset values.
    #[must_use]
    pub fn discovery_config(&self) -> DiscoveryConfig {
        let defaults = DiscoveryConfig::default();
        DiscoveryConfig {
            feed_ttl: self
                .feed_ttl_secs
                .map_or(defaults.feed_ttl, Duration::from_secs),
            cluster_ttl: self
                .cluster_ttl_secs
                .map_or(defaults.cluster_ttl, Duration::from_secs),
            trend_ttl: self
                .trend_ttl_secs
                .map_or(defaults.trend_ttl, Duration::from_secs),
            fallback_scan_cap: self
                .fallback_scan_cap
                .unwrap_or(defaults.fallback_scan_cap),
            opportunity_ceiling: self
                .opportunity_ceiling
                .filter(|ceiling| ceiling.is_finite() && *ceiling > 0.0)
                .unwrap_or(defaults.opportunity_ceiling),
            hotspot_precision: self
                .hotspot_precision
                .filter(|precision| (1..=MAX_GEOHASH_PRECISION).contains(precision))
                .unwrap_or(defaults.hotspot_precision),
        }
    }
}
