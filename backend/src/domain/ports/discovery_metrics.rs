//! Domain port for discovery observability.
//!
//! Implementations may export to Prometheus or discard everything. Failures
//! are logged by callers and never affect responses.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors exposed when recording discovery metrics.
    pub enum DiscoveryMetricsError {
        /// Metric exporter rejected the write.
        Export { message: String } => "discovery metrics exporter failed: {message}",
    }
}

/// Outcome of a result cache lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// A live entry was returned.
    Hit,
    /// Nothing usable was stored.
    Miss,
    /// The cache failed and the lookup fell through.
    Error,
}

impl CacheOutcome {
    /// Metric label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
            Self::Error => "error",
        }
    }
}

/// Recording port for discovery metrics.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiscoveryMetrics: Send + Sync {
    /// Record a result cache lookup for `endpoint`.
    async fn record_cache_lookup(
        &self,
        endpoint: &str,
        outcome: CacheOutcome,
    ) -> Result<(), DiscoveryMetricsError>;

    /// Record a composite-response section that degraded to empty.
    async fn record_degraded_section(&self, section: &str) -> Result<(), DiscoveryMetricsError>;

    /// Record a spatial query served by the capped fallback scan.
    async fn record_fallback_scan(&self) -> Result<(), DiscoveryMetricsError>;
}

/// No-op implementation for when metrics are disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpDiscoveryMetrics;

#[async_trait]
impl DiscoveryMetrics for NoOpDiscoveryMetrics {
    async fn record_cache_lookup(
        &self,
        _endpoint: &str,
        _outcome: CacheOutcome,
    ) -> Result<(), DiscoveryMetricsError> {
        Ok(())
    }

    async fn record_degraded_section(&self, _section: &str) -> Result<(), DiscoveryMetricsError> {
        Ok(())
    }

    async fn record_fallback_scan(&self) -> Result<(), DiscoveryMetricsError> {
        Ok(())
    }
}
