//! Prometheus adapter for discovery metrics.
//!
//! Counters are registered with a provided registry and exposed through the
//! `/metrics` endpoint served by `actix-web-prom`.

use async_trait::async_trait;
use prometheus::{IntCounter, IntCounterVec, Opts, Registry};

use crate::domain::ports::{CacheOutcome, DiscoveryMetrics, DiscoveryMetricsError};

/// Prometheus-backed discovery metrics recorder.
///
/// # Metric Specification
///
/// - `discovery_cache_lookups_total{endpoint, outcome}`: result cache lookups,
///   `outcome` is `hit`, `miss` or `error`.
/// - `discovery_degraded_sections_total{section}`: overview sections that
///   were replaced by an empty default.
/// - `discovery_fallback_scans_total`: spatial queries served by the capped
///   recency scan.
pub struct PrometheusDiscoveryMetrics {
    cache_lookups: IntCounterVec,
    degraded_sections: IntCounterVec,
    fallback_scans: IntCounter,
}

impl PrometheusDiscoveryMetrics {
    /// Create and register metrics with the given registry.
    ///
    /// # Errors
    ///
    /// Returns an error if a metric cannot be registered, for example when a
    /// metric with the same name already exists in the registry.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let cache_lookups = IntCounterVec::new(
            Opts::new(
                "discovery_cache_lookups_total",
                "Result cache lookups by endpoint and outcome",
            ),
            &["endpoint", "outcome"],
        )?;
        let degraded_sections = IntCounterVec::new(
            Opts::new(
                "discovery_degraded_sections_total",
                "Overview sections degraded to empty",
            ),
            &["section"],
        )?;
        let fallback_scans = IntCounter::new(
            "discovery_fallback_scans_total",
            "Spatial queries served by the fallback scan",
        )?;
        registry.register(Box::new(cache_lookups.clone()))?;
        registry.register(Box::new(degraded_sections.clone()))?;
        registry.register(Box::new(fallback_scans.clone()))?;
        Ok(Self {
            cache_lookups,
            degraded_sections,
            fallback_scans,
        })
    }
}

#[async_trait]
impl DiscoveryMetrics for PrometheusDiscoveryMetrics {
    async fn record_cache_lookup(
        &self,
        endpoint: &str,
        outcome: CacheOutcome,
    ) -> Result<(), DiscoveryMetricsError> {
        self.cache_lookups
            .get_metric_with_label_values(&[endpoint, outcome.as_str()])
            .map_err(|err| DiscoveryMetricsError::export(err.to_string()))?
            .inc();
        Ok(())
    }

    async fn record_degraded_section(&self, section: &str) -> Result<(), DiscoveryMetricsError> {
        self.degraded_sections
            .get_metric_with_label_values(&[section])
            .map_err(|err| DiscoveryMetricsError::export(err.to_string()))?
            .inc();
        Ok(())
    }

    async fn record_fallback_scan(&self) -> Result<(), DiscoveryMetricsError> {
        self.fallback_scans.inc();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn registers_all_metrics() {
        let registry = Registry::new();
        let metrics =
            PrometheusDiscoveryMetrics::new(&registry).expect("metric registration should succeed");
        metrics.fallback_scans.inc();
        metrics.cache_lookups.with_label_values(&["feed", "hit"]).inc();
        metrics.degraded_sections.with_label_values(&["trending"]).inc();

        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|family| family.name().to_owned())
            .collect();
        for expected in [
            "discovery_cache_lookups_total",
            "discovery_degraded_sections_total",
            "discovery_fallback_scans_total",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}");
        }
    }

    #[rstest]
    fn double_registration_fails() {
        let registry = Registry::new();
        PrometheusDiscoveryMetrics::new(&registry).expect("first registration");
        assert!(PrometheusDiscoveryMetrics::new(&registry).is_err());
    }

    #[rstest]
    #[tokio::test]
    async fn cache_lookups_are_labelled_by_endpoint_and_outcome() {
        let registry = Registry::new();
        let metrics =
            PrometheusDiscoveryMetrics::new(&registry).expect("metric registration should succeed");

        metrics
            .record_cache_lookup("feed", CacheOutcome::Miss)
            .await
            .expect("record");
        metrics
            .record_cache_lookup("feed", CacheOutcome::Miss)
            .await
            .expect("record");
        metrics
            .record_cache_lookup("clusters", CacheOutcome::Hit)
            .await
            .expect("record");

        let feed_misses = metrics.cache_lookups.with_label_values(&["feed", "miss"]);
        let cluster_hits = metrics.cache_lookups.with_label_values(&["clusters", "hit"]);
        assert_eq!(feed_misses.get(), 2);
        assert_eq!(cluster_hits.get(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn degraded_sections_and_fallback_scans_count() {
        let registry = Registry::new();
        let metrics =
            PrometheusDiscoveryMetrics::new(&registry).expect("metric registration should succeed");

        metrics
            .record_degraded_section("clusters")
            .await
            .expect("record");
        metrics.record_fallback_scan().await.expect("record");
        metrics.record_fallback_scan().await.expect("record");

        let degraded = metrics.degraded_sections.with_label_values(&["clusters"]);
        assert_eq!(degraded.get(), 1);
        assert_eq!(metrics.fallback_scans.get(), 2);
    }
}
