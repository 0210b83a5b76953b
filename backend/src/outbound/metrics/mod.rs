//! Outbound adapters for metrics exporting.
//!
//! Prometheus-backed implementations of domain metrics ports. Everything here
//! is feature-gated behind the `metrics` feature.

mod prometheus_discovery;

pub use prometheus_discovery::PrometheusDiscoveryMetrics;
