//! Outbound adapters implementing domain ports for infrastructure.
//!
//! - **cache**: in-process TTL and capacity bounded result cache
//! - **memory**: in-memory listing store and event log, seeded from fixtures
//! - **queue**: bounded channel feeding search events to the event log
//! - **metrics**: Prometheus-backed metrics exporters (feature-gated)
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations. They contain no discovery rules.

pub mod cache;
pub mod memory;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod queue;
