//! Geospatial discovery engine for a classifieds marketplace.
//!
//! The crate follows a hexagonal layout: [`domain`] holds the discovery rules
//! and ports, [`inbound`] exposes them over HTTP and [`outbound`] provides the
//! in-memory stores, result cache, search-event queue and metrics adapters.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
