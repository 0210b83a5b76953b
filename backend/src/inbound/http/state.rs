//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on the discovery driving port and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{DiscoveryService, FixtureDiscoveryService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Discovery use-cases.
    pub discovery: Arc<dyn DiscoveryService>,
}

impl HttpState {
    /// Construct state from the discovery service.
    #[must_use]
    pub fn new(discovery: Arc<dyn DiscoveryService>) -> Self {
        Self { discovery }
    }
}

impl Default for HttpState {
    /// State backed by the fixture service, which returns empty results.
    fn default() -> Self {
        Self::new(Arc::new(FixtureDiscoveryService))
    }
}
