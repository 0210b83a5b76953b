//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod cache_key;
mod discovery_metrics;
mod discovery_service;
mod event_log;
mod listing_repository;
mod result_cache;
mod search_events;

pub use cache_key::{CACHE_KEY_NAMESPACE, DiscoveryCacheKey, DiscoveryCacheKeyBuilder};
#[cfg(test)]
pub use discovery_metrics::MockDiscoveryMetrics;
pub use discovery_metrics::{
    CacheOutcome, DiscoveryMetrics, DiscoveryMetricsError, NoOpDiscoveryMetrics,
};
#[cfg(test)]
pub use discovery_service::MockDiscoveryService;
pub use discovery_service::{
    DiscoveryOverview, DiscoveryService, FixtureDiscoveryService, OverviewSection,
};
#[cfg(test)]
pub use event_log::MockEventLog;
pub use event_log::{EventLog, EventLogError, FixtureEventLog};
#[cfg(test)]
pub use listing_repository::MockListingRepository;
pub use listing_repository::{
    FixtureListingRepository, ListingRepository, ListingRepositoryError,
};
#[cfg(test)]
pub use result_cache::MockResultCache;
pub use result_cache::{FixtureResultCache, ResultCache, ResultCacheError};
#[cfg(test)]
pub use search_events::MockSearchEventSink;
pub use search_events::{FixtureSearchEventSink, SearchEventSink};
