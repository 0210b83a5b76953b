//! Builders wiring outbound adapters into the discovery engine.

use std::io;
use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;
use tracing::info;

use discovery::domain::ports::{DiscoveryMetrics, EventLog, ListingRepository, NoOpDiscoveryMetrics};
use discovery::domain::{DiscoveryEngine, DiscoveryPorts};
use discovery::inbound::http::state::HttpState;
use discovery::outbound::cache::InMemoryResultCache;
use discovery::outbound::memory::{InMemoryEventLog, InMemoryListingRepository};
#[cfg(feature = "metrics")]
use discovery::outbound::metrics::PrometheusDiscoveryMetrics;
use discovery::outbound::queue::{ChannelSearchEventSink, SearchEventWorker};

use super::ServerConfig;

/// Adapters and background work produced while wiring the engine.
pub(super) struct DiscoveryRuntime {
    pub(super) http_state: web::Data<HttpState>,
    pub(super) cache: Arc<InMemoryResultCache>,
    pub(super) worker: SearchEventWorker,
}

fn build_listing_store(config: &ServerConfig) -> io::Result<Arc<dyn ListingRepository>> {
    let store = match &config.listings_path {
        Some(path) => InMemoryListingRepository::from_fixture(path, config.proximity_index)
            .map_err(io::Error::other)?,
        None => InMemoryListingRepository::new(Vec::new(), config.proximity_index),
    };
    info!(
        proximity_index = config.proximity_index,
        seeded = config.listings_path.is_some(),
        "listing store ready"
    );
    Ok(Arc::new(store))
}

fn build_event_log(config: &ServerConfig) -> io::Result<Arc<dyn EventLog>> {
    let log = match &config.events_path {
        Some(path) => InMemoryEventLog::from_fixture(path).map_err(io::Error::other)?,
        None => InMemoryEventLog::default(),
    };
    Ok(Arc::new(log))
}

/// Build discovery metrics, registering Prometheus collectors when a registry
/// is available.
///
/// # Errors
/// Returns [`io::Error`] if Prometheus metric registration fails.
#[cfg(feature = "metrics")]
fn build_metrics(config: &ServerConfig) -> io::Result<Arc<dyn DiscoveryMetrics>> {
    match &config.prometheus {
        Some(prom) => {
            let metrics = PrometheusDiscoveryMetrics::new(&prom.registry).map_err(|e| {
                io::Error::other(format!("discovery metrics registration failed: {e}"))
            })?;
            Ok(Arc::new(metrics))
        }
        None => Ok(Arc::new(NoOpDiscoveryMetrics)),
    }
}

#[cfg(not(feature = "metrics"))]
#[expect(
    clippy::unnecessary_wraps,
    reason = "Signature matches the metrics-enabled builder"
)]
fn build_metrics(_config: &ServerConfig) -> io::Result<Arc<dyn DiscoveryMetrics>> {
    Ok(Arc::new(NoOpDiscoveryMetrics))
}

/// Seed the stores, build the engine and wrap it for the HTTP layer.
///
/// # Errors
/// Returns [`io::Error`] when a fixture cannot be loaded or metrics cannot be
/// registered.
pub(super) fn build_runtime(config: &ServerConfig) -> io::Result<DiscoveryRuntime> {
    let listings = build_listing_store(config)?;
    let events = build_event_log(config)?;
    let metrics = build_metrics(config)?;
    let clock = Arc::new(DefaultClock);
    let cache = Arc::new(InMemoryResultCache::new(
        config.cache_capacity,
        clock.clone(),
    ));
    let (search_events, worker) =
        ChannelSearchEventSink::channel(config.search_event_capacity, events.clone());

    let engine = DiscoveryEngine::new(
        DiscoveryPorts {
            listings,
            events,
            cache: cache.clone(),
            search_events: Arc::new(search_events),
            metrics,
            clock,
        },
        config.discovery.clone(),
    );

    Ok(DiscoveryRuntime {
        http_state: web::Data::new(HttpState::new(Arc::new(engine))),
        cache,
        worker,
    })
}
