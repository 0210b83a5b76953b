//! Discovery engine implementing the [`DiscoveryService`] driving port.
//!
//! Requests arrive validated. The engine consults the result cache, asks the
//! spatial adapter or event log for raw material, and hands it to the feed,
//! clustering or trend modules. Cache trouble is logged and bypassed; store
//! and event log failures map onto domain errors.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::{join3, try_join};
use mockable::Clock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::activity::{
    ActivityEvent, EventBucket, EventCountQuery, EventGrouping, EventKind, GeoFilter, TimeWindow,
};
use super::clustering::{ClusterGrid, ClusterSet, cluster};
use super::error::DomainError;
use super::feed::{FeedCursor, FeedPage, assemble_feed};
use super::geo::GeoPoint;
use super::ports::{
    CacheOutcome, DiscoveryCacheKey, DiscoveryCacheKeyBuilder, DiscoveryMetrics,
    DiscoveryOverview, DiscoveryService, EventLog, EventLogError, ListingRepository,
    ListingRepositoryError, OverviewSection, ResultCache, SearchEventSink,
};
use super::query::{ClusterQuery, DiscoveryQuery, ListingFilters, OverviewQuery, TrendQuery};
use super::spatial::{
    DEFAULT_FALLBACK_SCAN_CAP, QueryMode, SpatialCandidates, SpatialQueryAdapter,
};
use super::trends::{
    DEFAULT_OPPORTUNITY_CEILING, RankingSpec, TrendKind, TrendSignal, rank_counts,
    rank_opportunity,
};

/// Geohash precision used to key hotspots unless configured otherwise.
pub const DEFAULT_HOTSPOT_PRECISION: usize = 5;

/// Tunables for [`DiscoveryEngine`].
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryConfig {
    /// Lifetime of cached feed pages.
    pub feed_ttl: Duration,
    /// Lifetime of cached cluster sets.
    pub cluster_ttl: Duration,
    /// Lifetime of cached hotspot and trending results.
    pub trend_ttl: Duration,
    /// Listings examined by a fallback scan.
    pub fallback_scan_cap: usize,
    /// Opportunity score for demand without supply.
    pub opportunity_ceiling: f64,
    /// Geohash length used for hotspot cells.
    pub hotspot_precision: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            feed_ttl: Duration::from_secs(30),
            cluster_ttl: Duration::from_secs(30),
            trend_ttl: Duration::from_secs(300),
            fallback_scan_cap: DEFAULT_FALLBACK_SCAN_CAP,
            opportunity_ceiling: DEFAULT_OPPORTUNITY_CEILING,
            hotspot_precision: DEFAULT_HOTSPOT_PRECISION,
        }
    }
}

/// Collaborators required by [`DiscoveryEngine`].
pub struct DiscoveryPorts<L: ?Sized, E: ?Sized> {
    /// Listing store.
    pub listings: Arc<L>,
    /// Activity event log.
    pub events: Arc<E>,
    /// Result cache.
    pub cache: Arc<dyn ResultCache>,
    /// Search event queue.
    pub search_events: Arc<dyn SearchEventSink>,
    /// Metrics recorder.
    pub metrics: Arc<dyn DiscoveryMetrics>,
    /// Time source for trend windows and search events.
    pub clock: Arc<dyn Clock>,
}

/// Discovery service over a listing store and an event log.
pub struct DiscoveryEngine<L: ?Sized, E: ?Sized> {
    spatial: SpatialQueryAdapter<L>,
    events: Arc<E>,
    cache: Arc<dyn ResultCache>,
    search_events: Arc<dyn SearchEventSink>,
    metrics: Arc<dyn DiscoveryMetrics>,
    clock: Arc<dyn Clock>,
    config: DiscoveryConfig,
}

fn map_listing_error(err: ListingRepositoryError) -> DomainError {
    match err {
        ListingRepositoryError::Connection { message } => {
            DomainError::service_unavailable(format!("listing store unavailable: {message}"))
        }
        ListingRepositoryError::Query { message }
        | ListingRepositoryError::ProximityUnsupported { message } => {
            DomainError::internal(format!("listing store error: {message}"))
        }
    }
}

fn map_event_log_error(err: EventLogError) -> DomainError {
    match err {
        EventLogError::Connection { message } => {
            DomainError::service_unavailable(format!("event log unavailable: {message}"))
        }
        EventLogError::Query { message } | EventLogError::Write { message } => {
            DomainError::internal(format!("event log error: {message}"))
        }
    }
}

fn with_filters(
    builder: DiscoveryCacheKeyBuilder,
    filters: &ListingFilters,
) -> DiscoveryCacheKeyBuilder {
    builder
        .optional("categoryId", filters.category_id.as_deref())
        .optional("subcategoryId", filters.subcategory_id.as_deref())
        .optional("priceMin", filters.price_min)
        .optional("priceMax", filters.price_max)
}

fn viewport(
    endpoint: &'static str,
    center: GeoPoint,
    radius_km: f64,
) -> DiscoveryCacheKeyBuilder {
    DiscoveryCacheKey::builder(endpoint)
        .coordinate("lat", center.lat)
        .coordinate("lng", center.lng)
        .number("radiusKm", radius_km)
}

fn feed_key(query: &DiscoveryQuery) -> Result<DiscoveryCacheKey, DomainError> {
    let cursor = query
        .cursor
        .as_ref()
        .map(FeedCursor::encode)
        .transpose()
        .map_err(|err| DomainError::internal(format!("cursor encoding failed: {err}")))?;
    Ok(with_filters(viewport("feed", query.center, query.radius_km), &query.filters)
        .field("sortBy", query.sort_by)
        .field("limit", query.limit)
        .optional("cursor", cursor)
        .build())
}

fn cluster_key(query: &ClusterQuery) -> DiscoveryCacheKey {
    with_filters(viewport("clusters", query.center, query.radius_km), &query.filters)
        .field("zoom", query.zoom)
        .build()
}

fn trend_key(endpoint: &'static str, query: &TrendQuery) -> DiscoveryCacheKey {
    let prefix = match &query.scope {
        GeoFilter::GeohashPrefix(prefix) => Some(prefix.as_str()),
        GeoFilter::Radius { .. } => None,
    };
    viewport(endpoint, query.center, query.radius_km)
        .field("type", query.kind)
        .field("hours", query.window_hours)
        .field("limit", query.limit)
        .optional("geohashPrefix", prefix)
        .build()
}

impl<L, E> DiscoveryEngine<L, E>
where
    L: ListingRepository + ?Sized,
    E: EventLog + ?Sized,
{
    /// Build an engine from its collaborators and tunables.
    pub fn new(ports: DiscoveryPorts<L, E>, config: DiscoveryConfig) -> Self {
        let DiscoveryPorts {
            listings,
            events,
            cache,
            search_events,
            metrics,
            clock,
        } = ports;
        Self {
            spatial: SpatialQueryAdapter::new(listings, config.fallback_scan_cap),
            events,
            cache,
            search_events,
            metrics,
            clock,
            config,
        }
    }

    async fn record_cache_outcome(&self, endpoint: &str, outcome: CacheOutcome) {
        if let Err(err) = self.metrics.record_cache_lookup(endpoint, outcome).await {
            debug!(%err, endpoint, "failed to record cache metric");
        }
    }

    /// Serve from cache when possible, otherwise compute and store.
    async fn cached<T, F, Fut>(
        &self,
        endpoint: &'static str,
        key: DiscoveryCacheKey,
        ttl: Duration,
        compute: F,
    ) -> Result<T, DomainError>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, DomainError>> + Send,
    {
        let outcome = match self.cache.get(&key).await {
            Ok(Some(payload)) => match serde_json::from_str::<T>(&payload) {
                Ok(value) => {
                    self.record_cache_outcome(endpoint, CacheOutcome::Hit).await;
                    return Ok(value);
                }
                Err(err) => {
                    warn!(%err, %key, "discarding undecodable cache entry");
                    CacheOutcome::Error
                }
            },
            Ok(None) => CacheOutcome::Miss,
            Err(err) => {
                warn!(%err, %key, "result cache lookup failed; computing live");
                CacheOutcome::Error
            }
        };
        self.record_cache_outcome(endpoint, outcome).await;

        let value = compute().await?;
        match serde_json::to_string(&value) {
            Ok(payload) => {
                if let Err(err) = self.cache.put(&key, payload, ttl).await {
                    warn!(%err, %key, "result cache store failed");
                }
            }
            Err(err) => warn!(%err, %key, "failed to serialise result for caching"),
        }
        Ok(value)
    }

    async fn spatial_candidates(
        &self,
        center: GeoPoint,
        radius_km: f64,
        filters: &ListingFilters,
    ) -> Result<SpatialCandidates, DomainError> {
        let found = self
            .spatial
            .candidates(center, radius_km, filters)
            .await
            .map_err(map_listing_error)?;
        if found.mode == QueryMode::Fallback {
            if let Err(err) = self.metrics.record_fallback_scan().await {
                debug!(%err, "failed to record fallback scan metric");
            }
        }
        Ok(found)
    }

    async fn fetch_feed(&self, query: &DiscoveryQuery) -> Result<FeedPage, DomainError> {
        let key = feed_key(query)?;
        self.cached("feed", key, self.config.feed_ttl, || async {
            let found = self
                .spatial_candidates(query.center, query.radius_km, &query.filters)
                .await?;
            assemble_feed(
                found.candidates,
                query.sort_by,
                query.cursor.as_ref(),
                query.limit,
            )
            .map_err(|err| DomainError::internal(format!("cursor encoding failed: {err}")))
        })
        .await
    }

    async fn count(
        &self,
        kind: EventKind,
        query: &TrendQuery,
        window: TimeWindow,
        grouping: EventGrouping,
    ) -> Result<Vec<EventBucket>, DomainError> {
        let selection = EventCountQuery {
            kind,
            geo: query.scope.clone(),
            window,
            group_by: grouping,
        };
        self.events
            .count_events(&selection)
            .await
            .map_err(map_event_log_error)
    }

    async fn signals(
        &self,
        query: &TrendQuery,
        grouping: EventGrouping,
    ) -> Result<Vec<TrendSignal>, DomainError> {
        let window = TimeWindow::ending_at(self.clock.utc(), query.window_hours);
        let spec = RankingSpec {
            grouping,
            window_hours: query.window_hours,
            limit: query.limit,
        };
        match query.kind {
            TrendKind::Demand => {
                let buckets = self.count(EventKind::Search, query, window, grouping).await?;
                Ok(rank_counts(TrendKind::Demand, buckets, spec))
            }
            TrendKind::Supply => {
                let buckets = self
                    .count(EventKind::ListingPublished, query, window, grouping)
                    .await?;
                Ok(rank_counts(TrendKind::Supply, buckets, spec))
            }
            TrendKind::Opportunity => {
                let (demand, supply) = try_join(
                    self.count(EventKind::Search, query, window, grouping),
                    self.count(EventKind::ListingPublished, query, window, grouping),
                )
                .await?;
                Ok(rank_opportunity(
                    demand,
                    supply,
                    self.config.opportunity_ceiling,
                    spec,
                ))
            }
        }
    }

    async fn degrade<T: Default + Send>(
        &self,
        section: OverviewSection,
        result: Result<T, DomainError>,
        degraded: &mut Vec<OverviewSection>,
    ) -> T {
        match result {
            Ok(value) => value,
            Err(err) => {
                warn!(section = section.as_str(), error = %err, "overview section degraded");
                let recorded = self.metrics.record_degraded_section(section.as_str()).await;
                if let Err(metric_err) = recorded {
                    debug!(%metric_err, "failed to record degraded section metric");
                }
                degraded.push(section);
                T::default()
            }
        }
    }
}

#[async_trait]
impl<L, E> DiscoveryService for DiscoveryEngine<L, E>
where
    L: ListingRepository + ?Sized,
    E: EventLog + ?Sized,
{
    async fn feed(&self, query: DiscoveryQuery) -> Result<FeedPage, DomainError> {
        self.search_events.emit(ActivityEvent {
            kind: EventKind::Search,
            category_id: query.filters.category_id.clone(),
            location: query.center,
            occurred_at: self.clock.utc(),
        });
        self.fetch_feed(&query).await
    }

    async fn clusters(&self, query: ClusterQuery) -> Result<ClusterSet, DomainError> {
        let key = cluster_key(&query);
        self.cached("clusters", key, self.config.cluster_ttl, || async {
            let found = self
                .spatial_candidates(query.center, query.radius_km, &query.filters)
                .await?;
            let grid = ClusterGrid::for_zoom(query.zoom, query.center.lat);
            Ok(cluster(&found.candidates, &grid))
        })
        .await
    }

    async fn hotspots(&self, query: TrendQuery) -> Result<Vec<TrendSignal>, DomainError> {
        let key = trend_key("hotspots", &query);
        let grouping = EventGrouping::Geohash {
            precision: self.config.hotspot_precision,
        };
        self.cached("hotspots", key, self.config.trend_ttl, || {
            self.signals(&query, grouping)
        })
        .await
    }

    async fn trending(&self, query: TrendQuery) -> Result<Vec<TrendSignal>, DomainError> {
        let key = trend_key("trending", &query);
        self.cached("trending", key, self.config.trend_ttl, || {
            self.signals(&query, EventGrouping::Category)
        })
        .await
    }

    async fn overview(&self, query: OverviewQuery) -> Result<DiscoveryOverview, DomainError> {
        let feed_query = query.feed();
        let (feed, clusters, trending) = join3(
            self.fetch_feed(&feed_query),
            self.clusters(query.clusters()),
            self.trending(query.trending()),
        )
        .await;

        let mut degraded = Vec::new();
        let feed_page = self.degrade(OverviewSection::Feed, feed, &mut degraded).await;
        let cluster_set = self
            .degrade(OverviewSection::Clusters, clusters, &mut degraded)
            .await;
        let trending_signals = self
            .degrade(OverviewSection::Trending, trending, &mut degraded)
            .await;
        Ok(DiscoveryOverview {
            feed: feed_page,
            clusters: cluster_set.clusters,
            trending: trending_signals,
            degraded,
        })
    }
}

#[cfg(test)]
#[path = "discovery_engine_tests.rs"]
mod tests;
