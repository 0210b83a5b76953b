//! Domain primitives, services and ports for geospatial discovery.
//!
//! Purpose: keep the discovery rules (distance, spatial candidate retrieval,
//! feed pagination, marker clustering, trend ranking) independent of HTTP,
//! storage and caching technology. Adapters plug in through [`ports`].
//!
//! Public surface:
//! - [`DomainError`] and [`ErrorCode`]: transport-agnostic failures.
//! - [`GeoPoint`], [`distance_km`], [`encode_geohash`]: geographic primitives.
//! - Query types ([`DiscoveryQuery`], [`ClusterQuery`], [`TrendQuery`],
//!   [`OverviewQuery`]) and their drafts.
//! - [`DiscoveryEngine`]: the [`ports::DiscoveryService`] implementation.

pub mod activity;
pub mod clustering;
pub mod discovery_engine;
pub mod error;
pub mod feed;
pub mod geo;
pub mod listing;
pub mod ports;
pub mod query;
pub mod spatial;
pub mod trace_id;
pub mod trends;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use self::activity::{
    ActivityEvent, EventBucket, EventCountQuery, EventGrouping, EventKind, GeoFilter, TimeWindow,
    group_events,
};
pub use self::clustering::{
    BASE_CELL_SIZE_KM, BASE_ZOOM, ClusterGrid, ClusterMarker, ClusterSet, cluster,
};
pub use self::discovery_engine::{
    DEFAULT_HOTSPOT_PRECISION, DiscoveryConfig, DiscoveryEngine, DiscoveryPorts,
};
pub use self::error::{DomainError, ErrorCode, ErrorValidationError};
pub use self::feed::{FeedCursor, FeedPage, assemble_feed};
pub use self::geo::{
    EARTH_RADIUS_KM, GeoPoint, GeoPointError, KM_PER_DEGREE, distance_km, encode_geohash,
};
pub use self::listing::{
    FeedItem, ListingCandidate, ListingId, ListingProjection, ListingStatus, ModerationStatus,
};
pub use self::query::{
    ClusterQuery, ClusterQueryDraft, DiscoveryQuery, DiscoveryQueryDraft,
    DiscoveryValidationError, ListingFilters, OverviewQuery, OverviewQueryDraft, SortBy,
    TrendQuery, TrendQueryDraft,
};
pub use self::spatial::{
    DEFAULT_FALLBACK_SCAN_CAP, QueryMode, SpatialCandidates, SpatialQueryAdapter, post_filter,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::trends::{
    DEFAULT_OPPORTUNITY_CEILING, RankingSpec, TrendKind, TrendSignal, UnknownTrendKind,
    opportunity_score, rank_counts, rank_opportunity,
};

/// Convenient result alias for domain and adapter code.
///
/// # Examples
/// ```
/// use discovery::domain::{ApiResult, DomainError};
///
/// fn handler() -> ApiResult<()> {
///     Err(DomainError::not_found("no such listing"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, DomainError>;
