//! Driving port for geospatial discovery reads.
//!
//! Inbound adapters validate raw parameters into the query types from
//! [`crate::domain::query`] and call this port; they never talk to the
//! listing store or event log directly.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{
    ClusterMarker, ClusterQuery, ClusterSet, DiscoveryQuery, DomainError, FeedPage,
    OverviewQuery, TrendQuery, TrendSignal,
};

/// Section of the composite overview response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OverviewSection {
    /// First feed page.
    Feed,
    /// Map markers.
    Clusters,
    /// Trending searches.
    Trending,
}

impl OverviewSection {
    /// Wire and metric label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Feed => "feed",
            Self::Clusters => "clusters",
            Self::Trending => "trending",
        }
    }
}

/// Feed, clusters and trending searches for one viewport.
///
/// Sections that failed are empty and named in `degraded`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryOverview {
    /// First feed page, distance ordered.
    pub feed: FeedPage,
    /// Map markers.
    pub clusters: Vec<ClusterMarker>,
    /// Trending searches.
    pub trending: Vec<TrendSignal>,
    /// Sections that degraded to empty.
    pub degraded: Vec<OverviewSection>,
}

/// Driving port for discovery reads.
///
/// # Examples
///
/// ```rust,no_run
/// # async fn example() -> Result<(), discovery::domain::DomainError> {
/// use discovery::domain::ports::{DiscoveryService, FixtureDiscoveryService};
/// use discovery::domain::{ClusterQuery, ClusterQueryDraft};
///
/// let draft = ClusterQueryDraft {
///     lat: Some(53.9),
///     lng: Some(27.5667),
///     radius_km: Some(5.0),
///     zoom: Some(14),
///     category_id: None,
/// };
/// let query = ClusterQuery::try_from(draft)?;
/// let set = FixtureDiscoveryService.clusters(query).await?;
/// assert!(set.clusters.is_empty());
/// # Ok(())
/// # }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiscoveryService: Send + Sync {
    /// One cursor-paginated feed page.
    async fn feed(&self, query: DiscoveryQuery) -> Result<FeedPage, DomainError>;

    /// Map markers for a viewport and zoom.
    async fn clusters(&self, query: ClusterQuery) -> Result<ClusterSet, DomainError>;

    /// Geographic hotspots keyed by geohash cell.
    async fn hotspots(&self, query: TrendQuery) -> Result<Vec<TrendSignal>, DomainError>;

    /// Trending categories for searches (demand) or new listings (supply).
    async fn trending(&self, query: TrendQuery) -> Result<Vec<TrendSignal>, DomainError>;

    /// Composite viewport response; never fails because one section did.
    async fn overview(&self, query: OverviewQuery) -> Result<DiscoveryOverview, DomainError>;
}

/// Fixture service returning empty results.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureDiscoveryService;

#[async_trait]
impl DiscoveryService for FixtureDiscoveryService {
    async fn feed(&self, _query: DiscoveryQuery) -> Result<FeedPage, DomainError> {
        Ok(FeedPage::empty())
    }

    async fn clusters(&self, _query: ClusterQuery) -> Result<ClusterSet, DomainError> {
        Ok(ClusterSet::default())
    }

    async fn hotspots(&self, _query: TrendQuery) -> Result<Vec<TrendSignal>, DomainError> {
        Ok(Vec::new())
    }

    async fn trending(&self, _query: TrendQuery) -> Result<Vec<TrendSignal>, DomainError> {
        Ok(Vec::new())
    }

    async fn overview(&self, _query: OverviewQuery) -> Result<DiscoveryOverview, DomainError> {
        Ok(DiscoveryOverview::default())
    }
}
