//! Request parameters and response payloads for discovery endpoints.
//!
//! Numeric parameters are accepted as strings and parsed by
//! [`crate::inbound::http::validation`]; the domain query types then apply
//! range checks. Response types mirror domain results with OpenAPI schemas.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{DiscoveryOverview, OverviewSection};
use crate::domain::{
    ClusterMarker, ClusterQueryDraft, DiscoveryQueryDraft, DomainError, FeedItem, FeedPage,
    GeoPoint, ListingFilters, OverviewQueryDraft, TrendQueryDraft, TrendSignal,
};
use crate::inbound::http::validation::{
    HOURS, LAT, LIMIT, LNG, PRICE_MAX, PRICE_MIN, RADIUS_KM, ZOOM, parse_integer, parse_number,
};

/// Query parameters for the listing feed.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FeedParams {
    /// Centre latitude in degrees.
    #[param(value_type = f64, example = 53.9)]
    pub lat: Option<String>,
    /// Centre longitude in degrees.
    #[param(value_type = f64, example = 27.5667)]
    pub lng: Option<String>,
    /// Search radius in kilometres, at most 500.
    #[param(value_type = f64, example = 5.0)]
    pub radius_km: Option<String>,
    /// Top-level category filter.
    pub category_id: Option<String>,
    /// Subcategory filter.
    pub subcategory_id: Option<String>,
    /// Inclusive lower price bound.
    #[param(value_type = Option<f64>)]
    pub price_min: Option<String>,
    /// Inclusive upper price bound.
    #[param(value_type = Option<f64>)]
    pub price_max: Option<String>,
    /// `distance` (default), `newest` or `cheapest`.
    #[param(example = "distance")]
    pub sort_by: Option<String>,
    /// Page size; defaults to 20 and is capped at 100.
    #[param(value_type = Option<i64>)]
    pub limit: Option<String>,
    /// Opaque cursor from the previous page.
    pub cursor: Option<String>,
}

impl TryFrom<FeedParams> for DiscoveryQueryDraft {
    type Error = DomainError;

    fn try_from(params: FeedParams) -> Result<Self, Self::Error> {
        Ok(Self {
            lat: parse_number(LAT, params.lat)?,
            lng: parse_number(LNG, params.lng)?,
            radius_km: parse_number(RADIUS_KM, params.radius_km)?,
            filters: ListingFilters {
                category_id: params.category_id,
                subcategory_id: params.subcategory_id,
                price_min: parse_number(PRICE_MIN, params.price_min)?,
                price_max: parse_number(PRICE_MAX, params.price_max)?,
            },
            sort_by: params.sort_by,
            limit: parse_integer(LIMIT, params.limit)?,
            cursor: params.cursor,
        })
    }
}

/// Query parameters for map clusters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ClusterParams {
    /// Centre latitude in degrees.
    #[param(value_type = f64, example = 53.9)]
    pub lat: Option<String>,
    /// Centre longitude in degrees.
    #[param(value_type = f64, example = 27.5667)]
    pub lng: Option<String>,
    /// Search radius in kilometres, at most 500.
    #[param(value_type = f64, example = 5.0)]
    pub radius_km: Option<String>,
    /// Map zoom level, 1 to 20.
    #[param(value_type = i64, example = 14)]
    pub zoom: Option<String>,
    /// Top-level category filter.
    pub category_id: Option<String>,
}

impl TryFrom<ClusterParams> for ClusterQueryDraft {
    type Error = DomainError;

    fn try_from(params: ClusterParams) -> Result<Self, Self::Error> {
        Ok(Self {
            lat: parse_number(LAT, params.lat)?,
            lng: parse_number(LNG, params.lng)?,
            radius_km: parse_number(RADIUS_KM, params.radius_km)?,
            zoom: parse_integer(ZOOM, params.zoom)?,
            category_id: params.category_id,
        })
    }
}

/// Query parameters for geographic hotspots.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct HotspotParams {
    /// Centre latitude in degrees.
    #[param(value_type = f64, example = 53.9)]
    pub lat: Option<String>,
    /// Centre longitude in degrees.
    #[param(value_type = f64, example = 27.5667)]
    pub lng: Option<String>,
    /// Search radius in kilometres, at most 500.
    #[param(value_type = f64, example = 25.0)]
    pub radius_km: Option<String>,
    /// `demand`, `supply` or `opportunity`.
    #[serde(rename = "type")]
    #[param(value_type = String, example = "demand")]
    pub kind: Option<String>,
    /// Window length in hours, 1 to 168; defaults to 24.
    #[param(value_type = Option<i64>)]
    pub hours: Option<String>,
    /// Maximum number of signals; defaults to 10 and is capped at 50.
    #[param(value_type = Option<i64>)]
    pub limit: Option<String>,
    /// Geohash prefix replacing the radius scope, e.g. a country cell.
    pub geohash_prefix: Option<String>,
}

impl TryFrom<HotspotParams> for TrendQueryDraft {
    type Error = DomainError;

    fn try_from(params: HotspotParams) -> Result<Self, Self::Error> {
        Ok(Self {
            lat: parse_number(LAT, params.lat)?,
            lng: parse_number(LNG, params.lng)?,
            radius_km: parse_number(RADIUS_KM, params.radius_km)?,
            kind: params.kind,
            hours: parse_integer(HOURS, params.hours)?,
            limit: parse_integer(LIMIT, params.limit)?,
            geohash_prefix: params.geohash_prefix,
        })
    }
}

/// Query parameters for trending searches and trending supply.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TrendingParams {
    /// Centre latitude in degrees.
    #[param(value_type = f64, example = 53.9)]
    pub lat: Option<String>,
    /// Centre longitude in degrees.
    #[param(value_type = f64, example = 27.5667)]
    pub lng: Option<String>,
    /// Search radius in kilometres, at most 500.
    #[param(value_type = f64, example = 25.0)]
    pub radius_km: Option<String>,
    /// Maximum number of categories; defaults to 10 and is capped at 50.
    #[param(value_type = Option<i64>)]
    pub limit: Option<String>,
    /// Window length in hours, 1 to 168; defaults to 24.
    #[param(value_type = Option<i64>)]
    pub hours: Option<String>,
}

impl TryFrom<TrendingParams> for TrendQueryDraft {
    type Error = DomainError;

    fn try_from(params: TrendingParams) -> Result<Self, Self::Error> {
        Ok(Self {
            lat: parse_number(LAT, params.lat)?,
            lng: parse_number(LNG, params.lng)?,
            radius_km: parse_number(RADIUS_KM, params.radius_km)?,
            kind: None,
            hours: parse_integer(HOURS, params.hours)?,
            limit: parse_integer(LIMIT, params.limit)?,
            geohash_prefix: None,
        })
    }
}

/// Query parameters for the composite overview.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OverviewParams {
    /// Centre latitude in degrees.
    #[param(value_type = f64, example = 53.9)]
    pub lat: Option<String>,
    /// Centre longitude in degrees.
    #[param(value_type = f64, example = 27.5667)]
    pub lng: Option<String>,
    /// Search radius in kilometres, at most 500.
    #[param(value_type = f64, example = 5.0)]
    pub radius_km: Option<String>,
    /// Map zoom level, 1 to 20; defaults to 12.
    #[param(value_type = Option<i64>)]
    pub zoom: Option<String>,
    /// Feed page size; defaults to 20 and is capped at 100.
    #[param(value_type = Option<i64>)]
    pub limit: Option<String>,
}

impl TryFrom<OverviewParams> for OverviewQueryDraft {
    type Error = DomainError;

    fn try_from(params: OverviewParams) -> Result<Self, Self::Error> {
        Ok(Self {
            lat: parse_number(LAT, params.lat)?,
            lng: parse_number(LNG, params.lng)?,
            radius_km: parse_number(RADIUS_KM, params.radius_km)?,
            zoom: parse_integer(ZOOM, params.zoom)?,
            limit: parse_integer(LIMIT, params.limit)?,
        })
    }
}

/// Geographic coordinate pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct GeoPointBody {
    /// Latitude in degrees.
    #[schema(example = 53.9)]
    pub lat: f64,
    /// Longitude in degrees.
    #[schema(example = 27.5667)]
    pub lng: f64,
}

impl From<GeoPoint> for GeoPointBody {
    fn from(point: GeoPoint) -> Self {
        Self {
            lat: point.lat,
            lng: point.lng,
        }
    }
}

/// Listing card in the feed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedItemResponse {
    /// Listing identifier.
    #[schema(example = "65f1c2d4e8a9b0c1d2e3f4a5")]
    pub id: String,
    /// Seller supplied title.
    pub title: String,
    /// Asking price; null for negotiable listings.
    pub price: Option<f64>,
    /// ISO currency code.
    #[schema(example = "BYN")]
    pub currency: String,
    /// Top-level category.
    pub category_id: String,
    /// Optional subcategory.
    pub subcategory_id: Option<String>,
    /// RFC 3339 publication timestamp.
    #[schema(example = "2026-03-01T12:00:00Z")]
    pub created_at: String,
    /// Listing location.
    pub location: GeoPointBody,
    /// Photo URLs in display order.
    pub photos: Vec<String>,
    /// Great-circle distance from the query centre.
    #[schema(example = 1.2)]
    pub distance_km: f64,
}

impl From<FeedItem> for FeedItemResponse {
    fn from(item: FeedItem) -> Self {
        Self {
            id: item.id.as_str().to_owned(),
            title: item.title,
            price: item.price,
            currency: item.currency,
            category_id: item.category_id,
            subcategory_id: item.subcategory_id,
            created_at: item.created_at.to_rfc3339(),
            location: item.location.into(),
            photos: item.photos,
            distance_km: item.distance_km,
        }
    }
}

/// One feed page.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    /// Listings on this page.
    pub items: Vec<FeedItemResponse>,
    /// Cursor for the next page; null on the last page.
    pub next_cursor: Option<String>,
    /// Whether another page exists.
    pub has_more: bool,
}

impl From<FeedPage> for FeedResponse {
    fn from(page: FeedPage) -> Self {
        Self {
            items: page.items.into_iter().map(FeedItemResponse::from).collect(),
            next_cursor: page.next_cursor,
            has_more: page.has_more,
        }
    }
}

/// Map marker for a group of nearby listings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterMarkerResponse {
    /// Mean member location.
    pub centroid: GeoPointBody,
    /// Number of listings in the marker.
    #[schema(example = 10)]
    pub count: usize,
    /// Newest member listing.
    pub representative_listing_id: String,
    /// Largest member distance from the centroid.
    pub bounding_radius_km: f64,
}

impl From<ClusterMarker> for ClusterMarkerResponse {
    fn from(marker: ClusterMarker) -> Self {
        Self {
            centroid: marker.centroid.into(),
            count: marker.count,
            representative_listing_id: marker.representative_listing_id.as_str().to_owned(),
            bounding_radius_km: marker.bounding_radius_km,
        }
    }
}

/// Markers for one viewport.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClustersResponse {
    /// Markers ordered by size.
    pub clusters: Vec<ClusterMarkerResponse>,
}

/// Ranked demand, supply or opportunity signal.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrendSignalResponse {
    /// `demand`, `supply` or `opportunity`.
    #[serde(rename = "type")]
    #[schema(example = "demand")]
    pub kind: String,
    /// Geohash cell or category id.
    #[schema(example = "u9ede")]
    pub label: String,
    /// Event count, or demand to supply ratio for opportunity.
    pub score: f64,
    /// Geohash cell for hotspot signals.
    pub geohash: Option<String>,
    /// Category for trending signals.
    pub category_id: Option<String>,
    /// Window the signal covers.
    #[schema(example = 24)]
    pub window_hours: u32,
    /// RFC 3339 timestamp of the latest contributing event.
    pub last_seen_at: String,
}

impl From<TrendSignal> for TrendSignalResponse {
    fn from(signal: TrendSignal) -> Self {
        Self {
            kind: signal.kind.as_str().to_owned(),
            label: signal.label,
            score: signal.score,
            geohash: signal.geohash,
            category_id: signal.category_id,
            window_hours: signal.window_hours,
            last_seen_at: signal.last_seen_at.to_rfc3339(),
        }
    }
}

pub(crate) fn signal_responses(signals: Vec<TrendSignal>) -> Vec<TrendSignalResponse> {
    signals.into_iter().map(TrendSignalResponse::from).collect()
}

pub(crate) fn marker_responses(markers: Vec<ClusterMarker>) -> Vec<ClusterMarkerResponse> {
    markers.into_iter().map(ClusterMarkerResponse::from).collect()
}

/// Hotspot signals.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HotspotsResponse {
    /// Signals ordered by score.
    pub signals: Vec<TrendSignalResponse>,
}

/// Trending categories.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrendsResponse {
    /// Categories ordered by score.
    pub trends: Vec<TrendSignalResponse>,
}

/// Feed, clusters and trending searches for one viewport.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverviewResponse {
    /// First feed page, distance ordered.
    pub feed: FeedResponse,
    /// Map markers.
    pub clusters: Vec<ClusterMarkerResponse>,
    /// Trending searches.
    pub trending: Vec<TrendSignalResponse>,
    /// Sections that failed and were returned empty.
    #[schema(example = json!(["trending"]))]
    pub degraded: Vec<String>,
}

impl From<DiscoveryOverview> for OverviewResponse {
    fn from(overview: DiscoveryOverview) -> Self {
        Self {
            feed: overview.feed.into(),
            clusters: marker_responses(overview.clusters),
            trending: signal_responses(overview.trending),
            degraded: overview
                .degraded
                .into_iter()
                .map(|section: OverviewSection| section.as_str().to_owned())
                .collect(),
        }
    }
}
