//! Geospatial discovery read endpoints.
//!
//! ```text
//! GET /api/v1/discovery/feed
//! GET /api/v1/discovery/clusters
//! GET /api/v1/discovery/hotspots
//! GET /api/v1/discovery/trending-searches
//! GET /api/v1/discovery/trending-supply
//! GET /api/v1/discovery/overview
//! ```
//!
//! Every handler validates its parameters before touching the discovery
//! service, so malformed requests never reach the listing store.

use actix_web::{HttpResponse, get, web};

use crate::domain::{
    ClusterQuery, ClusterQueryDraft, DiscoveryQuery, DiscoveryQueryDraft, OverviewQuery,
    OverviewQueryDraft, TrendKind, TrendQuery, TrendQueryDraft,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::cache_control::{
    long_lived_header, private_no_cache_header, short_lived_header,
};
use crate::inbound::http::discovery_dto::{
    ClusterParams, ClustersResponse, FeedParams, FeedResponse, HotspotParams, HotspotsResponse,
    OverviewParams, OverviewResponse, TrendingParams, TrendsResponse, marker_responses,
    signal_responses,
};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Listings near a point, filtered, sorted and cursor-paginated.
#[utoipa::path(
    get,
    path = "/api/v1/discovery/feed",
    params(FeedParams),
    responses(
        (
            status = 200,
            description = "Feed page",
            headers(("Cache-Control" = String, description = "Cache control header")),
            body = FeedResponse
        ),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 503, description = "Listing store unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["discovery"],
    operation_id = "getDiscoveryFeed"
)]
#[get("/discovery/feed")]
pub async fn get_feed(
    state: web::Data<HttpState>,
    params: web::Query<FeedParams>,
) -> ApiResult<HttpResponse> {
    let query = DiscoveryQuery::try_from(DiscoveryQueryDraft::try_from(params.into_inner())?)?;
    let page = state.discovery.feed(query).await?;
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(FeedResponse::from(page)))
}

/// Map markers for the listings in a viewport.
#[utoipa::path(
    get,
    path = "/api/v1/discovery/clusters",
    params(ClusterParams),
    responses(
        (status = 200, description = "Cluster markers", body = ClustersResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 503, description = "Listing store unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["discovery"],
    operation_id = "getDiscoveryClusters"
)]
#[get("/discovery/clusters")]
pub async fn get_clusters(
    state: web::Data<HttpState>,
    params: web::Query<ClusterParams>,
) -> ApiResult<HttpResponse> {
    let query = ClusterQuery::try_from(ClusterQueryDraft::try_from(params.into_inner())?)?;
    let set = state.discovery.clusters(query).await?;
    Ok(HttpResponse::Ok()
        .insert_header(short_lived_header())
        .json(ClustersResponse {
            clusters: marker_responses(set.clusters),
        }))
}

/// Demand, supply or opportunity hotspots keyed by geohash cell.
#[utoipa::path(
    get,
    path = "/api/v1/discovery/hotspots",
    params(HotspotParams),
    responses(
        (status = 200, description = "Hotspot signals", body = HotspotsResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 503, description = "Event log unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["discovery"],
    operation_id = "getDiscoveryHotspots"
)]
#[get("/discovery/hotspots")]
pub async fn get_hotspots(
    state: web::Data<HttpState>,
    params: web::Query<HotspotParams>,
) -> ApiResult<HttpResponse> {
    let query = TrendQuery::try_from(TrendQueryDraft::try_from(params.into_inner())?)?;
    let signals = state.discovery.hotspots(query).await?;
    Ok(HttpResponse::Ok()
        .insert_header(long_lived_header())
        .json(HotspotsResponse {
            signals: signal_responses(signals),
        }))
}

async fn trending(
    state: &HttpState,
    kind: TrendKind,
    params: TrendingParams,
) -> ApiResult<HttpResponse> {
    let query = TrendQuery::with_kind(kind, TrendQueryDraft::try_from(params)?)?;
    let trends = state.discovery.trending(query).await?;
    Ok(HttpResponse::Ok()
        .insert_header(long_lived_header())
        .json(TrendsResponse {
            trends: signal_responses(trends),
        }))
}

/// Categories buyers search for most near a point.
#[utoipa::path(
    get,
    path = "/api/v1/discovery/trending-searches",
    params(TrendingParams),
    responses(
        (status = 200, description = "Trending search categories", body = TrendsResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 503, description = "Event log unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["discovery"],
    operation_id = "getTrendingSearches"
)]
#[get("/discovery/trending-searches")]
pub async fn get_trending_searches(
    state: web::Data<HttpState>,
    params: web::Query<TrendingParams>,
) -> ApiResult<HttpResponse> {
    trending(&state, TrendKind::Demand, params.into_inner()).await
}

/// Categories sellers publish into most near a point.
#[utoipa::path(
    get,
    path = "/api/v1/discovery/trending-supply",
    params(TrendingParams),
    responses(
        (status = 200, description = "Trending supply categories", body = TrendsResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 503, description = "Event log unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["discovery"],
    operation_id = "getTrendingSupply"
)]
#[get("/discovery/trending-supply")]
pub async fn get_trending_supply(
    state: web::Data<HttpState>,
    params: web::Query<TrendingParams>,
) -> ApiResult<HttpResponse> {
    trending(&state, TrendKind::Supply, params.into_inner()).await
}

/// Feed, clusters and trending searches for one viewport in one round trip.
///
/// Sections that fail are returned empty and listed in `degraded`.
#[utoipa::path(
    get,
    path = "/api/v1/discovery/overview",
    params(OverviewParams),
    responses(
        (status = 200, description = "Viewport overview", body = OverviewResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["discovery"],
    operation_id = "getDiscoveryOverview"
)]
#[get("/discovery/overview")]
pub async fn get_overview(
    state: web::Data<HttpState>,
    params: web::Query<OverviewParams>,
) -> ApiResult<HttpResponse> {
    let query = OverviewQuery::try_from(OverviewQueryDraft::try_from(params.into_inner())?)?;
    let overview = state.discovery.overview(query).await?;
    Ok(HttpResponse::Ok()
        .insert_header(short_lived_header())
        .json(OverviewResponse::from(overview)))
}

/// Register every discovery endpoint on a scope or app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_feed)
        .service(get_clusters)
        .service(get_hotspots)
        .service(get_trending_searches)
        .service(get_trending_supply)
        .service(get_overview);
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod tests;
