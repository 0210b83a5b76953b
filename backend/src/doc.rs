//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every discovery endpoint, the health probes and the
//! response schemas. Domain types stay free of utoipa; the inbound layer
//! provides schema wrappers ([`ErrorSchema`], [`ErrorCodeSchema`]) and DTOs.
//!
//! The generated document backs Swagger UI (debug builds) and is exported by
//! the `openapi-dump` binary for external tooling.

use crate::inbound::http::discovery_dto::{
    ClusterMarkerResponse, ClustersResponse, FeedItemResponse, FeedResponse, GeoPointBody,
    HotspotsResponse, OverviewResponse, TrendSignalResponse, TrendsResponse,
};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use utoipa::OpenApi;

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Geospatial discovery API",
        description = "Nearby feed, map clusters, hotspots and trending signals for a classifieds marketplace."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::discovery::get_feed,
        crate::inbound::http::discovery::get_clusters,
        crate::inbound::http::discovery::get_hotspots,
        crate::inbound::http::discovery::get_trending_searches,
        crate::inbound::http::discovery::get_trending_supply,
        crate::inbound::http::discovery::get_overview,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        GeoPointBody,
        FeedItemResponse,
        FeedResponse,
        ClusterMarkerResponse,
        ClustersResponse,
        TrendSignalResponse,
        HotspotsResponse,
        TrendsResponse,
        OverviewResponse,
    )),
    tags(
        (name = "discovery", description = "Location-based listing discovery"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
