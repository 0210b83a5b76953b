//! Shared harness for HTTP-level discovery tests.
//!
//! Wires the real engine over the in-memory adapters with a hand-driven clock
//! so cache lifetimes and trend windows are deterministic.

use std::sync::Arc;

use actix_web::dev::{Service, ServiceResponse};
use actix_web::{App, test, web};
use chrono::{DateTime, Duration, TimeZone, Utc};
use discovery::Trace;
use discovery::domain::ports::{FixtureSearchEventSink, NoOpDiscoveryMetrics};
use discovery::domain::{
    ActivityEvent, DiscoveryConfig, DiscoveryEngine, DiscoveryPorts, GeoPoint, KM_PER_DEGREE,
    ListingProjection,
};
use discovery::inbound::http::discovery::configure;
use discovery::inbound::http::state::HttpState;
use discovery::outbound::cache::InMemoryResultCache;
use discovery::outbound::memory::{InMemoryEventLog, InMemoryListingRepository};
use discovery::test_support::MutableClock;
use discovery::test_support::listings::CountingListingRepository;
use serde_json::Value;

/// Minsk city centre.
pub const MINSK: GeoPoint = GeoPoint::new(53.9, 27.5667);

/// Instant the harness clock starts at.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// `minutes` before [`epoch`].
pub fn minutes_ago(minutes: i64) -> DateTime<Utc> {
    epoch() - Duration::minutes(minutes)
}

/// Point `km` kilometres due north of `origin`.
pub fn north_of(origin: GeoPoint, km: f64) -> GeoPoint {
    GeoPoint::new(origin.lat + km / KM_PER_DEGREE, origin.lng)
}

/// Engine, adapters and clock behind one test app.
pub struct Harness {
    pub listings: Arc<CountingListingRepository>,
    pub cache: Arc<InMemoryResultCache>,
    pub clock: Arc<MutableClock>,
    state: web::Data<HttpState>,
}

impl Harness {
    /// Harness over `listings` with a native proximity index and no events.
    pub fn new(listings: Vec<ListingProjection>) -> Self {
        Self::with_events(listings, Vec::new())
    }

    /// Harness over `listings` and `events`.
    pub fn with_events(listings: Vec<ListingProjection>, events: Vec<ActivityEvent>) -> Self {
        let clock = Arc::new(MutableClock::at(epoch()));
        let listings = Arc::new(CountingListingRepository::new(
            InMemoryListingRepository::new(listings, true),
        ));
        let cache = Arc::new(InMemoryResultCache::new(64, clock.clone()));
        let engine = DiscoveryEngine::new(
            DiscoveryPorts {
                listings: listings.clone(),
                events: Arc::new(InMemoryEventLog::new(events)),
                cache: cache.clone(),
                search_events: Arc::new(FixtureSearchEventSink),
                metrics: Arc::new(NoOpDiscoveryMetrics),
                clock: clock.clone(),
            },
            DiscoveryConfig::default(),
        );
        Self {
            listings,
            cache,
            clock,
            state: web::Data::new(HttpState::new(Arc::new(engine))),
        }
    }

    /// Initialise an Actix test service over the harness state.
    pub async fn service(
        &self,
    ) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>
    {
        test::init_service(
            App::new()
                .app_data(self.state.clone())
                .wrap(Trace)
                .service(web::scope("/api/v1").configure(configure)),
        )
        .await
    }
}

/// Issue a GET and return status plus raw body bytes.
pub async fn get_raw<S>(app: &S, uri: &str) -> (u16, Vec<u8>)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = test::call_service(app, test::TestRequest::get().uri(uri).to_request()).await;
    let status = res.status().as_u16();
    (status, test::read_body(res).await.to_vec())
}

/// Issue a GET and parse the JSON body.
pub async fn get_json<S>(app: &S, uri: &str) -> (u16, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let (status, body) = get_raw(app, uri).await;
    let json = serde_json::from_slice(&body).expect("JSON body");
    (status, json)
}

/// Listing ids on a feed page.
pub fn item_ids(page: &Value) -> Vec<String> {
    page["items"]
        .as_array()
        .expect("items array")
        .iter()
        .map(|item| item["id"].as_str().expect("string id").to_owned())
        .collect()
}
