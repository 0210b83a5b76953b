//! Engine behaviour against mocked collaborators.

use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    MockDiscoveryMetrics, MockEventLog, MockListingRepository, MockResultCache,
    MockSearchEventSink, NoOpDiscoveryMetrics, ResultCacheError,
};
use crate::domain::test_fixtures::{FixtureClock, MINSK, candidate, epoch, listing, north_of};
use crate::domain::{
    ClusterQueryDraft, DiscoveryQueryDraft, ErrorCode, EventBucket, ListingProjection,
    OverviewQueryDraft, SortBy, TrendQueryDraft,
};

struct Harness {
    listings: MockListingRepository,
    events: MockEventLog,
    cache: MockResultCache,
    sink: MockSearchEventSink,
    metrics: Option<MockDiscoveryMetrics>,
}

impl Harness {
    fn build(self) -> DiscoveryEngine<MockListingRepository, MockEventLog> {
        let metrics: Arc<dyn DiscoveryMetrics> = match self.metrics {
            Some(mock) => Arc::new(mock),
            None => Arc::new(NoOpDiscoveryMetrics),
        };
        DiscoveryEngine::new(
            DiscoveryPorts {
                listings: Arc::new(self.listings),
                events: Arc::new(self.events),
                cache: Arc::new(self.cache),
                search_events: Arc::new(self.sink),
                metrics,
                clock: Arc::new(FixtureClock(epoch())),
            },
            DiscoveryConfig::default(),
        )
    }
}

/// Harness with a native store holding Minsk fixtures, an empty cache that
/// accepts writes, and a sink that accepts any number of events.
#[fixture]
fn harness() -> Harness {
    let mut listings = MockListingRepository::new();
    listings.expect_supports_proximity().return_const(true);
    listings
        .expect_find_active_listings_near()
        .returning(|_, _, _| Ok(minsk_rows()));
    let mut cache = MockResultCache::new();
    cache.expect_get().returning(|_| Ok(None));
    cache.expect_put().returning(|_, _, _| Ok(()));
    let mut sink = MockSearchEventSink::new();
    sink.expect_emit().return_const(());
    Harness {
        listings,
        events: MockEventLog::new(),
        cache,
        sink,
        metrics: None,
    }
}

fn minsk_rows() -> Vec<ListingProjection> {
    vec![
        listing("near", north_of(MINSK, 1.2), 10),
        listing("far", north_of(MINSK, 8.0), 5),
    ]
}

fn feed_query() -> DiscoveryQuery {
    DiscoveryQuery::try_from(DiscoveryQueryDraft {
        lat: Some(MINSK.lat),
        lng: Some(MINSK.lng),
        radius_km: Some(5.0),
        ..DiscoveryQueryDraft::default()
    })
    .expect("valid feed query")
}

fn trend_query(kind: &str) -> TrendQuery {
    TrendQuery::try_from(TrendQueryDraft {
        lat: Some(MINSK.lat),
        lng: Some(MINSK.lng),
        radius_km: Some(10.0),
        kind: Some(kind.to_owned()),
        ..TrendQueryDraft::default()
    })
    .expect("valid trend query")
}

fn bucket(key: &str, count: u64) -> EventBucket {
    EventBucket {
        key: key.to_owned(),
        count,
        last_seen_at: epoch() - ChronoDuration::minutes(5),
    }
}

#[rstest]
#[tokio::test]
async fn feed_returns_only_listings_inside_radius(harness: Harness) {
    let page = harness.build().feed(feed_query()).await.expect("feed");
    let ids: Vec<&str> = page.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["near"]);
    assert!(!page.has_more);
}

#[rstest]
#[tokio::test]
async fn cached_feed_skips_the_store(mut harness: Harness) {
    let cached = assemble_feed(
        vec![candidate(listing("cached", MINSK, 1), MINSK)],
        SortBy::Distance,
        None,
        20,
    )
    .expect("page");
    let payload = serde_json::to_string(&cached).expect("serialise");
    harness.cache = MockResultCache::new();
    harness
        .cache
        .expect_get()
        .times(1)
        .returning(move |_| Ok(Some(payload.clone())));
    harness.cache.expect_put().times(0);
    harness.listings = MockListingRepository::new();
    harness.listings.expect_supports_proximity().times(0);
    harness.listings.expect_find_active_listings_near().times(0);
    harness.listings.expect_find_active_listings().times(0);

    let page = harness.build().feed(feed_query()).await.expect("feed");
    assert_eq!(page, cached);
}

#[rstest]
#[tokio::test]
async fn miss_stores_the_serialised_result_with_feed_ttl(mut harness: Harness) {
    harness.cache = MockResultCache::new();
    harness.cache.expect_get().returning(|_| Ok(None));
    harness
        .cache
        .expect_put()
        .withf(|key, payload, ttl| {
            key.as_str().starts_with("discovery:v1:feed:")
                && payload.contains("\"near\"")
                && *ttl == Duration::from_secs(30)
        })
        .times(1)
        .returning(|_, _, _| Ok(()));

    harness.build().feed(feed_query()).await.expect("feed");
}

#[rstest]
#[tokio::test]
async fn cache_failures_fall_through_to_live_results(mut harness: Harness) {
    harness.cache = MockResultCache::new();
    harness
        .cache
        .expect_get()
        .returning(|_| Err(ResultCacheError::backend("poisoned")));
    harness
        .cache
        .expect_put()
        .returning(|_, _, _| Err(ResultCacheError::backend("poisoned")));
    let mut metrics = MockDiscoveryMetrics::new();
    metrics
        .expect_record_cache_lookup()
        .withf(|endpoint, outcome| endpoint == "feed" && *outcome == CacheOutcome::Error)
        .times(1)
        .returning(|_, _| Ok(()));
    harness.metrics = Some(metrics);

    let page = harness.build().feed(feed_query()).await.expect("feed");
    assert_eq!(page.items.len(), 1);
}

#[rstest]
#[tokio::test]
async fn undecodable_cache_entries_are_recomputed(mut harness: Harness) {
    harness.cache = MockResultCache::new();
    harness
        .cache
        .expect_get()
        .returning(|_| Ok(Some("{not json".to_owned())));
    harness.cache.expect_put().times(1).returning(|_, _, _| Ok(()));

    let page = harness.build().feed(feed_query()).await.expect("feed");
    assert_eq!(page.items.len(), 1);
}

#[rstest]
#[tokio::test]
async fn store_outage_is_retryable(mut harness: Harness) {
    harness.listings = MockListingRepository::new();
    harness.listings.expect_supports_proximity().return_const(true);
    harness
        .listings
        .expect_find_active_listings_near()
        .returning(|_, _, _| Err(ListingRepositoryError::connection("timeout")));

    let err = harness
        .build()
        .feed(feed_query())
        .await
        .expect_err("store down");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    assert!(err.code().is_retryable());
}

#[rstest]
#[tokio::test]
async fn feed_emits_a_search_event(mut harness: Harness) {
    harness.sink = MockSearchEventSink::new();
    harness
        .sink
        .expect_emit()
        .withf(|event| {
            event.kind == EventKind::Search
                && event.location == MINSK
                && event.category_id.as_deref() == Some("bikes")
                && event.occurred_at == epoch()
        })
        .times(1)
        .return_const(());
    let mut query = feed_query();
    query.filters.category_id = Some("bikes".to_owned());
    query.sort_by = SortBy::Newest;
    harness.listings = MockListingRepository::new();
    harness.listings.expect_supports_proximity().return_const(true);
    harness
        .listings
        .expect_find_active_listings_near()
        .returning(|_, _, _| Ok(Vec::new()));

    harness.build().feed(query).await.expect("feed");
}

#[rstest]
#[tokio::test]
async fn fallback_scans_are_counted(mut harness: Harness) {
    harness.listings = MockListingRepository::new();
    harness.listings.expect_supports_proximity().return_const(false);
    harness
        .listings
        .expect_find_active_listings()
        .returning(|_, _| Ok(minsk_rows()));
    let mut metrics = MockDiscoveryMetrics::new();
    metrics
        .expect_record_cache_lookup()
        .returning(|_, _| Ok(()));
    metrics
        .expect_record_fallback_scan()
        .times(1)
        .returning(|| Ok(()));
    harness.metrics = Some(metrics);

    let page = harness.build().feed(feed_query()).await.expect("feed");
    assert_eq!(page.items.len(), 1);
}

#[rstest]
#[tokio::test]
async fn clusters_conserve_candidates(harness: Harness) {
    let query = ClusterQuery::try_from(ClusterQueryDraft {
        lat: Some(MINSK.lat),
        lng: Some(MINSK.lng),
        radius_km: Some(10.0),
        zoom: Some(14),
        category_id: None,
    })
    .expect("valid");
    let set = harness.build().clusters(query).await.expect("clusters");
    let total: usize = set.clusters.iter().map(|m| m.count).sum();
    assert_eq!(total, 2);
}

#[rstest]
#[tokio::test]
async fn supply_only_cell_has_zero_opportunity(mut harness: Harness) {
    harness.events.expect_count_events().returning(|query| {
        Ok(match query.kind {
            EventKind::Search | EventKind::Contact => Vec::new(),
            EventKind::ListingPublished => vec![bucket("u9ede", 3)],
        })
    });

    let signals = harness
        .build()
        .hotspots(trend_query("opportunity"))
        .await
        .expect("hotspots");

    assert_eq!(signals.len(), 1);
    let signal = signals.first().expect("signal");
    assert_eq!(signal.kind, TrendKind::Opportunity);
    assert_eq!(signal.geohash.as_deref(), Some("u9ede"));
    assert_eq!(signal.score, 0.0);
}

#[rstest]
#[tokio::test]
async fn trend_window_ends_at_clock_time(mut harness: Harness) {
    harness
        .events
        .expect_count_events()
        .withf(|query| {
            query.kind == EventKind::Search
                && query.window.end() == epoch()
                && query.window.hours() == 24
                && query.group_by == EventGrouping::Category
        })
        .times(1)
        .returning(|_| Ok(vec![bucket("bikes", 4)]));

    let signals = harness
        .build()
        .trending(trend_query("demand"))
        .await
        .expect("trending");
    assert_eq!(signals.first().map(|s| s.score), Some(4.0));
}

#[rstest]
#[tokio::test]
async fn event_log_outage_fails_trending_requests(mut harness: Harness) {
    harness
        .events
        .expect_count_events()
        .returning(|_| Err(EventLogError::connection("down")));
    let err = harness
        .build()
        .trending(trend_query("supply"))
        .await
        .expect_err("log down");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

fn overview_query() -> OverviewQuery {
    OverviewQuery::try_from(OverviewQueryDraft {
        lat: Some(MINSK.lat),
        lng: Some(MINSK.lng),
        radius_km: Some(5.0),
        zoom: Some(14),
        limit: None,
    })
    .expect("valid")
}

#[rstest]
#[tokio::test]
async fn overview_degrades_failed_sections_to_empty(mut harness: Harness) {
    harness
        .events
        .expect_count_events()
        .returning(|_| Err(EventLogError::query("pipeline failed")));
    harness.sink = MockSearchEventSink::new();
    harness.sink.expect_emit().times(0);
    let mut metrics = MockDiscoveryMetrics::new();
    metrics.expect_record_cache_lookup().returning(|_, _| Ok(()));
    metrics
        .expect_record_degraded_section()
        .withf(|section| section == "trending")
        .times(1)
        .returning(|_| Ok(()));
    harness.metrics = Some(metrics);

    let overview = harness
        .build()
        .overview(overview_query())
        .await
        .expect("overview never fails");

    assert_eq!(overview.degraded, vec![OverviewSection::Trending]);
    assert!(overview.trending.is_empty());
    assert_eq!(overview.feed.items.len(), 1);
    assert_eq!(overview.clusters.len(), 1);
}

#[rstest]
#[tokio::test]
async fn overview_survives_a_store_outage(mut harness: Harness) {
    harness.listings = MockListingRepository::new();
    harness.listings.expect_supports_proximity().return_const(true);
    harness
        .listings
        .expect_find_active_listings_near()
        .returning(|_, _, _| Err(ListingRepositoryError::connection("down")));
    harness
        .events
        .expect_count_events()
        .returning(|_| Ok(vec![bucket("bikes", 2)]));

    let overview = harness
        .build()
        .overview(overview_query())
        .await
        .expect("overview never fails");

    assert_eq!(
        overview.degraded,
        vec![OverviewSection::Feed, OverviewSection::Clusters]
    );
    assert!(overview.feed.items.is_empty());
    assert_eq!(overview.trending.len(), 1);
}
