//! End-to-end discovery scenarios over the HTTP adapter and in-memory stores.

mod discovery_support;

use discovery::domain::{ActivityEvent, ClusterGrid, EventKind, GeoPoint};
use discovery::test_support::listings::listing;
use discovery_support::{Harness, MINSK, get_json, item_ids, minutes_ago, north_of};
use rstest::rstest;
use serde_json::json;

#[rstest]
#[actix_rt::test]
async fn feed_keeps_only_listings_inside_the_radius() {
    let harness = Harness::new(vec![
        listing("near", north_of(MINSK, 1.2), minutes_ago(10), Some(50.0)),
        listing("far", north_of(MINSK, 8.0), minutes_ago(5), Some(50.0)),
    ]);
    let app = harness.service().await;

    let (status, page) =
        get_json(&app, "/api/v1/discovery/feed?lat=53.9&lng=27.5667&radiusKm=5").await;

    assert_eq!(status, 200);
    assert_eq!(item_ids(&page), vec!["near"]);
    let distance = page["items"][0]["distanceKm"].as_f64().expect("distance");
    assert!((1.19..=1.21).contains(&distance), "distance was {distance}");
}

#[rstest]
#[actix_rt::test]
async fn tight_group_collapses_into_one_marker() {
    // Zoom 14 gives a 500 m cell; anchor the group on a cell centre so the
    // 200 m spread stays inside it.
    let grid = ClusterGrid::for_zoom(14, MINSK.lat);
    let anchor = grid.cell_center(grid.cell_of(MINSK).expect("finite point"));
    let offsets_m = [-80.0, -60.0, -40.0, -20.0, 0.0, 10.0, 30.0, 50.0, 70.0, 90.0];
    let listings = offsets_m
        .iter()
        .enumerate()
        .map(|(i, metres)| {
            let point = north_of(GeoPoint::new(anchor.lat, anchor.lng), metres / 1000.0);
            listing(&format!("c{i}"), point, minutes_ago(i64::try_from(i).expect("small")), None)
        })
        .collect();
    let harness = Harness::new(listings);
    let app = harness.service().await;

    let (status, body) = get_json(
        &app,
        &format!(
            "/api/v1/discovery/clusters?lat={}&lng={}&radiusKm=5&zoom=14",
            anchor.lat, anchor.lng
        ),
    )
    .await;

    assert_eq!(status, 200);
    let clusters = body["clusters"].as_array().expect("clusters");
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0]["count"], 10);
    assert_eq!(clusters[0]["representativeListingId"], "c0");
}

fn five_listings() -> Vec<discovery::domain::ListingProjection> {
    (1..=5)
        .map(|n| listing(&format!("l{n}"), north_of(MINSK, 0.5), minutes_ago(n * 10), Some(10.0)))
        .collect()
}

fn feed_uri(cursor: Option<&str>) -> String {
    let base = "/api/v1/discovery/feed?lat=53.9&lng=27.5667&radiusKm=5&sortBy=newest&limit=2";
    match cursor {
        Some(token) => format!("{base}&cursor={token}"),
        None => base.to_owned(),
    }
}

#[rstest]
#[actix_rt::test]
async fn newest_feed_pages_through_every_listing_once() {
    let harness = Harness::new(five_listings());
    let app = harness.service().await;

    let mut cursor: Option<String> = None;
    let mut pages = Vec::new();
    for _ in 0..3 {
        let (status, page) = get_json(&app, &feed_uri(cursor.as_deref())).await;
        assert_eq!(status, 200);
        pages.push((item_ids(&page), page["hasMore"].as_bool().expect("hasMore")));
        cursor = page["nextCursor"].as_str().map(str::to_owned);
    }

    assert_eq!(
        pages,
        vec![
            (vec!["l1".to_owned(), "l2".to_owned()], true),
            (vec!["l3".to_owned(), "l4".to_owned()], true),
            (vec!["l5".to_owned()], false),
        ]
    );
    assert!(cursor.is_none());
}

#[rstest]
#[actix_rt::test]
async fn distance_feed_pages_through_irregular_distances_once() {
    // Fractional offsets give haversine distances with long mantissas.
    let offsets_km = [0.137, 0.911, 1.618, 2.236, 2.718, 3.141, 3.333, 4.047];
    let listings = offsets_km
        .iter()
        .enumerate()
        .map(|(i, km)| listing(&format!("n{i}"), north_of(MINSK, *km), minutes_ago(1), None))
        .collect();
    let harness = Harness::new(listings);
    let app = harness.service().await;
    let base = "/api/v1/discovery/feed?lat=53.9&lng=27.5667&radiusKm=5&sortBy=distance&limit=1";

    let mut seen = Vec::new();
    let mut cursor: Option<String> = None;
    for _ in 0..=offsets_km.len() {
        let uri = match &cursor {
            Some(token) => format!("{base}&cursor={token}"),
            None => base.to_owned(),
        };
        let (status, page) = get_json(&app, &uri).await;
        assert_eq!(status, 200);
        seen.extend(item_ids(&page));
        cursor = page["nextCursor"].as_str().map(str::to_owned);
        if cursor.is_none() {
            break;
        }
    }

    let expected: Vec<String> = (0..offsets_km.len()).map(|i| format!("n{i}")).collect();
    assert_eq!(seen, expected);
    assert!(cursor.is_none(), "traversal must end after the last listing");
}

#[rstest]
#[actix_rt::test]
async fn inserts_between_pages_respect_the_issued_cursor() {
    let harness = Harness::new(five_listings());
    let app = harness.service().await;

    let (_, first) = get_json(&app, &feed_uri(None)).await;
    assert_eq!(item_ids(&first), vec!["l1", "l2"]);
    let cursor = first["nextCursor"].as_str().expect("cursor").to_owned();

    // Newer than the boundary: must not leak into later pages.
    harness
        .listings
        .inner()
        .upsert(listing("fresh", north_of(MINSK, 0.5), minutes_ago(0), Some(10.0)))
        .expect("insert fresh");
    // Older than the boundary: belongs to the remaining traversal.
    harness
        .listings
        .inner()
        .upsert(listing("backdated", north_of(MINSK, 0.5), minutes_ago(35), Some(10.0)))
        .expect("insert backdated");

    let (_, second) = get_json(&app, &feed_uri(Some(&cursor))).await;
    let next = second["nextCursor"].as_str().expect("cursor").to_owned();
    let (_, third) = get_json(&app, &feed_uri(Some(&next))).await;

    assert_eq!(item_ids(&second), vec!["l3", "backdated"]);
    assert_eq!(item_ids(&third), vec!["l4", "l5"]);
    assert_eq!(third["hasMore"], false);
}

#[rstest]
#[actix_rt::test]
async fn supply_without_demand_scores_zero_opportunity() {
    let events = (0..3)
        .map(|i| ActivityEvent {
            kind: EventKind::ListingPublished,
            category_id: Some("bikes".to_owned()),
            location: MINSK,
            occurred_at: minutes_ago(i * 5),
        })
        .collect();
    let harness = Harness::with_events(Vec::new(), events);
    let app = harness.service().await;

    let (status, body) = get_json(
        &app,
        "/api/v1/discovery/hotspots?lat=53.9&lng=27.5667&radiusKm=10&type=opportunity",
    )
    .await;

    assert_eq!(status, 200);
    let signals = body["signals"].as_array().expect("signals");
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0]["type"], "opportunity");
    assert_eq!(signals[0]["score"], json!(0.0));
}

#[rstest]
#[actix_rt::test]
async fn invalid_latitude_never_reaches_the_store() {
    let harness = Harness::new(five_listings());
    let app = harness.service().await;

    let (status, body) =
        get_json(&app, "/api/v1/discovery/feed?lat=200&lng=27.5667&radiusKm=5").await;

    assert_eq!(status, 400);
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["details"]["field"], "lat");
    assert_eq!(harness.listings.calls(), 0);
}
