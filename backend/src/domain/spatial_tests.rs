//! Mode selection and post-filter parity.

use mockall::predicate::eq;
use rstest::rstest;

use super::*;
use crate::domain::ports::MockListingRepository;
use crate::domain::test_fixtures::{MINSK, listing, north_of};
use crate::domain::{ListingStatus, ModerationStatus};

fn minsk_rows() -> Vec<ListingProjection> {
    vec![
        listing("near", north_of(MINSK, 1.2), 10),
        listing("far", north_of(MINSK, 8.0), 5),
    ]
}

fn ids(found: &SpatialCandidates) -> Vec<&str> {
    found
        .candidates
        .iter()
        .map(|c| c.listing.id.as_str())
        .collect()
}

#[rstest]
#[case(true)]
#[case(false)]
#[tokio::test]
async fn radius_excludes_listings_beyond_it(#[case] native: bool) {
    let mut repo = MockListingRepository::new();
    repo.expect_supports_proximity().return_const(native);
    repo.expect_find_active_listings_near()
        .returning(|_, _, _| Ok(minsk_rows()));
    repo.expect_find_active_listings()
        .returning(|_, _| Ok(minsk_rows()));
    let adapter = SpatialQueryAdapter::new(Arc::new(repo), DEFAULT_FALLBACK_SCAN_CAP);

    let found = adapter
        .candidates(MINSK, 5.0, &ListingFilters::default())
        .await
        .expect("candidates");

    assert_eq!(ids(&found), vec!["near"]);
    let expected_mode = if native {
        QueryMode::Native
    } else {
        QueryMode::Fallback
    };
    assert_eq!(found.mode, expected_mode);
    let distance = found.candidates.first().map(|c| c.distance_km);
    assert!(distance.is_some_and(|km| (km - 1.2).abs() < 1e-6));
}

#[rstest]
#[tokio::test]
async fn missing_index_falls_back_to_scan() {
    let mut repo = MockListingRepository::new();
    repo.expect_supports_proximity().return_const(true);
    repo.expect_find_active_listings_near()
        .times(1)
        .returning(|_, _, _| {
            Err(ListingRepositoryError::proximity_unsupported(
                "no 2dsphere index",
            ))
        });
    repo.expect_find_active_listings()
        .with(eq(ListingFilters::default()), eq(25_usize))
        .times(1)
        .returning(|_, _| Ok(minsk_rows()));
    let adapter = SpatialQueryAdapter::new(Arc::new(repo), 25);

    let found = adapter
        .candidates(MINSK, 5.0, &ListingFilters::default())
        .await
        .expect("candidates");

    assert_eq!(found.mode, QueryMode::Fallback);
    assert_eq!(ids(&found), vec!["near"]);
}

#[rstest]
#[tokio::test]
async fn connection_failures_propagate() {
    let mut repo = MockListingRepository::new();
    repo.expect_supports_proximity().return_const(true);
    repo.expect_find_active_listings_near()
        .returning(|_, _, _| Err(ListingRepositoryError::connection("refused")));
    repo.expect_find_active_listings().times(0);
    let adapter = SpatialQueryAdapter::new(Arc::new(repo), 10);

    let err = adapter
        .candidates(MINSK, 5.0, &ListingFilters::default())
        .await
        .expect_err("store down");
    assert_eq!(err, ListingRepositoryError::connection("refused"));
}

#[rstest]
#[tokio::test]
async fn fallback_keeps_only_the_most_recent_rows() {
    let mut repo = MockListingRepository::new();
    repo.expect_supports_proximity().return_const(false);
    repo.expect_find_active_listings().returning(|_, _| {
        Ok((0..5)
            .map(|n| listing(&format!("l{n}"), MINSK, 50 - n))
            .collect())
    });
    let adapter = SpatialQueryAdapter::new(Arc::new(repo), 2);

    let found = adapter
        .candidates(MINSK, 1.0, &ListingFilters::default())
        .await
        .expect("candidates");
    assert_eq!(ids(&found), vec!["l4", "l3"]);
}

#[rstest]
fn post_filter_drops_ineligible_rows() {
    let mut sold = listing("sold", MINSK, 1);
    sold.status = ListingStatus::Sold;
    let mut pending = listing("pending", MINSK, 1);
    pending.moderation_status = ModerationStatus::Pending;
    let mut broken = listing("broken", MINSK, 1);
    broken.location = GeoPoint::new(f64::NAN, 27.0);
    let mut furniture = listing("sofa", MINSK, 1);
    furniture.category_id = "furniture".to_owned();
    let keep = listing("keep", MINSK, 1);

    let filters = ListingFilters {
        category_id: Some("electronics".to_owned()),
        ..ListingFilters::default()
    };
    let kept = post_filter(
        vec![sold, pending, broken, furniture, keep],
        MINSK,
        5.0,
        &filters,
    );
    let kept_ids: Vec<&str> = kept.iter().map(|c| c.listing.id.as_str()).collect();
    assert_eq!(kept_ids, vec!["keep"]);
}
