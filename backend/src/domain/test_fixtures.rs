//! Builders shared by domain unit tests.

use chrono::{DateTime, Duration, TimeZone, Utc};

use super::geo::{GeoPoint, distance_km};
use super::listing::{
    ListingCandidate, ListingId, ListingProjection, ListingStatus, ModerationStatus,
};

/// Fixed reference instant so tests never depend on the wall clock.
pub(crate) fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Minsk city centre.
pub(crate) const MINSK: GeoPoint = GeoPoint::new(53.9, 27.5667);

/// Point `km` kilometres due north of `origin`.
pub(crate) fn north_of(origin: GeoPoint, km: f64) -> GeoPoint {
    GeoPoint::new(origin.lat + km / super::geo::KM_PER_DEGREE, origin.lng)
}

/// Active, approved listing created `age_minutes` before [`epoch`].
pub(crate) fn listing(id: &str, location: GeoPoint, age_minutes: i64) -> ListingProjection {
    ListingProjection {
        id: ListingId::new(id),
        title: format!("Listing {id}"),
        price: Some(100.0),
        currency: "BYN".to_owned(),
        category_id: "electronics".to_owned(),
        subcategory_id: None,
        created_at: epoch() - Duration::minutes(age_minutes),
        status: ListingStatus::Active,
        moderation_status: ModerationStatus::Approved,
        location,
        photos: Vec::new(),
    }
}

/// Pair `listing` with its distance from `center`.
pub(crate) fn candidate(listing: ListingProjection, center: GeoPoint) -> ListingCandidate {
    let distance_km = distance_km(center, listing.location).expect("finite fixture");
    ListingCandidate {
        listing,
        distance_km,
    }
}

/// Clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FixtureClock(pub(crate) DateTime<Utc>);

impl mockable::Clock for FixtureClock {
    fn local(&self) -> DateTime<chrono::Local> {
        self.0.with_timezone(&chrono::Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}
