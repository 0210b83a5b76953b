//! Zoom-dependent marker clustering on a globally anchored grid.
//!
//! Cell edges halve with every zoom step above [`BASE_ZOOM`]. Cell indices
//! are counted from `(-90, -180)`, so viewports sharing a zoom level and a
//! centre latitude snap a listing to the same cell. Longitude cells are
//! widened by the cosine of the viewport latitude to stay roughly square on
//! the ground; panning north or south therefore shifts column edges, while
//! row edges depend on zoom alone.
#![expect(
    clippy::float_arithmetic,
    reason = "grid snapping and centroids are coordinate maths"
)]

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::geo::{GeoPoint, KM_PER_DEGREE, distance_km};
use super::listing::{ListingCandidate, ListingId};

/// Zoom at which cells measure [`BASE_CELL_SIZE_KM`].
pub const BASE_ZOOM: u8 = 10;
/// Cell edge at [`BASE_ZOOM`].
pub const BASE_CELL_SIZE_KM: f64 = 8.0;
const MIN_COS_LAT: f64 = 0.01;

/// One map marker standing for every listing in a grid cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterMarker {
    /// Arithmetic mean of member locations.
    pub centroid: GeoPoint,
    /// Number of members; at least one.
    pub count: usize,
    /// Most recently created member, smallest id on ties.
    pub representative_listing_id: ListingId,
    /// Largest member distance from the centroid.
    pub bounding_radius_km: f64,
}

/// Markers for one viewport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterSet {
    /// Markers ordered by count desc, then representative id.
    pub clusters: Vec<ClusterMarker>,
}

/// Grid geometry for a zoom level and viewport latitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterGrid {
    cell_size_km: f64,
    lat_step: f64,
    lng_step: f64,
}

impl ClusterGrid {
    /// Grid for `zoom` around a viewport centred at `center_lat`.
    #[must_use]
    pub fn for_zoom(zoom: u8, center_lat: f64) -> Self {
        let exponent = i32::from(BASE_ZOOM) - i32::from(zoom);
        let cell_size_km = BASE_CELL_SIZE_KM * 2.0_f64.powi(exponent);
        let cos_lat = center_lat.to_radians().cos().abs().max(MIN_COS_LAT);
        let lat_step = cell_size_km / KM_PER_DEGREE;
        Self {
            cell_size_km,
            lat_step,
            lng_step: lat_step / cos_lat,
        }
    }

    /// Edge length in kilometres.
    #[must_use]
    pub const fn cell_size_km(&self) -> f64 {
        self.cell_size_km
    }

    /// Cell containing `point`, or `None` for non-finite coordinates.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "floored finite coordinates divided by a positive step fit in i64"
    )]
    pub fn cell_of(&self, point: GeoPoint) -> Option<(i64, i64)> {
        if !point.is_finite() {
            return None;
        }
        let row = ((point.lat + 90.0) / self.lat_step).floor() as i64;
        let col = ((point.lng + 180.0) / self.lng_step).floor() as i64;
        Some((row, col))
    }

    /// Geometric centre of a cell.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "cell indices stay far below 2^52"
    )]
    pub fn cell_center(&self, (row, col): (i64, i64)) -> GeoPoint {
        GeoPoint::new(
            (row as f64 + 0.5) * self.lat_step - 90.0,
            (col as f64 + 0.5) * self.lng_step - 180.0,
        )
    }
}

struct Cell {
    sum_lat: f64,
    sum_lng: f64,
    members: Vec<GeoPoint>,
    representative: (DateTime<Utc>, ListingId),
}

impl Cell {
    fn new(candidate: &ListingCandidate) -> Self {
        let location = candidate.listing.location;
        Self {
            sum_lat: location.lat,
            sum_lng: location.lng,
            members: vec![location],
            representative: (candidate.listing.created_at, candidate.listing.id.clone()),
        }
    }

    fn absorb(&mut self, candidate: &ListingCandidate) {
        let location = candidate.listing.location;
        self.sum_lat += location.lat;
        self.sum_lng += location.lng;
        self.members.push(location);
        let (best_at, best_id) = &self.representative;
        let newer = candidate.listing.created_at > *best_at;
        let tie_wins = candidate.listing.created_at == *best_at && candidate.listing.id < *best_id;
        if newer || tie_wins {
            self.representative = (candidate.listing.created_at, candidate.listing.id.clone());
        }
    }

    fn into_marker(self) -> ClusterMarker {
        let count = self.members.len();
        let divisor = f64::from(u32::try_from(count).unwrap_or(u32::MAX));
        let centroid = GeoPoint::new(self.sum_lat / divisor, self.sum_lng / divisor);
        let bounding_radius_km = self
            .members
            .iter()
            .filter_map(|member| distance_km(centroid, *member))
            .fold(0.0_f64, f64::max);
        ClusterMarker {
            centroid,
            count,
            representative_listing_id: self.representative.1,
            bounding_radius_km,
        }
    }
}

/// Collapse `candidates` into one marker per occupied cell.
///
/// Runs in a single pass; the marker counts always sum to the number of
/// candidates with finite coordinates.
#[must_use]
pub fn cluster(candidates: &[ListingCandidate], grid: &ClusterGrid) -> ClusterSet {
    let mut cells: BTreeMap<(i64, i64), Cell> = BTreeMap::new();
    for candidate in candidates {
        let Some(index) = grid.cell_of(candidate.listing.location) else {
            continue;
        };
        cells
            .entry(index)
            .and_modify(|cell| cell.absorb(candidate))
            .or_insert_with(|| Cell::new(candidate));
    }
    let mut clusters: Vec<ClusterMarker> = cells.into_values().map(Cell::into_marker).collect();
    clusters.sort_by(marker_order);
    ClusterSet { clusters }
}

fn marker_order(a: &ClusterMarker, b: &ClusterMarker) -> Ordering {
    b.count
        .cmp(&a.count)
        .then_with(|| a.representative_listing_id.cmp(&b.representative_listing_id))
}

#[cfg(test)]
#[path = "clustering_tests.rs"]
mod tests;
