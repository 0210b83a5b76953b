//! Spatial candidate retrieval over the listing store port.
//!
//! Native mode delegates radius search to the store's spatial index. Scan
//! mode fetches a capped window of the most recent listings and measures
//! distance in process. Both modes run the same post-filters, so results
//! never depend on which mode served them.

use std::sync::Arc;

use tracing::{debug, warn};

use super::geo::{GeoPoint, distance_km};
use super::listing::{ListingCandidate, ListingProjection};
use super::ports::{ListingRepository, ListingRepositoryError};
use super::query::ListingFilters;

/// Default number of recent listings examined by a fallback scan.
pub const DEFAULT_FALLBACK_SCAN_CAP: usize = 500;

/// Which strategy produced a candidate set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// Store-side spatial index.
    Native,
    /// Capped in-process scan.
    Fallback,
}

/// Post-filtered candidates and the mode that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialCandidates {
    /// Eligible listings with their distances, in store order.
    pub candidates: Vec<ListingCandidate>,
    /// Strategy used.
    pub mode: QueryMode,
}

/// Radius search with native and fallback strategies.
pub struct SpatialQueryAdapter<L: ?Sized> {
    listings: Arc<L>,
    fallback_cap: usize,
}

impl<L: ?Sized> Clone for SpatialQueryAdapter<L> {
    fn clone(&self) -> Self {
        Self {
            listings: Arc::clone(&self.listings),
            fallback_cap: self.fallback_cap,
        }
    }
}

impl<L> SpatialQueryAdapter<L>
where
    L: ListingRepository + ?Sized,
{
    /// Build an adapter scanning at most `fallback_cap` listings in scan mode.
    pub const fn new(listings: Arc<L>, fallback_cap: usize) -> Self {
        Self {
            listings,
            fallback_cap,
        }
    }

    /// Eligible listings within `radius_km` of `center`.
    ///
    /// # Errors
    /// Propagates connection and query failures from the store. A native
    /// call reporting a missing spatial index is retried as a scan.
    pub async fn candidates(
        &self,
        center: GeoPoint,
        radius_km: f64,
        filters: &ListingFilters,
    ) -> Result<SpatialCandidates, ListingRepositoryError> {
        if self.listings.supports_proximity() {
            match self
                .listings
                .find_active_listings_near(center, radius_km, filters)
                .await
            {
                Ok(rows) => {
                    return Ok(SpatialCandidates {
                        candidates: post_filter(rows, center, radius_km, filters),
                        mode: QueryMode::Native,
                    });
                }
                Err(ListingRepositoryError::ProximityUnsupported { message }) => {
                    warn!(%message, "spatial index unavailable; falling back to capped scan");
                }
                Err(other) => return Err(other),
            }
        }

        let mut rows = self
            .listings
            .find_active_listings(filters, self.fallback_cap)
            .await?;
        // Adapters are asked for recency order; enforce it before capping.
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        rows.truncate(self.fallback_cap);
        debug!(scanned = rows.len(), cap = self.fallback_cap, "fallback scan");
        Ok(SpatialCandidates {
            candidates: post_filter(rows, center, radius_km, filters),
            mode: QueryMode::Fallback,
        })
    }
}

/// Keep discoverable listings that match `filters` and lie within the
/// radius. Listings with non-finite coordinates are dropped.
#[must_use]
pub fn post_filter(
    rows: Vec<ListingProjection>,
    center: GeoPoint,
    radius_km: f64,
    filters: &ListingFilters,
) -> Vec<ListingCandidate> {
    rows.into_iter()
        .filter(|listing| listing.is_discoverable() && filters.matches(listing))
        .filter_map(|listing| {
            let km = distance_km(center, listing.location)?;
            (km <= radius_km).then_some(ListingCandidate {
                listing,
                distance_km: km,
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "spatial_tests.rs"]
mod tests;
