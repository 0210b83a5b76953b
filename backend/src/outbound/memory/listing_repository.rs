//! In-memory listing store.
//!
//! Mirrors a document store with an optional 2dsphere index: when the index
//! is "missing" the proximity query fails with
//! [`ListingRepositoryError::ProximityUnsupported`] and callers fall back to
//! the recency scan.

use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard};

use async_trait::async_trait;

use crate::domain::ports::{ListingRepository, ListingRepositoryError};
use crate::domain::{GeoPoint, ListingFilters, ListingProjection, distance_km};

use super::fixtures::{FixtureLoadError, load_json_array};

/// Listing store held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryListingRepository {
    listings: RwLock<Vec<ListingProjection>>,
    proximity_index: bool,
}

impl InMemoryListingRepository {
    /// Store seeded with `listings`; `proximity_index` toggles native
    /// proximity support.
    #[must_use]
    pub const fn new(listings: Vec<ListingProjection>, proximity_index: bool) -> Self {
        Self {
            listings: RwLock::new(listings),
            proximity_index,
        }
    }

    /// Store seeded from a JSON array of listing projections.
    ///
    /// # Errors
    /// Propagates [`FixtureLoadError`] when the file is unreadable or invalid.
    pub fn from_fixture(path: &Path, proximity_index: bool) -> Result<Self, FixtureLoadError> {
        Ok(Self::new(load_json_array(path)?, proximity_index))
    }

    /// Add or replace a listing by id.
    ///
    /// # Errors
    /// Returns [`ListingRepositoryError::Connection`] when the lock is poisoned.
    pub fn upsert(&self, listing: ListingProjection) -> Result<(), ListingRepositoryError> {
        let mut listings = self
            .listings
            .write()
            .map_err(|_| ListingRepositoryError::connection("listing store lock poisoned"))?;
        listings.retain(|existing| existing.id != listing.id);
        listings.push(listing);
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<ListingProjection>>, ListingRepositoryError> {
        self.listings
            .read()
            .map_err(|_| ListingRepositoryError::connection("listing store lock poisoned"))
    }
}

fn eligible(listing: &ListingProjection, filters: &ListingFilters) -> bool {
    listing.is_discoverable() && filters.matches(listing)
}

#[async_trait]
impl ListingRepository for InMemoryListingRepository {
    fn supports_proximity(&self) -> bool {
        self.proximity_index
    }

    async fn find_active_listings_near(
        &self,
        center: GeoPoint,
        radius_km: f64,
        filters: &ListingFilters,
    ) -> Result<Vec<ListingProjection>, ListingRepositoryError> {
        if !self.proximity_index {
            return Err(ListingRepositoryError::proximity_unsupported(
                "no spatial index on listing locations",
            ));
        }
        let listings = self.read()?;
        let mut near: Vec<(f64, ListingProjection)> = listings
            .iter()
            .filter(|listing| eligible(listing, filters))
            .filter_map(|listing| {
                distance_km(center, listing.location)
                    .filter(|km| *km <= radius_km)
                    .map(|km| (km, listing.clone()))
            })
            .collect();
        near.sort_by(|(a, _), (b, _)| a.total_cmp(b));
        Ok(near.into_iter().map(|(_, listing)| listing).collect())
    }

    async fn find_active_listings(
        &self,
        filters: &ListingFilters,
        limit: usize,
    ) -> Result<Vec<ListingProjection>, ListingRepositoryError> {
        let listings = self.read()?;
        let mut recent: Vec<ListingProjection> = listings
            .iter()
            .filter(|listing| eligible(listing, filters))
            .cloned()
            .collect();
        recent.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        recent.truncate(limit);
        Ok(recent)
    }
}
