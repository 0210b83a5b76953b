//! Driven port for the external listing store.
//!
//! The store owns listings and may or may not maintain a spatial index.
//! Adapters report which through [`ListingRepository::supports_proximity`];
//! the spatial query adapter picks native or scan mode from that flag.

use async_trait::async_trait;

use crate::domain::{GeoPoint, ListingFilters, ListingProjection};

use super::define_port_error;

define_port_error! {
    /// Errors raised by listing store adapters.
    pub enum ListingRepositoryError {
        /// The store could not be reached. Retryable.
        Connection { message: String } => "listing store connection failed: {message}",
        /// The store accepted the request but failed to execute it.
        Query { message: String } => "listing store query failed: {message}",
        /// The native proximity query is unavailable, e.g. a missing index.
        ProximityUnsupported { message: String } =>
            "listing store cannot run proximity queries: {message}",
    }
}

/// Read access to active listings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Whether [`ListingRepository::find_active_listings_near`] is backed by a
    /// spatial index.
    fn supports_proximity(&self) -> bool;

    /// Listings within `radius_km` of `center` matching `filters`.
    ///
    /// Adapters translate the radius to the store's own unit; document stores
    /// typically take `max_distance = radius_km * 1000` metres.
    async fn find_active_listings_near(
        &self,
        center: GeoPoint,
        radius_km: f64,
        filters: &ListingFilters,
    ) -> Result<Vec<ListingProjection>, ListingRepositoryError>;

    /// At most `limit` listings matching `filters`, most recent first.
    async fn find_active_listings(
        &self,
        filters: &ListingFilters,
        limit: usize,
    ) -> Result<Vec<ListingProjection>, ListingRepositoryError>;
}

/// Fixture store with no listings and no spatial index.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureListingRepository;

#[async_trait]
impl ListingRepository for FixtureListingRepository {
    fn supports_proximity(&self) -> bool {
        false
    }

    async fn find_active_listings_near(
        &self,
        _center: GeoPoint,
        _radius_km: f64,
        _filters: &ListingFilters,
    ) -> Result<Vec<ListingProjection>, ListingRepositoryError> {
        Err(ListingRepositoryError::proximity_unsupported(
            "fixture store has no spatial index",
        ))
    }

    async fn find_active_listings(
        &self,
        _filters: &ListingFilters,
        _limit: usize,
    ) -> Result<Vec<ListingProjection>, ListingRepositoryError> {
        Ok(Vec::new())
    }
}
