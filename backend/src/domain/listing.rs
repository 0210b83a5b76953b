//! Listing projections read from the external listing store.
//!
//! The store owns listings; discovery only ever sees this read-only,
//! explicitly typed projection. Unknown status strings deserialise into the
//! `Other` variants so a new upstream state can never make a listing
//! eligible by accident.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::geo::GeoPoint;

/// Opaque listing identifier assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(String);

impl ListingId {
    /// Wrap a store identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ListingId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Commercial lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ListingStatus {
    /// Visible and purchasable.
    Active,
    /// Sold to a buyer.
    Sold,
    /// Withdrawn by the seller.
    Archived,
    /// Any state discovery does not know about.
    #[serde(other)]
    Other,
}

/// Moderation outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModerationStatus {
    /// Passed moderation.
    Approved,
    /// Awaiting review.
    Pending,
    /// Failed moderation.
    Rejected,
    /// Any state discovery does not know about.
    #[serde(other)]
    Other,
}

/// Read-only listing projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingProjection {
    /// Store identifier.
    pub id: ListingId,
    /// Seller supplied title.
    pub title: String,
    /// Asking price; `None` for "negotiable" listings.
    #[serde(default)]
    pub price: Option<f64>,
    /// ISO currency code.
    pub currency: String,
    /// Top-level category.
    pub category_id: String,
    /// Optional subcategory.
    #[serde(default)]
    pub subcategory_id: Option<String>,
    /// Publication instant.
    pub created_at: DateTime<Utc>,
    /// Lifecycle state.
    pub status: ListingStatus,
    /// Moderation state.
    pub moderation_status: ModerationStatus,
    /// Listing location.
    pub location: GeoPoint,
    /// Photo URLs in display order.
    #[serde(default)]
    pub photos: Vec<String>,
}

impl ListingProjection {
    /// Active and approved listings are the only ones discovery may return.
    #[must_use]
    pub fn is_discoverable(&self) -> bool {
        self.status == ListingStatus::Active && self.moderation_status == ModerationStatus::Approved
    }
}

/// A listing that passed every post-filter, paired with its distance from
/// the query centre.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingCandidate {
    /// The listing.
    pub listing: ListingProjection,
    /// Great-circle distance from the query centre.
    pub distance_km: f64,
}

/// Feed entry returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    /// Store identifier.
    pub id: ListingId,
    /// Seller supplied title.
    pub title: String,
    /// Asking price.
    pub price: Option<f64>,
    /// ISO currency code.
    pub currency: String,
    /// Top-level category.
    pub category_id: String,
    /// Optional subcategory.
    pub subcategory_id: Option<String>,
    /// Publication instant.
    pub created_at: DateTime<Utc>,
    /// Listing location.
    pub location: GeoPoint,
    /// Photo URLs.
    pub photos: Vec<String>,
    /// Distance from the query centre.
    pub distance_km: f64,
}

impl From<ListingCandidate> for FeedItem {
    fn from(candidate: ListingCandidate) -> Self {
        let ListingCandidate {
            listing,
            distance_km,
        } = candidate;
        Self {
            id: listing.id,
            title: listing.title,
            price: listing.price,
            currency: listing.currency,
            category_id: listing.category_id,
            subcategory_id: listing.subcategory_id,
            created_at: listing.created_at,
            location: listing.location,
            photos: listing.photos,
            distance_km,
        }
    }
}
