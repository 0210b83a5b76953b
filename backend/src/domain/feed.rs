//! Geo feed assembly: ordering, keyset cursors and page slicing.
//!
//! A page is everything strictly after the cursor boundary in feed order,
//! truncated to `limit`. One extra row is taken to learn whether another page
//! exists. Because the boundary is a `(sort key, id)` pair and never an
//! offset, listings inserted between requests cannot shift or repeat items.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use pagination::{Cursor, CursorError, Paginated, split_overfetched};
use serde::{Deserialize, Serialize};

use super::listing::{FeedItem, ListingCandidate, ListingId};
use super::query::SortBy;

/// One page of the discovery feed.
pub type FeedPage = Paginated<FeedItem>;

/// Boundary of the last item a client has seen.
///
/// The variant records the sort order the cursor was minted for, so a token
/// cannot be replayed under a different `sortBy`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "sort", rename_all = "camelCase")]
pub enum FeedCursor {
    /// Nearest first.
    Distance {
        /// Distance of the boundary item in kilometres.
        km: f64,
        /// Boundary item identifier.
        id: ListingId,
    },
    /// Most recent first.
    Newest {
        /// Creation instant of the boundary item.
        at: DateTime<Utc>,
        /// Boundary item identifier.
        id: ListingId,
    },
    /// Cheapest first, unpriced listings last.
    Cheapest {
        /// Price of the boundary item.
        price: Option<f64>,
        /// Boundary item identifier.
        id: ListingId,
    },
}

impl FeedCursor {
    /// Sort key of `candidate` under `sort_by`.
    #[must_use]
    pub fn for_candidate(sort_by: SortBy, candidate: &ListingCandidate) -> Self {
        let id = candidate.listing.id.clone();
        match sort_by {
            SortBy::Distance => Self::Distance {
                km: candidate.distance_km,
                id,
            },
            SortBy::Newest => Self::Newest {
                at: candidate.listing.created_at,
                id,
            },
            SortBy::Cheapest => Self::Cheapest {
                price: candidate.listing.price,
                id,
            },
        }
    }

    /// Sort order this cursor belongs to.
    #[must_use]
    pub const fn sort_by(&self) -> SortBy {
        match self {
            Self::Distance { .. } => SortBy::Distance,
            Self::Newest { .. } => SortBy::Newest,
            Self::Cheapest { .. } => SortBy::Cheapest,
        }
    }

    /// Encode as an opaque client token.
    ///
    /// # Errors
    /// Returns [`CursorError::Payload`] when serialisation fails.
    pub fn encode(&self) -> Result<String, CursorError> {
        Cursor::new(self).encode()
    }

    /// Decode a client token.
    ///
    /// # Errors
    /// Returns a [`CursorError`] for malformed tokens.
    pub fn decode(token: &str) -> Result<Self, CursorError> {
        Cursor::<Self>::decode(token).map(Cursor::into_key)
    }

    /// Position of `self` relative to `other` in feed order, or `None` when
    /// the two keys belong to different sort orders.
    #[must_use]
    pub fn feed_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Distance { km: a, id: a_id }, Self::Distance { km: b, id: b_id }) => {
                Some(a.total_cmp(b).then_with(|| a_id.cmp(b_id)))
            }
            (Self::Newest { at: a, id: a_id }, Self::Newest { at: b, id: b_id }) => {
                Some(b.cmp(a).then_with(|| b_id.cmp(a_id)))
            }
            (Self::Cheapest { price: a, id: a_id }, Self::Cheapest { price: b, id: b_id }) => {
                Some(price_cmp(*a, *b).then_with(|| a_id.cmp(b_id)))
            }
            _ => None,
        }
    }
}

fn price_cmp(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Assemble one feed page from post-filtered candidates.
///
/// Duplicate listing ids keep their first occurrence. The returned page
/// carries a cursor only when more items follow.
///
/// # Errors
/// Returns a [`CursorError`] when the next-page cursor cannot be encoded.
pub fn assemble_feed(
    candidates: Vec<ListingCandidate>,
    sort_by: SortBy,
    after: Option<&FeedCursor>,
    limit: usize,
) -> Result<FeedPage, CursorError> {
    let mut seen: HashSet<ListingId> = HashSet::with_capacity(candidates.len());
    let mut keyed: Vec<(FeedCursor, ListingCandidate)> = candidates
        .into_iter()
        .filter(|candidate| seen.insert(candidate.listing.id.clone()))
        .map(|candidate| (FeedCursor::for_candidate(sort_by, &candidate), candidate))
        .filter(|(key, _)| {
            after.is_none_or(|boundary| key.feed_cmp(boundary) == Some(Ordering::Greater))
        })
        .collect();
    keyed.sort_by(|(a, _), (b, _)| a.feed_cmp(b).unwrap_or(Ordering::Equal));
    keyed.truncate(limit.saturating_add(1));

    let (page, has_more) = split_overfetched(keyed, limit);
    let next_cursor = match page.last() {
        Some((key, _)) if has_more => Some(key.encode()?),
        _ => None,
    };
    let items = page
        .into_iter()
        .map(|(_, candidate)| FeedItem::from(candidate))
        .collect();
    Ok(Paginated::new(items, next_cursor, has_more))
}

#[cfg(test)]
#[path = "feed_tests.rs"]
mod tests;
