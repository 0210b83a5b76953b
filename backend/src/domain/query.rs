//! Validated discovery requests.
//!
//! Inbound adapters collect raw parameters into the `*Draft` structs; the
//! `TryFrom` conversions below are the only way to obtain a query the engine
//! accepts. Every check runs before any collaborator is called, so a bad
//! coordinate never reaches the listing store.

use std::fmt;
use std::str::FromStr;

use pagination::clamp_page_size;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::activity::GeoFilter;
use super::error::DomainError;
use super::feed::FeedCursor;
use super::geo::{GeoPoint, GeoPointError, MAX_GEOHASH_PRECISION};
use super::listing::ListingProjection;
use super::trends::TrendKind;

/// Largest accepted search radius.
pub const MAX_RADIUS_KM: f64 = 500.0;
/// Feed page size when the client does not ask for one.
pub const DEFAULT_PAGE_SIZE: usize = 20;
/// Feed page sizes above this are clamped.
pub const MAX_PAGE_SIZE: usize = 100;
/// Smallest supported map zoom.
pub const MIN_ZOOM: u8 = 1;
/// Largest supported map zoom.
pub const MAX_ZOOM: u8 = 20;
/// Zoom used by the overview when none is supplied.
pub const DEFAULT_OVERVIEW_ZOOM: u8 = 12;
/// Trend window when the client does not ask for one.
pub const DEFAULT_WINDOW_HOURS: u32 = 24;
/// Longest accepted trend window (one week).
pub const MAX_WINDOW_HOURS: u32 = 168;
/// Trend result size when the client does not ask for one.
pub const DEFAULT_TREND_LIMIT: usize = 10;
/// Trend result sizes above this are clamped.
pub const MAX_TREND_LIMIT: usize = 50;

const GEOHASH_ALPHABET: &str = "0123456789bcdefghjkmnpqrstuvwxyz";

/// Feed ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    /// Nearest first, then id ascending.
    #[default]
    Distance,
    /// Most recently created first, then id descending.
    Newest,
    /// Lowest price first with unpriced listings last, then id ascending.
    Cheapest,
}

impl SortBy {
    /// Wire name of the ordering.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Distance => "distance",
            Self::Newest => "newest",
            Self::Cheapest => "cheapest",
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = DiscoveryValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "distance" => Ok(Self::Distance),
            "newest" => Ok(Self::Newest),
            "cheapest" => Ok(Self::Cheapest),
            other => Err(DiscoveryValidationError::Unsupported {
                field: "sortBy",
                value: other.to_owned(),
            }),
        }
    }
}

/// Rejections raised while validating discovery parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiscoveryValidationError {
    /// A required parameter was absent.
    #[error("{field} is required")]
    Missing {
        /// Wire name of the parameter.
        field: &'static str,
    },
    /// A numeric parameter was NaN or infinite.
    #[error("{field} must be a finite number")]
    NotFinite {
        /// Wire name of the parameter.
        field: &'static str,
    },
    /// A parameter fell outside its accepted range.
    #[error("{field} must be {expected}")]
    OutOfRange {
        /// Wire name of the parameter.
        field: &'static str,
        /// Offending value, rendered for the client.
        value: String,
        /// Human readable accepted range.
        expected: &'static str,
    },
    /// An enumerated parameter carried an unknown value.
    #[error("{field} does not support '{value}'")]
    Unsupported {
        /// Wire name of the parameter.
        field: &'static str,
        /// Offending value.
        value: String,
    },
    /// `priceMin` exceeded `priceMax`.
    #[error("priceMin must not exceed priceMax")]
    InvertedPriceRange,
    /// The cursor token could not be decoded.
    #[error("cursor is malformed: {message}")]
    InvalidCursor {
        /// Decoder diagnostic.
        message: String,
    },
    /// The cursor was minted for another ordering.
    #[error("cursor was issued for sortBy={issued} but the request uses sortBy={requested}")]
    CursorSortMismatch {
        /// Ordering the cursor belongs to.
        issued: SortBy,
        /// Ordering of the current request.
        requested: SortBy,
    },
}

impl DiscoveryValidationError {
    /// Wire name of the offending parameter.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Missing { field }
            | Self::NotFinite { field }
            | Self::OutOfRange { field, .. }
            | Self::Unsupported { field, .. } => field,
            Self::InvertedPriceRange => "priceMin",
            Self::InvalidCursor { .. } | Self::CursorSortMismatch { .. } => "cursor",
        }
    }

    /// Machine readable rejection code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Missing { .. } => "missing_field",
            Self::NotFinite { .. } => "not_finite",
            Self::OutOfRange { .. } => "out_of_range",
            Self::Unsupported { .. } => "unsupported_value",
            Self::InvertedPriceRange => "inverted_range",
            Self::InvalidCursor { .. } => "invalid_cursor",
            Self::CursorSortMismatch { .. } => "cursor_sort_mismatch",
        }
    }

    fn value(&self) -> Option<Value> {
        match self {
            Self::OutOfRange { value, .. } | Self::Unsupported { value, .. } => {
                Some(Value::String(value.clone()))
            }
            Self::CursorSortMismatch { issued, .. } => Some(Value::String(issued.to_string())),
            Self::Missing { .. }
            | Self::NotFinite { .. }
            | Self::InvertedPriceRange
            | Self::InvalidCursor { .. } => None,
        }
    }
}

impl From<DiscoveryValidationError> for DomainError {
    fn from(err: DiscoveryValidationError) -> Self {
        let mut details = json!({ "field": err.field(), "code": err.code() });
        if let (Some(value), Some(map)) = (err.value(), details.as_object_mut()) {
            map.insert("value".to_owned(), value);
        }
        Self::invalid_request(err.to_string()).with_details(details)
    }
}

/// Optional non-spatial listing predicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingFilters {
    /// Restrict to a top-level category.
    pub category_id: Option<String>,
    /// Restrict to a subcategory.
    pub subcategory_id: Option<String>,
    /// Inclusive lower price bound.
    pub price_min: Option<f64>,
    /// Inclusive upper price bound.
    pub price_max: Option<f64>,
}

impl ListingFilters {
    /// Whether `listing` satisfies every predicate present.
    ///
    /// When either price bound is set, unpriced listings do not match.
    #[must_use]
    pub fn matches(&self, listing: &ListingProjection) -> bool {
        let category_ok = self
            .category_id
            .as_ref()
            .is_none_or(|category| *category == listing.category_id);
        let subcategory_ok = self
            .subcategory_id
            .as_ref()
            .is_none_or(|sub| listing.subcategory_id.as_ref() == Some(sub));
        let price_ok = if self.price_min.is_none() && self.price_max.is_none() {
            true
        } else {
            listing.price.is_some_and(|price| {
                self.price_min.is_none_or(|min| price >= min)
                    && self.price_max.is_none_or(|max| price <= max)
            })
        };
        category_ok && subcategory_ok && price_ok
    }

    fn validate(self) -> Result<Self, DiscoveryValidationError> {
        let price_min = self
            .price_min
            .map(|value| non_negative("priceMin", value))
            .transpose()?;
        let price_max = self
            .price_max
            .map(|value| non_negative("priceMax", value))
            .transpose()?;
        if let (Some(min), Some(max)) = (price_min, price_max) {
            if min > max {
                return Err(DiscoveryValidationError::InvertedPriceRange);
            }
        }
        Ok(Self {
            category_id: non_blank(self.category_id),
            subcategory_id: non_blank(self.subcategory_id),
            price_min,
            price_max,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|trimmed| !trimmed.is_empty())
}

fn non_negative(field: &'static str, value: f64) -> Result<f64, DiscoveryValidationError> {
    if !value.is_finite() {
        return Err(DiscoveryValidationError::NotFinite { field });
    }
    if value < 0.0 {
        return Err(DiscoveryValidationError::OutOfRange {
            field,
            value: value.to_string(),
            expected: "zero or greater",
        });
    }
    Ok(value)
}

fn validate_center(lat: Option<f64>, lng: Option<f64>) -> Result<GeoPoint, DiscoveryValidationError> {
    let lat_value = lat.ok_or(DiscoveryValidationError::Missing { field: "lat" })?;
    let lng_value = lng.ok_or(DiscoveryValidationError::Missing { field: "lng" })?;
    GeoPoint::try_new(lat_value, lng_value).map_err(|err| match err {
        GeoPointError::NonFiniteLatitude => DiscoveryValidationError::NotFinite { field: "lat" },
        GeoPointError::NonFiniteLongitude => DiscoveryValidationError::NotFinite { field: "lng" },
        GeoPointError::LatitudeOutOfRange { value } => DiscoveryValidationError::OutOfRange {
            field: "lat",
            value: value.to_string(),
            expected: "between -90 and 90",
        },
        GeoPointError::LongitudeOutOfRange { value } => DiscoveryValidationError::OutOfRange {
            field: "lng",
            value: value.to_string(),
            expected: "between -180 and 180",
        },
    })
}

fn validate_radius(radius_km: Option<f64>) -> Result<f64, DiscoveryValidationError> {
    let value = radius_km.ok_or(DiscoveryValidationError::Missing { field: "radiusKm" })?;
    if !value.is_finite() {
        return Err(DiscoveryValidationError::NotFinite { field: "radiusKm" });
    }
    if value <= 0.0 || value > MAX_RADIUS_KM {
        return Err(DiscoveryValidationError::OutOfRange {
            field: "radiusKm",
            value: value.to_string(),
            expected: "greater than 0 and at most 500",
        });
    }
    Ok(value)
}

fn validate_size(
    field: &'static str,
    requested: Option<i64>,
    default: usize,
    max: usize,
) -> Result<usize, DiscoveryValidationError> {
    let Some(raw) = requested else {
        return Ok(default);
    };
    let size = usize::try_from(raw)
        .ok()
        .filter(|size| *size >= 1)
        .ok_or_else(|| DiscoveryValidationError::OutOfRange {
            field,
            value: raw.to_string(),
            expected: "at least 1",
        })?;
    Ok(clamp_page_size(Some(size), default, max))
}

fn validate_zoom(zoom: Option<i64>, default: Option<u8>) -> Result<u8, DiscoveryValidationError> {
    let raw = match (zoom, default) {
        (Some(raw), _) => raw,
        (None, Some(fallback)) => return Ok(fallback),
        (None, None) => return Err(DiscoveryValidationError::Missing { field: "zoom" }),
    };
    u8::try_from(raw)
        .ok()
        .filter(|zoom| (MIN_ZOOM..=MAX_ZOOM).contains(zoom))
        .ok_or_else(|| DiscoveryValidationError::OutOfRange {
            field: "zoom",
            value: raw.to_string(),
            expected: "between 1 and 20",
        })
}

fn validate_hours(hours: Option<i64>) -> Result<u32, DiscoveryValidationError> {
    let Some(raw) = hours else {
        return Ok(DEFAULT_WINDOW_HOURS);
    };
    u32::try_from(raw)
        .ok()
        .filter(|hours| (1..=MAX_WINDOW_HOURS).contains(hours))
        .ok_or_else(|| DiscoveryValidationError::OutOfRange {
            field: "hours",
            value: raw.to_string(),
            expected: "between 1 and 168",
        })
}

fn validate_geohash_prefix(raw: String) -> Result<String, DiscoveryValidationError> {
    let prefix = raw.trim().to_ascii_lowercase();
    let well_formed = !prefix.is_empty()
        && prefix.len() <= MAX_GEOHASH_PRECISION
        && prefix.chars().all(|c| GEOHASH_ALPHABET.contains(c));
    if well_formed {
        Ok(prefix)
    } else {
        Err(DiscoveryValidationError::Unsupported {
            field: "geohashPrefix",
            value: raw,
        })
    }
}

fn validate_cursor(
    token: Option<String>,
    sort_by: SortBy,
) -> Result<Option<FeedCursor>, DiscoveryValidationError> {
    let Some(raw) = token.filter(|t| !t.trim().is_empty()) else {
        return Ok(None);
    };
    let cursor = FeedCursor::decode(&raw).map_err(|err| DiscoveryValidationError::InvalidCursor {
        message: err.to_string(),
    })?;
    if cursor.sort_by() != sort_by {
        return Err(DiscoveryValidationError::CursorSortMismatch {
            issued: cursor.sort_by(),
            requested: sort_by,
        });
    }
    Ok(Some(cursor))
}

/// Raw feed parameters as received from a client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryQueryDraft {
    /// Centre latitude.
    pub lat: Option<f64>,
    /// Centre longitude.
    pub lng: Option<f64>,
    /// Search radius.
    pub radius_km: Option<f64>,
    /// Non-spatial predicates.
    pub filters: ListingFilters,
    /// Requested ordering.
    pub sort_by: Option<String>,
    /// Requested page size.
    pub limit: Option<i64>,
    /// Cursor from the previous page.
    pub cursor: Option<String>,
}

/// A validated feed request.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryQuery {
    /// Query centre.
    pub center: GeoPoint,
    /// Search radius in `(0, 500]`.
    pub radius_km: f64,
    /// Non-spatial predicates.
    pub filters: ListingFilters,
    /// Feed ordering.
    pub sort_by: SortBy,
    /// Page size in `1..=100`.
    pub limit: usize,
    /// Boundary of the previous page.
    pub cursor: Option<FeedCursor>,
}

impl TryFrom<DiscoveryQueryDraft> for DiscoveryQuery {
    type Error = DiscoveryValidationError;

    fn try_from(draft: DiscoveryQueryDraft) -> Result<Self, Self::Error> {
        let center = validate_center(draft.lat, draft.lng)?;
        let radius_km = validate_radius(draft.radius_km)?;
        let filters = draft.filters.validate()?;
        let sort_by = draft
            .sort_by
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(SortBy::from_str)
            .transpose()?
            .unwrap_or_default();
        let limit = validate_size("limit", draft.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE)?;
        let cursor = validate_cursor(draft.cursor, sort_by)?;
        Ok(Self {
            center,
            radius_km,
            filters,
            sort_by,
            limit,
            cursor,
        })
    }
}

/// Raw cluster parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterQueryDraft {
    /// Centre latitude.
    pub lat: Option<f64>,
    /// Centre longitude.
    pub lng: Option<f64>,
    /// Search radius.
    pub radius_km: Option<f64>,
    /// Map zoom level.
    pub zoom: Option<i64>,
    /// Restrict to a top-level category.
    pub category_id: Option<String>,
}

/// A validated cluster request.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterQuery {
    /// Query centre.
    pub center: GeoPoint,
    /// Search radius.
    pub radius_km: f64,
    /// Zoom in `1..=20`.
    pub zoom: u8,
    /// Category predicate only; clusters ignore price and subcategory.
    pub filters: ListingFilters,
}

impl TryFrom<ClusterQueryDraft> for ClusterQuery {
    type Error = DiscoveryValidationError;

    fn try_from(draft: ClusterQueryDraft) -> Result<Self, Self::Error> {
        Ok(Self {
            center: validate_center(draft.lat, draft.lng)?,
            radius_km: validate_radius(draft.radius_km)?,
            zoom: validate_zoom(draft.zoom, None)?,
            filters: ListingFilters {
                category_id: non_blank(draft.category_id),
                ..ListingFilters::default()
            },
        })
    }
}

/// Raw trend parameters shared by hotspot and trending endpoints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrendQueryDraft {
    /// Centre latitude.
    pub lat: Option<f64>,
    /// Centre longitude.
    pub lng: Option<f64>,
    /// Search radius.
    pub radius_km: Option<f64>,
    /// Signal kind; required for hotspots, fixed by the trending endpoints.
    pub kind: Option<String>,
    /// Window length in hours.
    pub hours: Option<i64>,
    /// Maximum number of signals.
    pub limit: Option<i64>,
    /// Geohash scope replacing the radius scope.
    pub geohash_prefix: Option<String>,
}

/// A validated trend request.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendQuery {
    /// Signal kind.
    pub kind: TrendKind,
    /// Query centre; part of the scope unless a geohash prefix replaces it.
    pub center: GeoPoint,
    /// Search radius.
    pub radius_km: f64,
    /// Geographic scope.
    pub scope: GeoFilter,
    /// Window length in `1..=168` hours.
    pub window_hours: u32,
    /// Maximum number of signals in `1..=50`.
    pub limit: usize,
}

impl TrendQuery {
    /// Validate a draft whose kind is fixed by the endpoint.
    ///
    /// # Errors
    /// Returns the first [`DiscoveryValidationError`] encountered.
    pub fn with_kind(kind: TrendKind, draft: TrendQueryDraft) -> Result<Self, DiscoveryValidationError> {
        Self::try_from(TrendQueryDraft {
            kind: Some(kind.as_str().to_owned()),
            ..draft
        })
    }
}

impl TryFrom<TrendQueryDraft> for TrendQuery {
    type Error = DiscoveryValidationError;

    fn try_from(draft: TrendQueryDraft) -> Result<Self, Self::Error> {
        let center = validate_center(draft.lat, draft.lng)?;
        let radius_km = validate_radius(draft.radius_km)?;
        let kind_raw = draft
            .kind
            .ok_or(DiscoveryValidationError::Missing { field: "type" })?;
        let kind = kind_raw.trim().parse::<TrendKind>().map_err(|_| {
            DiscoveryValidationError::Unsupported {
                field: "type",
                value: kind_raw.clone(),
            }
        })?;
        let scope = match draft.geohash_prefix.filter(|p| !p.trim().is_empty()) {
            Some(prefix) => GeoFilter::GeohashPrefix(validate_geohash_prefix(prefix)?),
            None => GeoFilter::Radius { center, radius_km },
        };
        Ok(Self {
            kind,
            center,
            radius_km,
            scope,
            window_hours: validate_hours(draft.hours)?,
            limit: validate_size("limit", draft.limit, DEFAULT_TREND_LIMIT, MAX_TREND_LIMIT)?,
        })
    }
}

/// Raw overview parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverviewQueryDraft {
    /// Centre latitude.
    pub lat: Option<f64>,
    /// Centre longitude.
    pub lng: Option<f64>,
    /// Search radius.
    pub radius_km: Option<f64>,
    /// Map zoom level; defaults to 12.
    pub zoom: Option<i64>,
    /// Feed page size.
    pub limit: Option<i64>,
}

/// A validated overview request: first feed page, clusters and trending
/// searches for one viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct OverviewQuery {
    /// Query centre.
    pub center: GeoPoint,
    /// Search radius.
    pub radius_km: f64,
    /// Zoom in `1..=20`.
    pub zoom: u8,
    /// Feed page size.
    pub limit: usize,
}

impl OverviewQuery {
    /// Feed section request.
    #[must_use]
    pub fn feed(&self) -> DiscoveryQuery {
        DiscoveryQuery {
            center: self.center,
            radius_km: self.radius_km,
            filters: ListingFilters::default(),
            sort_by: SortBy::Distance,
            limit: self.limit,
            cursor: None,
        }
    }

    /// Cluster section request.
    #[must_use]
    pub fn clusters(&self) -> ClusterQuery {
        ClusterQuery {
            center: self.center,
            radius_km: self.radius_km,
            zoom: self.zoom,
            filters: ListingFilters::default(),
        }
    }

    /// Trending searches section request.
    #[must_use]
    pub fn trending(&self) -> TrendQuery {
        TrendQuery {
            kind: TrendKind::Demand,
            center: self.center,
            radius_km: self.radius_km,
            scope: GeoFilter::Radius {
                center: self.center,
                radius_km: self.radius_km,
            },
            window_hours: DEFAULT_WINDOW_HOURS,
            limit: DEFAULT_TREND_LIMIT,
        }
    }
}

impl TryFrom<OverviewQueryDraft> for OverviewQuery {
    type Error = DiscoveryValidationError;

    fn try_from(draft: OverviewQueryDraft) -> Result<Self, Self::Error> {
        Ok(Self {
            center: validate_center(draft.lat, draft.lng)?,
            radius_km: validate_radius(draft.radius_km)?,
            zoom: validate_zoom(draft.zoom, Some(DEFAULT_OVERVIEW_ZOOM))?,
            limit: validate_size("limit", draft.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE)?,
        })
    }
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
