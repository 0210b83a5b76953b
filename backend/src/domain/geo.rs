//! Geographic primitives: validated points, great-circle distance and
//! geohash encoding.
#![expect(
    clippy::float_arithmetic,
    reason = "great-circle and geohash maths operate on f64 coordinates"
)]

use serde::{Deserialize, Serialize};

/// Mean Earth radius used for haversine distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometres spanned by one degree of latitude (and of longitude at the
/// equator) on the haversine sphere.
pub const KM_PER_DEGREE: f64 = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;

/// Longest geohash the encoder will produce.
pub const MAX_GEOHASH_PRECISION: usize = 12;

const GEOHASH_ALPHABET: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Validation failures for [`GeoPoint::try_new`].
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum GeoPointError {
    /// Latitude was NaN or infinite.
    #[error("latitude must be a finite number")]
    NonFiniteLatitude,
    /// Longitude was NaN or infinite.
    #[error("longitude must be a finite number")]
    NonFiniteLongitude,
    /// Latitude outside `[-90, 90]`.
    #[error("latitude {value} is outside [-90, 90]")]
    LatitudeOutOfRange {
        /// Rejected value.
        value: f64,
    },
    /// Longitude outside `[-180, 180]`.
    #[error("longitude {value} is outside [-180, 180]")]
    LongitudeOutOfRange {
        /// Rejected value.
        value: f64,
    },
}

/// WGS84 coordinate in decimal degrees.
///
/// Fields are public because store projections may carry unvalidated
/// coordinates; request input goes through [`GeoPoint::try_new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl GeoPoint {
    /// Build a point without validation.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Build a point, rejecting non-finite or out-of-range coordinates.
    ///
    /// # Examples
    /// ```
    /// use discovery::domain::GeoPoint;
    ///
    /// assert!(GeoPoint::try_new(53.9, 27.5667).is_ok());
    /// assert!(GeoPoint::try_new(200.0, 27.5667).is_err());
    /// ```
    ///
    /// # Errors
    /// Returns a [`GeoPointError`] describing the first offending axis.
    pub fn try_new(lat: f64, lng: f64) -> Result<Self, GeoPointError> {
        if !lat.is_finite() {
            return Err(GeoPointError::NonFiniteLatitude);
        }
        if !lng.is_finite() {
            return Err(GeoPointError::NonFiniteLongitude);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(GeoPointError::LatitudeOutOfRange { value: lat });
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(GeoPointError::LongitudeOutOfRange { value: lng });
        }
        Ok(Self { lat, lng })
    }

    /// Whether both coordinates are finite.
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// Haversine distance in kilometres.
///
/// Returns `None` when either point carries a non-finite coordinate; callers
/// must drop such candidates rather than treat them as zero distance.
///
/// # Examples
/// ```
/// use discovery::domain::{distance_km, GeoPoint};
///
/// let minsk = GeoPoint::new(53.9, 27.5667);
/// assert_eq!(distance_km(minsk, minsk), Some(0.0));
/// assert!(distance_km(minsk, GeoPoint::new(f64::NAN, 0.0)).is_none());
/// ```
#[must_use]
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> Option<f64> {
    if !a.is_finite() || !b.is_finite() {
        return None;
    }
    // Absolute deltas keep the result bit-identical when the arguments swap.
    let d_lat = (b.lat - a.lat).abs().to_radians();
    let d_lng = (b.lng - a.lng).abs().to_radians();
    let half_lat = (d_lat / 2.0).sin();
    let half_lng = (d_lng / 2.0).sin();
    let cos_product = a.lat.to_radians().cos() * b.lat.to_radians().cos();
    let h = (half_lat * half_lat + cos_product * half_lng * half_lng).clamp(0.0, 1.0);
    let central_angle = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    Some(EARTH_RADIUS_KM * central_angle)
}

/// Encode `point` as a base32 geohash of `precision` characters.
///
/// Precision is clamped to `1..=12`. Returns `None` for non-finite points.
///
/// # Examples
/// ```
/// use discovery::domain::{encode_geohash, GeoPoint};
///
/// let hash = encode_geohash(GeoPoint::new(57.64911, 10.40744), 11);
/// assert_eq!(hash.as_deref(), Some("u4pruydqqvj"));
/// ```
#[must_use]
pub fn encode_geohash(point: GeoPoint, precision: usize) -> Option<String> {
    if !point.is_finite() {
        return None;
    }
    let length = precision.clamp(1, MAX_GEOHASH_PRECISION);
    let mut lat_range = (-90.0_f64, 90.0_f64);
    let mut lng_range = (-180.0_f64, 180.0_f64);
    let mut hash = String::with_capacity(length);
    let mut even_bit = true;
    while hash.len() < length {
        let mut symbol = 0_usize;
        for _ in 0..5 {
            let (range, value) = if even_bit {
                (&mut lng_range, point.lng)
            } else {
                (&mut lat_range, point.lat)
            };
            let mid = (range.0 + range.1) / 2.0;
            symbol <<= 1;
            if value >= mid {
                symbol |= 1;
                range.0 = mid;
            } else {
                range.1 = mid;
            }
            even_bit = !even_bit;
        }
        let ch = GEOHASH_ALPHABET.get(symbol).copied().map(char::from)?;
        hash.push(ch);
    }
    Some(hash)
}
