//! Shared parsing helpers for inbound HTTP adapters.
//!
//! Query parameters arrive as strings so malformed numbers surface as
//! structured `invalid_request` errors instead of extractor rejections.
//! Range checks belong to the domain query types.

use serde_json::json;

use crate::domain::DomainError;

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidNumber,
    InvalidInteger,
}

impl ErrorCode {
    const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidNumber => "invalid_number",
            Self::InvalidInteger => "invalid_integer",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    const fn as_str(self) -> &'static str {
        self.0
    }
}

pub(crate) const LAT: FieldName = FieldName::new("lat");
pub(crate) const LNG: FieldName = FieldName::new("lng");
pub(crate) const RADIUS_KM: FieldName = FieldName::new("radiusKm");
pub(crate) const PRICE_MIN: FieldName = FieldName::new("priceMin");
pub(crate) const PRICE_MAX: FieldName = FieldName::new("priceMax");
pub(crate) const LIMIT: FieldName = FieldName::new("limit");
pub(crate) const ZOOM: FieldName = FieldName::new("zoom");
pub(crate) const HOURS: FieldName = FieldName::new("hours");

fn invalid_value(field: FieldName, code: ErrorCode, message: String, value: &str) -> DomainError {
    DomainError::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "value": value,
        "code": code.as_str(),
    }))
}

fn present(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Parse an optional decimal parameter; blank values count as absent.
pub(crate) fn parse_number(field: FieldName, raw: Option<String>) -> Result<Option<f64>, DomainError> {
    present(raw)
        .map(|value| {
            value.parse::<f64>().map_err(|_| {
                invalid_value(
                    field,
                    ErrorCode::InvalidNumber,
                    format!("{} must be a number", field.as_str()),
                    &value,
                )
            })
        })
        .transpose()
}

/// Parse an optional integer parameter; blank values count as absent.
pub(crate) fn parse_integer(field: FieldName, raw: Option<String>) -> Result<Option<i64>, DomainError> {
    present(raw)
        .map(|value| {
            value.parse::<i64>().map_err(|_| {
                invalid_value(
                    field,
                    ErrorCode::InvalidInteger,
                    format!("{} must be an integer", field.as_str()),
                    &value,
                )
            })
        })
        .transpose()
}
