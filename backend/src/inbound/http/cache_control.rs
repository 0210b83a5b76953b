//! Shared cache-control policies for HTTP handlers.

/// Feed pages carry per-request analytics and must not be reused.
pub const PRIVATE_NO_CACHE_MUST_REVALIDATE: &str = "private, no-cache, must-revalidate";

/// Viewport results that may be reused briefly by intermediaries.
pub const PUBLIC_SHORT_LIVED: &str = "public, max-age=30";

/// Aggregated trend results change slowly.
pub const PUBLIC_LONG_LIVED: &str = "public, max-age=300";

/// Build the cache-control header tuple for feed responses.
#[must_use]
pub const fn private_no_cache_header() -> (&'static str, &'static str) {
    ("Cache-Control", PRIVATE_NO_CACHE_MUST_REVALIDATE)
}

/// Build the cache-control header tuple for cluster and overview responses.
#[must_use]
pub const fn short_lived_header() -> (&'static str, &'static str) {
    ("Cache-Control", PUBLIC_SHORT_LIVED)
}

/// Build the cache-control header tuple for trend responses.
#[must_use]
pub const fn long_lived_header() -> (&'static str, &'static str) {
    ("Cache-Control", PUBLIC_LONG_LIVED)
}
