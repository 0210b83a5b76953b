//! Normalised cache keys for discovery responses.
//!
//! A key is built from the request shape, not the raw query string, so
//! parameter order and sub-metre coordinate jitter do not defeat the cache.
//! Coordinates are rounded to three decimals (roughly 100 m); the canonical
//! text is hashed so keys stay short whatever the filters contain.
#![expect(
    clippy::float_arithmetic,
    reason = "coordinate rounding is float maths"
)]

use sha2::{Digest, Sha256};

/// Prefix shared by every discovery cache key.
pub const CACHE_KEY_NAMESPACE: &str = "discovery:v1";

/// Cache key for one discovery response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiscoveryCacheKey(String);

impl DiscoveryCacheKey {
    /// Start a key for `endpoint`.
    ///
    /// # Examples
    /// ```
    /// use discovery::domain::ports::DiscoveryCacheKey;
    ///
    /// let a = DiscoveryCacheKey::builder("feed").coordinate("lat", 53.90012).build();
    /// let b = DiscoveryCacheKey::builder("feed").coordinate("lat", 53.89991).build();
    /// assert_eq!(a, b);
    /// assert!(a.as_str().starts_with("discovery:v1:feed:"));
    /// ```
    #[must_use]
    pub fn builder(endpoint: &'static str) -> DiscoveryCacheKeyBuilder {
        DiscoveryCacheKeyBuilder {
            endpoint,
            canonical: String::new(),
        }
    }

    /// Borrow the key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for DiscoveryCacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for DiscoveryCacheKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Accumulates the canonical request shape.
#[derive(Debug, Clone)]
pub struct DiscoveryCacheKeyBuilder {
    endpoint: &'static str,
    canonical: String,
}

impl DiscoveryCacheKeyBuilder {
    fn push(mut self, name: &str, value: &str) -> Self {
        if !self.canonical.is_empty() {
            self.canonical.push('&');
        }
        self.canonical.push_str(name);
        self.canonical.push('=');
        self.canonical.push_str(value);
        self
    }

    /// Add a coordinate rounded to three decimals.
    #[must_use]
    pub fn coordinate(self, name: &str, degrees: f64) -> Self {
        // `+ 0.0` folds negative zero so -0.0001 and 0.0001 share a key.
        let rounded = (degrees * 1000.0).round() / 1000.0 + 0.0;
        self.push(name, &format!("{rounded:.3}"))
    }

    /// Add a number verbatim.
    #[must_use]
    pub fn number(self, name: &str, value: f64) -> Self {
        self.push(name, &value.to_string())
    }

    /// Add any displayable value.
    #[must_use]
    pub fn field(self, name: &str, value: impl std::fmt::Display) -> Self {
        self.push(name, &value.to_string())
    }

    /// Add an optional value; absent values are recorded as empty.
    #[must_use]
    pub fn optional(self, name: &str, value: Option<impl std::fmt::Display>) -> Self {
        let rendered = value.map(|v| v.to_string()).unwrap_or_default();
        self.push(name, &rendered)
    }

    /// Hash the canonical shape into a namespaced key.
    #[must_use]
    pub fn build(self) -> DiscoveryCacheKey {
        let digest = Sha256::digest(self.canonical.as_bytes());
        DiscoveryCacheKey(format!(
            "{CACHE_KEY_NAMESPACE}:{}:{}",
            self.endpoint,
            hex::encode(digest)
        ))
    }
}
