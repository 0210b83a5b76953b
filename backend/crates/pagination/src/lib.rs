//! Opaque cursor and page envelope primitives shared by discovery endpoints.
//!
//! Cursors are keyset pagination tokens: the sort key and identifier of the
//! last item a client has seen, serialised to JSON and wrapped in unpadded
//! base64url so clients treat them as opaque strings. Offsets never appear in
//! a token, so inserting rows between page fetches cannot shift a page
//! boundary. Floating-point keys decode to the exact bits they were encoded
//! from, so a boundary item always compares equal to its own cursor.
//!
//! ```
//! use pagination::{Cursor, Paginated};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
//! struct Boundary {
//!     created_at: i64,
//!     id: String,
//! }
//!
//! let cursor = Cursor::new(Boundary { created_at: 42, id: "a".to_owned() });
//! let token = cursor.encode()?;
//! let decoded: Cursor<Boundary> = Cursor::decode(&token)?;
//! assert_eq!(decoded.key(), cursor.key());
//!
//! let (items, has_more) = pagination::split_overfetched(vec![1, 2, 3], 2);
//! let page = Paginated::new(items, None, has_more);
//! assert!(page.has_more);
//! # Ok::<(), pagination::CursorError>(())
//! ```

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on the encoded token length accepted by [`Cursor::decode`].
pub const MAX_CURSOR_TOKEN_LEN: usize = 1024;

/// Errors raised while encoding or decoding cursor tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    /// The supplied token was empty or whitespace.
    #[error("cursor token must not be empty")]
    Empty,
    /// The supplied token exceeds [`MAX_CURSOR_TOKEN_LEN`].
    #[error("cursor token exceeds {max} characters")]
    TooLong {
        /// Maximum accepted token length.
        max: usize,
    },
    /// The token is not valid unpadded base64url.
    #[error("cursor token is not valid base64url: {message}")]
    Encoding {
        /// Decoder diagnostic.
        message: String,
    },
    /// The decoded payload does not match the expected key shape.
    #[error("cursor payload is malformed: {message}")]
    Payload {
        /// Serde diagnostic.
        message: String,
    },
}

/// Keyset cursor wrapping the boundary key of the last emitted item.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor<K> {
    key: K,
}

impl<K> Cursor<K> {
    /// Wrap a boundary key.
    pub const fn new(key: K) -> Self {
        Self { key }
    }

    /// Borrow the boundary key.
    pub const fn key(&self) -> &K {
        &self.key
    }

    /// Consume the cursor and return its boundary key.
    pub fn into_key(self) -> K {
        self.key
    }
}

impl<K> Cursor<K>
where
    K: Serialize,
{
    /// Encode the cursor as an opaque base64url token.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::Payload`] when the key cannot be serialised.
    pub fn encode(&self) -> Result<String, CursorError> {
        let json = serde_json::to_vec(&self.key).map_err(|err| CursorError::Payload {
            message: err.to_string(),
        })?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }
}

impl<K> Cursor<K>
where
    K: DeserializeOwned,
{
    /// Decode an opaque token produced by [`Cursor::encode`].
    ///
    /// # Errors
    ///
    /// Returns a [`CursorError`] when the token is empty, oversized, not
    /// base64url, or does not deserialise into `K`.
    pub fn decode(token: &str) -> Result<Self, CursorError> {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(CursorError::Empty);
        }
        if trimmed.len() > MAX_CURSOR_TOKEN_LEN {
            return Err(CursorError::TooLong {
                max: MAX_CURSOR_TOKEN_LEN,
            });
        }
        let bytes = URL_SAFE_NO_PAD
            .decode(trimmed)
            .map_err(|err| CursorError::Encoding {
                message: err.to_string(),
            })?;
        let key = serde_json::from_slice(&bytes).map_err(|err| CursorError::Payload {
            message: err.to_string(),
        })?;
        Ok(Self { key })
    }
}

/// Page envelope returned by cursor-paginated endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    /// Items on this page, already ordered.
    pub items: Vec<T>,
    /// Token for the next page; `None` on the final page.
    pub next_cursor: Option<String>,
    /// Whether another page exists beyond this one.
    pub has_more: bool,
}

impl<T> Paginated<T> {
    /// Build a page envelope.
    pub const fn new(items: Vec<T>, next_cursor: Option<String>, has_more: bool) -> Self {
        Self {
            items,
            next_cursor,
            has_more,
        }
    }

    /// An empty final page.
    pub const fn empty() -> Self {
        Self::new(Vec::new(), None, false)
    }
}

impl<T> Default for Paginated<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Clamp a requested page size into `1..=max`, using `default` when absent.
///
/// Zero is lifted to one rather than rejected; callers that must reject
/// non-positive sizes validate before clamping.
pub fn clamp_page_size(requested: Option<usize>, default: usize, max: usize) -> usize {
    requested.unwrap_or(default).clamp(1, max.max(1))
}

/// Split an over-fetched result (`limit + 1` rows) into the page and a
/// `has_more` flag.
pub fn split_overfetched<T>(mut rows: Vec<T>, limit: usize) -> (Vec<T>, bool) {
    let has_more = rows.len() > limit;
    rows.truncate(limit);
    (rows, has_more)
}
