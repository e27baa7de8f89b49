//! Cache key derivation for list queries.

use apistack_core::ListQuery;
use std::fmt;

/// Prefix shared by every list cache entry.
const KEY_PREFIX: &str = "actors";

/// Cache key for one page of a list query.
///
/// Derived only from the normalized search term (trimmed, lowercased),
/// offset, limit and order, so equivalent queries share an entry and
/// different pages never collide:
/// `actors:search=<term>:offset=<n>:limit=<n>:desc=<bool>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListCacheKey(String);

impl ListCacheKey {
    pub fn from_query(query: &ListQuery) -> Self {
        Self(format!(
            "{KEY_PREFIX}:search={}:offset={}:limit={}:desc={}",
            query.normalized_search(),
            query.offset,
            query.limit,
            query.order_descending
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ListCacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
