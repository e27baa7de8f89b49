//! List query parameters understood by every store.

/// Filter, ordering and pagination for listing actors.
///
/// `offset` and `limit` of zero mean "not applied".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub search: String,
    pub offset: u64,
    pub limit: u32,
    pub order_descending: bool,
}

impl ListQuery {
    pub fn new(search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            ..Default::default()
        }
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn descending(mut self, order_descending: bool) -> Self {
        self.order_descending = order_descending;
        self
    }

    /// Search term as matched by stores and cache keys: trimmed, lowercased.
    pub fn normalized_search(&self) -> String {
        self.search.trim().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let query = ListQuery::new("  Smith ");
        assert_eq!(query.offset, 0);
        assert_eq!(query.limit, 0);
        assert!(!query.order_descending);
        assert_eq!(query.normalized_search(), "smith");
    }

    #[test]
    fn test_builder_chain() {
        let query = ListQuery::default()
            .with_offset(10)
            .with_limit(5)
            .descending(true);
        assert_eq!(query.offset, 10);
        assert_eq!(query.limit, 5);
        assert!(query.order_descending);
        assert_eq!(query.normalized_search(), "");
    }
}
