//! apistack Test Utilities
//!
//! Shared test infrastructure for the apistack workspace:
//! - Proptest generators for actor names and list queries
//! - Fixtures for common scenarios
//! - Assertions over store results

// Re-export the in-memory store from its source crate
pub use apistack_storage::{InMemoryActorStore, InMemoryListCache};

// Re-export core types for convenience
pub use apistack_core::{
    Actor, ActorId, ActorNames, ListQuery, StoreError, StoreResult, Timestamp,
};

pub mod generators {
    //! Proptest strategies for generating actor data.

    use super::*;
    use proptest::prelude::*;

    /// Generate a plausible single name: a capital letter followed by
    /// lowercase letters, optionally hyphenated.
    pub fn arb_name() -> impl Strategy<Value = String> {
        prop_oneof![
            "[A-Z][a-z]{1,15}",
            "[A-Z][a-z]{1,8}-[A-Z][a-z]{1,8}",
            "[A-Z]'[A-Z][a-z]{1,10}",
        ]
    }

    /// Generate a name pair as stored (already trimmed).
    pub fn arb_actor_names() -> impl Strategy<Value = ActorNames> {
        (arb_name(), arb_name()).prop_map(|(first, last)| ActorNames::new(first, last))
    }

    /// Generate a list of distinct name pairs.
    pub fn arb_distinct_names(max: usize) -> impl Strategy<Value = Vec<ActorNames>> {
        prop::collection::hash_set(arb_actor_names(), 1..=max.max(1))
            .prop_map(|set| set.into_iter().collect())
    }

    /// Generate a name that is blank after trimming.
    pub fn arb_blank_name() -> impl Strategy<Value = String> {
        "[ \t]{0,5}"
    }

    /// Generate a search term (possibly empty, mixed case).
    pub fn arb_search_term() -> impl Strategy<Value = String> {
        prop_oneof![Just(String::new()), "[a-zA-Z]{1,4}"]
    }

    /// Generate a list query with pagination and order.
    pub fn arb_list_query() -> impl Strategy<Value = ListQuery> {
        (arb_search_term(), 0u64..20, 0u32..20, any::<bool>()).prop_map(
            |(search, offset, limit, desc)| {
                ListQuery::new(search)
                    .with_offset(offset)
                    .with_limit(limit)
                    .descending(desc)
            },
        )
    }
}

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;
    use chrono::Utc;

    /// Name pairs used by search tests: three contain "smith" in some case.
    pub const SEARCH_CAST: &[(&str, &str)] = &[
        ("John", "Smith"),
        ("Ada", "Lovelace"),
        ("Smithy", "Jones"),
        ("Will", "Blacksmith"),
        ("Grace", "Hopper"),
    ];

    /// Build an actor record with the current time.
    pub fn actor(id: i64, first_name: &str, last_name: &str) -> Actor {
        Actor {
            id: ActorId::new(id),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            last_update: Utc::now(),
        }
    }

    /// Create an in-memory store holding the given name pairs, in order.
    pub async fn seeded_store(pairs: &[(&str, &str)]) -> StoreResult<InMemoryActorStore> {
        use apistack_storage::ActorStore;

        let store = InMemoryActorStore::new();
        for (first, last) in pairs {
            store.create(&ActorNames::new(*first, *last)).await?;
        }
        Ok(store)
    }
}

pub mod assertions {
    //! Assertions over store results.

    use super::*;

    /// Assert that a result is a `NotFound` for `id`.
    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &StoreResult<T>, id: ActorId) {
        match result {
            Err(StoreError::NotFound { id: missing }) => assert_eq!(*missing, id),
            other => panic!("Expected NotFound for {}, got: {:?}", id, other),
        }
    }

    /// Assert that a result is a uniqueness or no-op conflict.
    #[track_caller]
    pub fn assert_conflict<T: std::fmt::Debug>(result: &StoreResult<T>) {
        match result {
            Err(e) if e.is_conflict() => {}
            other => panic!("Expected conflict, got: {:?}", other),
        }
    }

    /// Assert that every actor matches `needle` (case-insensitive).
    #[track_caller]
    pub fn assert_all_match(actors: &[Actor], needle: &str) {
        let needle = needle.trim().to_lowercase();
        for actor in actors {
            assert!(
                actor.matches_search(&needle),
                "{} {} does not match '{}'",
                actor.first_name,
                actor.last_name,
                needle
            );
        }
    }

    /// Assert ids are strictly ascending, or strictly descending when
    /// `descending` is set.
    #[track_caller]
    pub fn assert_id_order(actors: &[Actor], descending: bool) {
        for pair in actors.windows(2) {
            let ordered = if descending {
                pair[0].id > pair[1].id
            } else {
                pair[0].id < pair[1].id
            };
            assert!(ordered, "ids out of order: {} then {}", pair[0].id, pair[1].id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::assertions::*;
    use super::fixtures::*;
    use super::generators::*;
    use super::*;
    use apistack_storage::ActorStore;
    use proptest::prelude::*;

    #[test]
    fn test_fixture_actor() {
        let a = actor(3, "Ada", "Lovelace");
        assert_eq!(a.id, ActorId::new(3));
        assert!(a.has_names(&ActorNames::new("Ada", "Lovelace")));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_generated_names_are_storable(names in arb_actor_names()) {
            prop_assert!(!names.first_name.trim().is_empty());
            prop_assert!(!names.last_name.trim().is_empty());
            prop_assert_eq!(names.first_name.trim(), names.first_name.as_str());
            prop_assert!(names.first_name.chars().count() <= 100);
        }

        #[test]
        fn prop_blank_names_trim_to_empty(name in arb_blank_name()) {
            prop_assert!(name.trim().is_empty());
        }
    }

    #[tokio::test]
    async fn test_seeded_store_search() -> StoreResult<()> {
        let store = seeded_store(SEARCH_CAST).await?;
        let smiths = store.list(&ListQuery::new("smith")).await?;
        assert_eq!(smiths.len(), 3);
        assert_all_match(&smiths, "smith");
        assert_id_order(&smiths, false);
        assert_not_found(&store.get(ActorId::new(99)).await, ActorId::new(99));
        Ok(())
    }
}
