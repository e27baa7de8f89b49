//! In-memory actor store.
//!
//! Reference implementation of [`ActorStore`] used by tests and local runs
//! without PostgreSQL. Each operation holds a single lock for its whole
//! check-then-write sequence, which gives the same atomicity the database
//! store gets from its transactions.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use apistack_core::{Actor, ActorId, ActorNames, ListQuery, StoreError, StoreResult};
use chrono::Utc;

use crate::store::ActorStore;

/// Actor store backed by an ordered map.
///
/// Ids are assigned as max+1 starting at 1. Cloning shares the underlying
/// map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryActorStore {
    actors: Arc<RwLock<BTreeMap<ActorId, Actor>>>,
    offline: Arc<AtomicBool>,
}

impl InMemoryActorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored actors.
    pub fn actor_count(&self) -> usize {
        self.read("count").map(|actors| actors.len()).unwrap_or(0)
    }

    /// Remove every actor.
    pub fn clear(&self) {
        if let Ok(mut actors) = self.write("clear") {
            actors.clear();
        }
    }

    /// Simulate a lost connection: while offline every operation fails with
    /// `StoreError::Internal`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self, operation: &'static str) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::internal(operation, "store is offline"));
        }
        Ok(())
    }

    fn read(
        &self,
        operation: &'static str,
    ) -> StoreResult<RwLockReadGuard<'_, BTreeMap<ActorId, Actor>>> {
        self.actors
            .read()
            .map_err(|_| StoreError::internal(operation, "store lock poisoned"))
    }

    fn write(
        &self,
        operation: &'static str,
    ) -> StoreResult<RwLockWriteGuard<'_, BTreeMap<ActorId, Actor>>> {
        self.actors
            .write()
            .map_err(|_| StoreError::internal(operation, "store lock poisoned"))
    }
}

fn pair_taken(
    actors: &BTreeMap<ActorId, Actor>,
    names: &ActorNames,
    except: Option<ActorId>,
) -> bool {
    actors
        .values()
        .any(|actor| Some(actor.id) != except && actor.has_names(names))
}

fn already_exists(names: &ActorNames) -> StoreError {
    StoreError::AlreadyExists {
        first_name: names.first_name.clone(),
        last_name: names.last_name.clone(),
    }
}

#[async_trait]
impl ActorStore for InMemoryActorStore {
    async fn list(&self, query: &ListQuery) -> StoreResult<Vec<Actor>> {
        self.ensure_online("list")?;
        let actors = self.read("list")?;
        let needle = query.normalized_search();

        let matching = actors.values().filter(|actor| actor.matches_search(&needle));
        let ordered: Box<dyn Iterator<Item = &Actor>> = if query.order_descending {
            Box::new(matching.rev())
        } else {
            Box::new(matching)
        };

        let skip = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let take = match query.limit {
            0 => usize::MAX,
            limit => limit as usize,
        };

        Ok(ordered.skip(skip).take(take).cloned().collect())
    }

    async fn get(&self, id: ActorId) -> StoreResult<Actor> {
        self.ensure_online("get")?;
        let actors = self.read("get")?;
        actors
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { id })
    }

    async fn create(&self, names: &ActorNames) -> StoreResult<ActorId> {
        self.ensure_online("create")?;
        let mut actors = self.write("create")?;

        if pair_taken(&actors, names, None) {
            return Err(already_exists(names));
        }

        let id = match actors.keys().next_back() {
            Some(max) => max
                .next()
                .ok_or_else(|| StoreError::internal("create", "actor id space exhausted"))?,
            None => ActorId::new(1),
        };

        actors.insert(
            id,
            Actor {
                id,
                first_name: names.first_name.clone(),
                last_name: names.last_name.clone(),
                last_update: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn update(&self, id: ActorId, names: &ActorNames) -> StoreResult<Actor> {
        self.ensure_online("update")?;
        let mut actors = self.write("update")?;

        let current = actors.get(&id).ok_or(StoreError::NotFound { id })?;
        if current.has_names(names) {
            return Err(StoreError::NoChanges {
                id,
                first_name: names.first_name.clone(),
                last_name: names.last_name.clone(),
            });
        }
        if pair_taken(&actors, names, Some(id)) {
            return Err(already_exists(names));
        }

        let actor = actors.get_mut(&id).ok_or(StoreError::NotFound { id })?;
        actor.first_name = names.first_name.clone();
        actor.last_name = names.last_name.clone();
        actor.last_update = Utc::now();
        Ok(actor.clone())
    }

    async fn delete(&self, id: ActorId) -> StoreResult<()> {
        self.ensure_online("delete")?;
        let mut actors = self.write("delete")?;
        actors
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound { id })
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.ensure_online("health_check")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(first: &str, last: &str) -> ActorNames {
        ActorNames::new(first, last)
    }

    async fn seeded(pairs: &[(&str, &str)]) -> StoreResult<InMemoryActorStore> {
        let store = InMemoryActorStore::new();
        for (first, last) in pairs {
            store.create(&names(first, last)).await?;
        }
        Ok(store)
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() -> StoreResult<()> {
        let store = InMemoryActorStore::new();
        assert_eq!(store.create(&names("Ada", "Lovelace")).await?, ActorId::new(1));
        assert_eq!(store.create(&names("Alan", "Turing")).await?, ActorId::new(2));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_uses_max_plus_one_after_delete() -> StoreResult<()> {
        let store = seeded(&[("A", "One"), ("B", "Two"), ("C", "Three")]).await?;
        store.delete(ActorId::new(2)).await?;
        assert_eq!(store.create(&names("D", "Four")).await?, ActorId::new(4));
        store.delete(ActorId::new(4)).await?;
        assert_eq!(store.create(&names("E", "Five")).await?, ActorId::new(4));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_conflict_requires_both_names() -> StoreResult<()> {
        let store = seeded(&[("Ada", "Lovelace")]).await?;

        let err = store.create(&names("Ada", "Lovelace")).await;
        assert!(matches!(err, Err(StoreError::AlreadyExists { .. })));
        assert_eq!(store.actor_count(), 1);

        // Sharing only one of the names is allowed.
        store.create(&names("Ada", "Byron")).await?;
        store.create(&names("Augusta", "Lovelace")).await?;
        assert_eq!(store.actor_count(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = InMemoryActorStore::new();
        let result = store.get(ActorId::new(42)).await;
        assert_eq!(result, Err(StoreError::NotFound { id: ActorId::new(42) }));
    }

    #[tokio::test]
    async fn test_update_changes_names_only() -> StoreResult<()> {
        let store = seeded(&[("Ada", "Lovelace")]).await?;
        let before = store.get(ActorId::new(1)).await?;

        let updated = store.update(ActorId::new(1), &names("Ada", "Byron")).await?;
        assert_eq!(updated.id, before.id);
        assert_eq!(updated.first_name, "Ada");
        assert_eq!(updated.last_name, "Byron");
        assert!(updated.last_update >= before.last_update);
        assert_eq!(store.get(ActorId::new(1)).await?, updated);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_rejects_identical_names() -> StoreResult<()> {
        let store = seeded(&[("Ada", "Lovelace")]).await?;
        let result = store.update(ActorId::new(1), &names("Ada", "Lovelace")).await;
        assert!(matches!(result, Err(StoreError::NoChanges { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_rejects_pair_held_by_other_actor() -> StoreResult<()> {
        let store = seeded(&[("Ada", "Lovelace"), ("Alan", "Turing")]).await?;
        let result = store.update(ActorId::new(2), &names("Ada", "Lovelace")).await;
        assert!(matches!(result, Err(StoreError::AlreadyExists { .. })));
        assert_eq!(store.get(ActorId::new(2)).await?.last_name, "Turing");
        Ok(())
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = InMemoryActorStore::new();
        let result = store.update(ActorId::new(5), &names("A", "B")).await;
        assert_eq!(result, Err(StoreError::NotFound { id: ActorId::new(5) }));
    }

    #[tokio::test]
    async fn test_delete_removes_exactly_one() -> StoreResult<()> {
        let store = seeded(&[("Ada", "Lovelace"), ("Alan", "Turing")]).await?;
        store.delete(ActorId::new(1)).await?;
        assert_eq!(store.actor_count(), 1);
        assert!(matches!(
            store.get(ActorId::new(1)).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete(ActorId::new(1)).await,
            Err(StoreError::NotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_of_one_pair_admit_one() -> StoreResult<()> {
        let store = InMemoryActorStore::new();
        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..32 {
            let store = store.clone();
            tasks.spawn(async move { store.create(&names("Ada", "Lovelace")).await });
        }

        let mut created = 0;
        let mut conflicts = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined.map_err(|e| StoreError::internal("join", e.to_string()))? {
                Ok(_) => created += 1,
                Err(StoreError::AlreadyExists { .. }) => conflicts += 1,
                Err(other) => return Err(other),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(conflicts, 31);
        assert_eq!(store.actor_count(), 1);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_to_one_pair_admit_one() -> StoreResult<()> {
        let pairs: Vec<(String, String)> =
            (0..16).map(|i| ("Actor".to_string(), format!("No{}", i))).collect();
        let store = InMemoryActorStore::new();
        for (first, last) in &pairs {
            store.create(&names(first, last)).await?;
        }

        let mut tasks = tokio::task::JoinSet::new();
        for id in 1..=16 {
            let store = store.clone();
            tasks.spawn(async move {
                store
                    .update(ActorId::new(id), &names("Ada", "Lovelace"))
                    .await
            });
        }

        let mut updated = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined.map_err(|e| StoreError::internal("join", e.to_string()))? {
                Ok(_) => updated += 1,
                Err(StoreError::AlreadyExists { .. }) => {}
                Err(other) => return Err(other),
            }
        }
        assert_eq!(updated, 1);

        let holders = store.list(&ListQuery::new("lovelace")).await?;
        assert_eq!(holders.len(), 1);
        assert_eq!(store.actor_count(), 16);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_search_order_and_pagination() -> StoreResult<()> {
        let store = seeded(&[
            ("John", "Smith"),
            ("Ada", "Lovelace"),
            ("Smithy", "Jones"),
            ("Will", "Blacksmith"),
        ])
        .await?;

        let all = store.list(&ListQuery::default()).await?;
        let ids: Vec<i64> = all.iter().map(|a| a.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);

        let smiths = store.list(&ListQuery::new("SMITH")).await?;
        let ids: Vec<i64> = smiths.iter().map(|a| a.id.get()).collect();
        assert_eq!(ids, vec![1, 3, 4]);

        let page = store
            .list(&ListQuery::new("smith").descending(true).with_offset(1).with_limit(1))
            .await?;
        let ids: Vec<i64> = page.iter().map(|a| a.id.get()).collect();
        assert_eq!(ids, vec![3]);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_without_match_is_empty() -> StoreResult<()> {
        let store = seeded(&[("Ada", "Lovelace")]).await?;
        assert!(store.list(&ListQuery::new("nobody")).await?.is_empty());
        assert!(store
            .list(&ListQuery::default().with_offset(10))
            .await?
            .is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_offline_store_fails_with_internal() -> StoreResult<()> {
        let store = seeded(&[("Ada", "Lovelace")]).await?;
        store.set_offline(true);
        assert!(matches!(
            store.get(ActorId::new(1)).await,
            Err(StoreError::Internal { .. })
        ));
        assert!(store.health_check().await.is_err());
        store.set_offline(false);
        store.health_check().await?;
        Ok(())
    }
}
