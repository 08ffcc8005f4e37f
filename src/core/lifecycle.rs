use chrono::Utc;
use rand::Rng;

use crate::core::locks::{CatalogLocks, UserLocks};
use crate::core::ordering;
use crate::domain::model::{
    CatalogRef, ListItem, ListItemId, ListKind, MediaKind, NewListItem, UserId,
};
use crate::domain::ports::{CatalogLookup, ListItemStore};
use crate::utils::error::{ListError, Result};
use crate::utils::validation::validate_non_empty_string;

pub const DEFAULT_LATEST_LIMIT: usize = 3;

/// How often `add` re-registers an entity that was cleaned up under it.
const REGISTER_ATTEMPTS: usize = 3;

/// Orchestrates add, delete and reorder on users' lists.
///
/// Every operation on a given owner's lists runs under that owner's lock, so
/// the reads and the rank writes of one operation are never interleaved with
/// another operation on the same list. Inserting a reference to a catalog
/// entity and deciding that an entity is orphaned both run under that
/// entity's lock, so cleanup never removes an entity another user is adding.
/// Locks are taken owner first, entity second.
pub struct ListService<S: ListItemStore, C: CatalogLookup> {
    store: S,
    catalog: C,
    locks: UserLocks,
    entities: CatalogLocks,
}

impl<S: ListItemStore, C: CatalogLookup> ListService<S, C> {
    pub fn new(store: S, catalog: C) -> Self {
        Self {
            store,
            catalog,
            locks: UserLocks::new(),
            entities: CatalogLocks::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Appends the catalog entity behind `ref_code` to the owner's list for
    /// `kind`.
    pub async fn add(&self, owner: UserId, ref_code: &str, kind: MediaKind) -> Result<ListItem> {
        let ref_code = ref_code.trim();
        validate_non_empty_string("ref_code", ref_code)
            .map_err(|_| ListError::invalid_reference("reference code cannot be empty"))?;

        let _guard = self.locks.acquire(owner).await;

        match self.catalog.find(ref_code, kind).await? {
            Some(entity) => {
                let catalog = CatalogRef { kind, id: entity.id };
                if self.store.find_by_owner_and_catalog(owner, catalog).await?.is_some() {
                    tracing::debug!("{} already in list of user {}", catalog, owner);
                    return Err(ListError::DuplicateEntry);
                }
            }
            None => tracing::info!("{} '{}' is not in the catalog yet", kind, ref_code),
        }

        let mut entity = self.catalog.fetch_or_register(ref_code, kind).await?;
        for _ in 0..REGISTER_ATTEMPTS {
            let catalog = CatalogRef { kind, id: entity.id };
            let _entity_guard = self.entities.acquire(catalog).await;

            // cleanup may have dropped the entity between registering and locking
            let current = self.catalog.fetch_or_register(ref_code, kind).await?;
            if current.id != entity.id {
                tracing::debug!("{} was replaced by {} while adding", catalog, current.id);
                entity = current;
                continue;
            }

            // A lookup miss above may have been transient.
            if self.store.find_by_owner_and_catalog(owner, catalog).await?.is_some() {
                return Err(ListError::DuplicateEntry);
            }

            let rank = ordering::next_rank(self.store.max_rank(owner, kind.list()).await?);
            let item = self
                .store
                .insert(NewListItem {
                    owner,
                    catalog,
                    rank,
                    added_at: Utc::now(),
                })
                .await?;

            tracing::info!(
                "Added {} to {} list of user {} at rank {} (item {})",
                catalog,
                kind.list(),
                owner,
                item.rank,
                item.id
            );
            return Ok(item);
        }

        Err(ListError::unavailable(format!(
            "{} '{}' kept disappearing from the catalog",
            kind, ref_code
        )))
    }

    /// Removes an item, closes the gap it leaves and drops the catalog entity
    /// once no list references it anymore. Returns the removed item.
    pub async fn delete_by_id(&self, owner: UserId, item_id: ListItemId) -> Result<ListItem> {
        let _guard = self.locks.acquire(owner).await;

        let item = self.owned_item(owner, item_id).await?;
        self.store
            .remove_and_renumber(item_id)
            .await?
            .ok_or_else(|| ListError::not_found(format!("List item {}", item_id)))?;

        tracing::info!(
            "Removed item {} ({}) from {} list of user {}",
            item.id,
            item.catalog,
            item.list(),
            owner
        );

        let _entity_guard = self.entities.acquire(item.catalog).await;
        if !self.is_catalog_entity_used(item.catalog).await? {
            match self.catalog.delete(item.catalog).await {
                Ok(()) => tracing::info!("Deleted orphaned catalog entity {}", item.catalog),
                Err(ListError::NotFound { .. }) => {
                    tracing::warn!("Catalog entity {} was already gone", item.catalog)
                }
                Err(e) => return Err(e),
            }
        }

        Ok(item)
    }

    /// Moves an item to `new_rank` within its list and returns that list in
    /// rank order.
    pub async fn reorder(
        &self,
        owner: UserId,
        item_id: ListItemId,
        new_rank: u32,
    ) -> Result<Vec<ListItem>> {
        let _guard = self.locks.acquire(owner).await;

        let list = self.owned_item(owner, item_id).await?.list();
        let items = self.store.find_by_owner(owner, list).await?;
        let reordered = ordering::move_to(items, item_id, new_rank)?;
        self.store.save_all(&reordered).await?;

        tracing::info!(
            "Moved item {} in {} list of user {} to rank {}",
            item_id,
            list,
            owner,
            new_rank
        );
        Ok(reordered)
    }

    pub async fn get_ordered(&self, owner: UserId, list: ListKind) -> Result<Vec<ListItem>> {
        let _guard = self.locks.acquire(owner).await;
        self.store.find_by_owner(owner, list).await
    }

    /// Most recently added items first.
    pub async fn latest_added(
        &self,
        owner: UserId,
        list: ListKind,
        limit: usize,
    ) -> Result<Vec<ListItem>> {
        let mut items = self.get_ordered(owner, list).await?;
        items.sort_by(|a, b| b.added_at.cmp(&a.added_at).then(b.rank.cmp(&a.rank)));
        items.truncate(limit);
        Ok(items)
    }

    /// Picks one item uniformly at random, `None` when the list is empty.
    pub async fn get_random<R: Rng>(
        &self,
        owner: UserId,
        list: ListKind,
        rng: &mut R,
    ) -> Result<Option<ListItem>> {
        let items = self.get_ordered(owner, list).await?;
        if items.is_empty() {
            return Ok(None);
        }
        let index = rng.random_range(0..items.len());
        Ok(items.into_iter().nth(index))
    }

    pub async fn is_already_in_list(
        &self,
        owner: UserId,
        ref_code: &str,
        kind: MediaKind,
    ) -> Result<bool> {
        let Some(entity) = self.catalog.find(ref_code.trim(), kind).await? else {
            return Ok(false);
        };
        let catalog = CatalogRef { kind, id: entity.id };
        Ok(self
            .store
            .find_by_owner_and_catalog(owner, catalog)
            .await?
            .is_some())
    }

    /// Whether any user's list still references `catalog`.
    pub async fn is_catalog_entity_used(&self, catalog: CatalogRef) -> Result<bool> {
        Ok(!self.store.find_by_catalog(catalog).await?.is_empty())
    }

    /// Rewrites the ranks of one of the owner's lists as `1..=N`, keeping the
    /// current order.
    pub async fn renumber(&self, owner: UserId, list: ListKind) -> Result<Vec<ListItem>> {
        let _guard = self.locks.acquire(owner).await;

        let items = ordering::renumber(self.store.find_by_owner(owner, list).await?);
        self.store.save_all(&items).await?;
        Ok(items)
    }

    async fn owned_item(&self, owner: UserId, item_id: ListItemId) -> Result<ListItem> {
        self.store
            .find_by_id(item_id)
            .await?
            .filter(|item| item.owner == owner)
            .ok_or_else(|| ListError::not_found(format!("List item {}", item_id)))
    }
}
