use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::core::ordering::{renumber, sort_by_rank};
use crate::domain::model::{
    CatalogEntity, CatalogId, CatalogRef, ListItem, ListItemId, ListKind, MediaKind, NewListItem,
    UserId,
};
use crate::domain::ports::{CatalogLookup, ListItemStore};
use crate::utils::error::{ListError, Result};

/// Plain table of list items plus the id sequence. Shared by the in-memory
/// and the file-backed store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItemTable {
    next_id: u64,
    items: Vec<ListItem>,
}

impl ListItemTable {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn find_by_id(&self, id: ListItemId) -> Option<ListItem> {
        self.items.iter().find(|item| item.id == id).cloned()
    }

    pub fn find_by_owner(&self, owner: UserId, list: ListKind) -> Vec<ListItem> {
        let mut items: Vec<ListItem> = self
            .items
            .iter()
            .filter(|item| item.owner == owner && item.list() == list)
            .cloned()
            .collect();
        sort_by_rank(&mut items);
        items
    }

    pub fn find_by_owner_and_catalog(&self, owner: UserId, catalog: CatalogRef) -> Option<ListItem> {
        self.items
            .iter()
            .find(|item| item.owner == owner && item.catalog == catalog)
            .cloned()
    }

    pub fn find_by_catalog(&self, catalog: CatalogRef) -> Vec<ListItem> {
        self.items
            .iter()
            .filter(|item| item.catalog == catalog)
            .cloned()
            .collect()
    }

    pub fn max_rank(&self, owner: UserId, list: ListKind) -> Option<u32> {
        self.items
            .iter()
            .filter(|item| item.owner == owner && item.list() == list)
            .map(|item| item.rank)
            .max()
    }

    pub fn insert(&mut self, item: NewListItem) -> ListItem {
        self.next_id += 1;
        let item = item.into_item(ListItemId(self.next_id));
        self.items.push(item.clone());
        item
    }

    fn remove(&mut self, id: ListItemId) -> Option<ListItem> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(index))
    }

    /// Removes `id` and closes the gap in its owner's list.
    pub fn remove_and_renumber(&mut self, id: ListItemId) -> Result<Option<ListItem>> {
        let Some(removed) = self.remove(id) else {
            return Ok(None);
        };
        let remaining = renumber(self.find_by_owner(removed.owner, removed.list()));
        self.save_all(&remaining)?;
        Ok(Some(removed))
    }

    /// Applies every update or none of them.
    pub fn save_all(&mut self, updates: &[ListItem]) -> Result<()> {
        let mut positions = Vec::with_capacity(updates.len());
        for update in updates {
            let index = self
                .items
                .iter()
                .position(|item| item.id == update.id)
                .ok_or_else(|| ListError::not_found(format!("List item {}", update.id)))?;
            positions.push(index);
        }
        for (index, update) in positions.into_iter().zip(updates) {
            // id, owner, catalog and added_at never change after insert
            self.items[index].rank = update.rank;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryListItemStore {
    table: RwLock<ListItemTable>,
}

impl InMemoryListItemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ListItemStore for InMemoryListItemStore {
    async fn find_by_id(&self, id: ListItemId) -> Result<Option<ListItem>> {
        Ok(self.table.read().await.find_by_id(id))
    }

    async fn find_by_owner(&self, owner: UserId, list: ListKind) -> Result<Vec<ListItem>> {
        Ok(self.table.read().await.find_by_owner(owner, list))
    }

    async fn find_by_owner_and_catalog(
        &self,
        owner: UserId,
        catalog: CatalogRef,
    ) -> Result<Option<ListItem>> {
        Ok(self.table.read().await.find_by_owner_and_catalog(owner, catalog))
    }

    async fn find_by_catalog(&self, catalog: CatalogRef) -> Result<Vec<ListItem>> {
        Ok(self.table.read().await.find_by_catalog(catalog))
    }

    async fn max_rank(&self, owner: UserId, list: ListKind) -> Result<Option<u32>> {
        Ok(self.table.read().await.max_rank(owner, list))
    }

    async fn insert(&self, item: NewListItem) -> Result<ListItem> {
        Ok(self.table.write().await.insert(item))
    }

    async fn remove_and_renumber(&self, id: ListItemId) -> Result<Option<ListItem>> {
        self.table.write().await.remove_and_renumber(id)
    }

    async fn save_all(&self, items: &[ListItem]) -> Result<()> {
        self.table.write().await.save_all(items)
    }
}

#[derive(Debug, Default)]
struct CatalogState {
    known_codes: HashSet<(MediaKind, String)>,
    entities: HashMap<(MediaKind, String), CatalogEntity>,
    next_id: u64,
}

/// Catalog service stand-in. Only codes registered with [`InMemoryCatalog::allow`]
/// resolve, every other code is an invalid reference.
#[derive(Debug)]
pub struct InMemoryCatalog {
    state: Mutex<CatalogState>,
    available: AtomicBool,
    miss_next_find: AtomicBool,
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self {
            state: Mutex::new(CatalogState::default()),
            available: AtomicBool::new(true),
            miss_next_find: AtomicBool::new(false),
        }
    }
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ListError::unavailable("catalog is offline"))
        }
    }

    /// Makes `ref_code` resolvable by the upstream provider.
    pub fn allow(&self, ref_code: &str, kind: MediaKind) {
        self.state().known_codes.insert((kind, ref_code.to_string()));
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Makes the next `find` answer "unknown" even for a registered entity,
    /// like a lookup that hit a stale replica.
    pub fn miss_next_find(&self) {
        self.miss_next_find.store(true, Ordering::SeqCst);
    }

    /// Drops a registered entity behind the list's back.
    pub fn forget(&self, catalog: CatalogRef) {
        self.state()
            .entities
            .retain(|(kind, _), entity| !(*kind == catalog.kind && entity.id == catalog.id));
    }

    pub fn registered_count(&self) -> usize {
        self.state().entities.len()
    }

    pub fn is_registered(&self, catalog: CatalogRef) -> bool {
        self.state()
            .entities
            .iter()
            .any(|((kind, _), entity)| *kind == catalog.kind && entity.id == catalog.id)
    }
}

#[async_trait]
impl CatalogLookup for InMemoryCatalog {
    async fn find(&self, ref_code: &str, kind: MediaKind) -> Result<Option<CatalogEntity>> {
        self.check_available()?;
        if self.miss_next_find.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(self.state().entities.get(&(kind, ref_code.to_string())).cloned())
    }

    async fn fetch_or_register(&self, ref_code: &str, kind: MediaKind) -> Result<CatalogEntity> {
        self.check_available()?;
        let mut state = self.state();
        let key = (kind, ref_code.to_string());
        if let Some(entity) = state.entities.get(&key) {
            return Ok(entity.clone());
        }
        if !state.known_codes.contains(&key) {
            return Err(ListError::invalid_reference(format!(
                "{} '{}' does not exist",
                kind, ref_code
            )));
        }
        state.next_id += 1;
        let entity = CatalogEntity {
            id: CatalogId(state.next_id),
            api_code: ref_code.to_string(),
            title: None,
        };
        state.entities.insert(key, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, catalog: CatalogRef) -> Result<()> {
        self.check_available()?;
        if !self.is_registered(catalog) {
            return Err(ListError::not_found(format!("Catalog entity {}", catalog)));
        }
        self.forget(catalog);
        Ok(())
    }
}
