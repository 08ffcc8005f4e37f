use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::adapters::memory::ListItemTable;
use crate::domain::model::{CatalogRef, ListItem, ListItemId, ListKind, NewListItem, UserId};
use crate::domain::ports::ListItemStore;
use crate::utils::error::Result;

/// List item store persisted as a single JSON document.
///
/// Every mutation is applied to a copy of the table, written to a sibling
/// temp file and renamed over the store, and only then made visible. A failed
/// write leaves both the file and the in-memory view untouched.
#[derive(Debug)]
pub struct JsonFileListItemStore {
    path: PathBuf,
    table: RwLock<ListItemTable>,
}

impl JsonFileListItemStore {
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let table = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => ListItemTable::default(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ListItemTable::default(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!("Opened list store {} ({} items)", path.display(), table.len());

        Ok(Self {
            path,
            table: RwLock::new(table),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, table: &ListItemTable) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let data = serde_json::to_vec_pretty(table)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &data).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::debug!("Wrote {} bytes to {}", data.len(), self.path.display());
        Ok(())
    }

    async fn mutate<T>(&self, change: impl FnOnce(&mut ListItemTable) -> Result<T>) -> Result<T> {
        let mut table = self.table.write().await;
        let mut next = table.clone();
        let out = change(&mut next)?;
        self.persist(&next).await?;
        *table = next;
        Ok(out)
    }
}

#[async_trait]
impl ListItemStore for JsonFileListItemStore {
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
        self.mutate(|table| Ok(table.insert(item))).await
    }

    async fn remove_and_renumber(&self, id: ListItemId) -> Result<Option<ListItem>> {
        self.mutate(|table| table.remove_and_renumber(id)).await
    }

    async fn save_all(&self, items: &[ListItem]) -> Result<()> {
        self.mutate(|table| table.save_all(items)).await
    }
}
