use async_trait::async_trait;

use crate::domain::model::{
    CatalogEntity, CatalogRef, ListItem, ListItemId, ListKind, MediaKind, NewListItem, UserId,
};
use crate::utils::error::Result;

/// Persistent ordered collection of list items, keyed by (owner, catalog entity).
/// Ranks are scoped to one (owner, list) pair.
#[async_trait]
pub trait ListItemStore: Send + Sync {
    async fn find_by_id(&self, id: ListItemId) -> Result<Option<ListItem>>;

    /// All items in the owner's `list`, ascending by rank.
    async fn find_by_owner(&self, owner: UserId, list: ListKind) -> Result<Vec<ListItem>>;

    async fn find_by_owner_and_catalog(
        &self,
        owner: UserId,
        catalog: CatalogRef,
    ) -> Result<Option<ListItem>>;

    /// Items of every user that reference `catalog`.
    async fn find_by_catalog(&self, catalog: CatalogRef) -> Result<Vec<ListItem>>;

    async fn max_rank(&self, owner: UserId, list: ListKind) -> Result<Option<u32>>;

    async fn insert(&self, item: NewListItem) -> Result<ListItem>;

    /// Removes an item and renumbers what is left of its list as `1..=N`,
    /// all in one write. Returns the removed item as it was stored.
    async fn remove_and_renumber(&self, id: ListItemId) -> Result<Option<ListItem>>;

    /// Writes every item in one batch. Items must already exist.
    async fn save_all(&self, items: &[ListItem]) -> Result<()>;
}

/// Remote catalog service resolving external reference codes to catalog entities.
/// Implementations enforce their own request timeout and surface it as `Unavailable`.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    async fn find(&self, ref_code: &str, kind: MediaKind) -> Result<Option<CatalogEntity>>;

    async fn fetch_or_register(&self, ref_code: &str, kind: MediaKind) -> Result<CatalogEntity>;

    /// Fails with `NotFound` when the entity is already gone.
    async fn delete(&self, catalog: CatalogRef) -> Result<()>;
}

pub trait ConfigProvider: Send + Sync {
    fn store_path(&self) -> &str;
    fn catalog_route(&self, kind: MediaKind) -> Option<&str>;
    fn request_timeout_seconds(&self) -> u64;
}
