pub mod lifecycle;
pub mod locks;
pub mod ordering;

pub use crate::domain::model::{CatalogEntity, CatalogRef, ListItem, ListItemId, MediaKind, UserId};
pub use crate::domain::ports::{CatalogLookup, ConfigProvider, ListItemStore};
pub use crate::utils::error::Result;
