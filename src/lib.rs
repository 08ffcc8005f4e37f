pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliArgs, Command};

pub use adapters::{
    file::JsonFileListItemStore,
    http::HttpCatalogClient,
    memory::{InMemoryCatalog, InMemoryListItemStore},
};
pub use config::AppConfig;
pub use core::lifecycle::ListService;
pub use domain::model::{
    CatalogEntity, CatalogId, CatalogRef, ListItem, ListItemId, ListKind, MediaKind, UserId,
};
pub use utils::error::{ListError, Result};
