#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

pub use toml_config::{AppConfig, CatalogRoutes, LogFormat};

#[cfg(feature = "cli")]
pub use cli::{CliArgs, Command};
