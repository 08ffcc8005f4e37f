use clap::{Parser, Subcommand};

use crate::config::toml_config::AppConfig;
use crate::domain::model::{ListKind, MediaKind, UserId};
use crate::utils::error::Result;

#[derive(Debug, Clone, Parser)]
#[command(name = "media-list")]
#[command(about = "Manage ordered movie and music lists")]
pub struct CliArgs {
    #[arg(long, help = "Path to a TOML configuration file")]
    pub config: Option<String>,

    #[arg(long, help = "Override the list store path from the configuration")]
    pub store: Option<String>,

    #[arg(long, default_value = "1", help = "Id of the list owner")]
    pub user: u64,

    #[arg(
        long,
        global = true,
        value_parser = parse_list,
        default_value = "movie",
        help = "List to show for list, latest and random (movie or music)"
    )]
    pub list: ListKind,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Add a catalog entry to the list by its external code
    Add {
        ref_code: String,
        #[arg(long, value_parser = parse_kind, default_value = "movie")]
        kind: MediaKind,
    },
    /// Remove an item and renumber the rest
    Delete { item_id: u64 },
    /// Move an item to a new rank
    Reorder { item_id: u64, rank: u32 },
    /// Print a list in rank order
    List,
    /// Print the most recently added items
    Latest {
        #[arg(long, default_value = "3")]
        limit: usize,
    },
    /// Print one item picked at random
    Random {
        #[arg(long, help = "Seed for a reproducible pick")]
        seed: Option<u64>,
    },
}

fn parse_kind(value: &str) -> std::result::Result<MediaKind, String> {
    value.parse::<MediaKind>().map_err(|e| e.to_string())
}

fn parse_list(value: &str) -> std::result::Result<ListKind, String> {
    value.parse::<ListKind>().map_err(|e| e.to_string())
}

impl CliArgs {
    pub fn owner(&self) -> UserId {
        UserId(self.user)
    }

    /// Loads the configuration file if one was given and applies CLI overrides.
    pub fn load_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };
        if let Some(store) = &self.store {
            config.store.path = store.clone();
        }
        Ok(config)
    }
}
