use crate::domain::model::MediaKind;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{ListError, Result};
use crate::utils::validation::{validate_path, validate_positive_number, validate_url, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

pub const DEFAULT_STORE_PATH: &str = "./media-list.json";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 5;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_STORE_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub routes: CatalogRoutes,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            routes: CatalogRoutes::default(),
        }
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

/// Base URL of the catalog service for each media kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogRoutes {
    pub movie: Option<String>,
    pub album: Option<String>,
    pub song: Option<String>,
}

impl CatalogRoutes {
    pub fn get(&self, kind: MediaKind) -> Option<&str> {
        match kind {
            MediaKind::Movie => self.movie.as_deref(),
            MediaKind::Album => self.album.as_deref(),
            MediaKind::Song => self.song.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    /// Level for this crate's logs when `RUST_LOG` is not set.
    #[serde(default)]
    pub level: Option<String>,
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| ListError::Config {
            field: path.as_ref().display().to_string(),
            message: format!("cannot read configuration file: {}", e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ListError::Config {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CATALOG_HOST})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_path("store.path", &self.store.path)?;
        validate_positive_number("catalog.timeout_seconds", self.catalog.timeout_seconds, 1)?;

        if let Some(level) = &self.logging.level {
            if !LOG_LEVELS.contains(&level.trim().to_ascii_lowercase().as_str()) {
                return Err(ListError::InvalidConfigValue {
                    field: "logging.level".to_string(),
                    value: level.clone(),
                    reason: format!("must be one of {}", LOG_LEVELS.join(", ")),
                });
            }
        }

        for kind in MediaKind::ALL {
            if let Some(route) = self.catalog.routes.get(kind) {
                validate_url(&format!("catalog.routes.{}", kind), route)?;
            }
        }

        Ok(())
    }
}

impl ConfigProvider for AppConfig {
    fn store_path(&self) -> &str {
        &self.store.path
    }

    fn catalog_route(&self, kind: MediaKind) -> Option<&str> {
        self.catalog.routes.get(kind)
    }

    fn request_timeout_seconds(&self) -> u64 {
        self.catalog.timeout_seconds
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
