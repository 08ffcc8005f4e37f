use thiserror::Error;

#[derive(Error, Debug)]
pub enum ListError {
    #[error("{what} not found")]
    NotFound { what: String },

    #[error("This item is already in your list")]
    DuplicateEntry,

    #[error("Invalid catalog reference: {message}")]
    InvalidReference { message: String },

    #[error("Catalog service unavailable: {message}")]
    Unavailable { message: String },

    #[error("Rank {rank} is out of bounds, expected a value between 1 and {len}")]
    InvalidRank { rank: u32, len: usize },

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    Config { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfig { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Client,
    Upstream,
    Storage,
    Configuration,
}

impl ListError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn invalid_reference(message: impl Into<String>) -> Self {
        Self::InvalidReference {
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. }
            | Self::DuplicateEntry
            | Self::InvalidReference { .. }
            | Self::InvalidRank { .. } => ErrorCategory::Client,
            Self::Unavailable { .. } => ErrorCategory::Upstream,
            Self::Storage(_) | Self::Serialization(_) => ErrorCategory::Storage,
            Self::Config { .. } | Self::InvalidConfigValue { .. } | Self::MissingConfig { .. } => {
                ErrorCategory::Configuration
            }
        }
    }

    /// Only upstream failures are transient; everything else fails the same way twice.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Client => self.to_string(),
            ErrorCategory::Upstream => {
                "The catalog service could not be reached, please try again later".to_string()
            }
            ErrorCategory::Storage => format!("Could not read or write the list store ({})", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "Run `media-list list` to see the ids in your list",
            Self::DuplicateEntry => "The item is already present, nothing to do",
            Self::InvalidReference { .. } => "Check the external code and media kind",
            Self::Unavailable { .. } => "Retry once the catalog service is reachable",
            Self::InvalidRank { .. } => "Pick a rank between 1 and the size of your list",
            Self::Storage(_) | Self::Serialization(_) => "Check the store path and its permissions",
            Self::Config { .. } | Self::InvalidConfigValue { .. } | Self::MissingConfig { .. } => {
                "Fix the configuration file and run again"
            }
        }
    }
}

impl From<reqwest::Error> for ListError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::unavailable(format!("request timed out: {}", err))
        } else {
            Self::unavailable(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, ListError>;
