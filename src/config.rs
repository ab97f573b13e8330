use thiserror::Error;

use crate::storage::IndexReplaceMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub pagination: PaginationConfig,
    pub index: IndexConfig,
    pub recurrence: RecurrenceConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub data_dir: String,
}

#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// Page size when the client does not ask for one
    pub items_per_page: usize,
}

#[derive(Debug, Clone, Default)]
pub struct IndexConfig {
    /// How a moved booking date is re-indexed
    pub replace_mode: IndexReplaceMode,
}

#[derive(Debug, Clone)]
pub struct RecurrenceConfig {
    pub enabled: bool,
    pub interval_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            data_dir: "./data".to_string(),
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { items_per_page: 10 }
    }
}

impl Default for RecurrenceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_seconds: 3600,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn load_from(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let server_defaults = ServerConfig::default();
        let bind_address = var("BIND_ADDRESS").unwrap_or(server_defaults.bind_address);
        let data_dir = var("DATA_DIR").unwrap_or(server_defaults.data_dir);

        let items_per_page = match var("ITEMS_PER_PAGE") {
            Some(s) => s.parse().map_err(|_| {
                ConfigError::ValidationError(format!("ITEMS_PER_PAGE \"{s}\" is not a number"))
            })?,
            None => PaginationConfig::default().items_per_page,
        };

        let replace_mode = match var("INDEX_REPLACE_MODE") {
            Some(s) => s.parse().map_err(ConfigError::ValidationError)?,
            None => IndexReplaceMode::default(),
        };

        let recurrence_enabled = var("RECURRENCE_ENABLED")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        let recurrence_interval = var("RECURRENCE_INTERVAL_SECONDS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(RecurrenceConfig::default().interval_seconds);

        let config = Config {
            server: ServerConfig {
                bind_address,
                data_dir,
            },
            pagination: PaginationConfig { items_per_page },
            index: IndexConfig { replace_mode },
            recurrence: RecurrenceConfig {
                enabled: recurrence_enabled,
                interval_seconds: recurrence_interval,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.pagination.items_per_page == 0 {
            return Err(ConfigError::ValidationError(
                "ITEMS_PER_PAGE must be greater than 0".to_string(),
            ));
        }

        if self.recurrence.interval_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "RECURRENCE_INTERVAL_SECONDS must be greater than 0".to_string(),
            ));
        }

        if self.index.replace_mode == IndexReplaceMode::Append {
            tracing::warn!(
                "INDEX_REPLACE_MODE is append. Spendings whose booking date changes \
                 stay listed under their previous date."
            );
        }

        Ok(())
    }
}
