use crate::error::ConfigError;
use serde::Deserialize;
use std::time::Duration;

/// The root configuration structure for the entire application.
///
/// Every section has defaults, so an empty (or missing) `academia.toml`
/// yields a runnable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: Server,
    pub database: Database,
    pub pagination: Pagination,
    pub audit: Audit,
    pub logging: Logging,
}

/// Where the HTTP API listens.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

/// Connection pool settings. The URL itself comes from `DATABASE_URL`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Database {
    pub max_connections: u32,
    /// How long a request waits for a pooled connection before failing.
    pub acquire_timeout_secs: u64,
    /// Apply the embedded migrations when the server starts.
    pub run_migrations: bool,
}

/// Page sizes for the paginated endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Pagination {
    /// Used when a request carries no `size`.
    pub default_size: u32,
    /// Larger requested sizes are clamped to this.
    pub max_size: u32,
}

/// Identity recorded in the audit columns of every inserted row.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Audit {
    pub actor: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Logging {
    /// An `EnvFilter` directive. `RUST_LOG` takes precedence when set.
    pub filter: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<String>,
    pub file_prefix: String,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for Database {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout_secs: 5,
            run_migrations: true,
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            default_size: 10,
            max_size: 100,
        }
    }
}

impl Default for Audit {
    fn default() -> Self {
        Self {
            actor: "system".to_string(),
        }
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            directory: None,
            file_prefix: "academia.log".to_string(),
        }
    }
}

impl Server {
    /// `host:port`, suitable for binding a listener.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Database {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

impl Config {
    /// Rejects settings that would only fail later, at bind or query time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::invalid("server.port", "must be non-zero"));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::invalid("database.max_connections", "must be at least 1"));
        }
        let Pagination { default_size, max_size } = self.pagination;
        if default_size == 0 || default_size > max_size {
            return Err(ConfigError::invalid(
                "pagination.default_size",
                format!("{default_size} is not between 1 and max_size ({max_size})"),
            ));
        }
        if self.audit.actor.trim().is_empty() {
            return Err(ConfigError::invalid("audit.actor", "must not be blank"));
        }
        Ok(())
    }
}
