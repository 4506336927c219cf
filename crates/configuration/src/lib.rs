use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{Audit, Config, Database, Logging, Pagination, Server};

/// The configuration file read when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "academia.toml";

/// Loads the application configuration.
///
/// Layers, lowest precedence first: built-in defaults, the TOML file at `path`
/// (optional, may be absent), then `ACADEMIA__<SECTION>__<KEY>` environment
/// variables. The merged result is validated before it is returned.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix("ACADEMIA")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}
