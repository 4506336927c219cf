use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read or parsed, or a value has the wrong type.
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    /// The settings parsed but are unusable.
    #[error("Invalid setting `{setting}`: {reason}")]
    ValidationError { setting: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(setting: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::ValidationError {
            setting,
            reason: reason.into(),
        }
    }
}
