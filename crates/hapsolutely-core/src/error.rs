//! Error types for Hapsolutely core systems.

use std::path::PathBuf;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core systems.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error.
    #[error("Failed to read settings '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings could not be parsed.
    #[error("Settings parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Settings could not be serialized.
    #[error("Settings serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// A setting holds a value that cannot be used.
    #[error("Invalid value for setting '{key}': {message}")]
    InvalidConfig { key: String, message: String },
}

impl Error {
    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid-setting error.
    pub fn invalid_config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            message: message.into(),
        }
    }
}
