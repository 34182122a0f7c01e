use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the configurator outside of the scene parsers.
#[derive(Debug, Error)]
pub enum ConfiguratorError {
    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("texture not found: {0}")]
    TextureNotFound(PathBuf),
    #[error("unknown part category: {0}")]
    UnknownCategory(String),
    #[error("invalid color {0:?}, expected #rrggbb")]
    InvalidColor(String),
}

pub type ConfiguratorResult<T> = std::result::Result<T, ConfiguratorError>;
