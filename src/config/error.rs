use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("required config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot convert value {value:?} of '{key}' to {target}: {reason}")]
    Conversion {
        key: String,
        value: String,
        target: &'static str,
        reason: String,
    },

    #[error("failed to deserialize config: {0}")]
    Deserialize(#[from] serde::de::value::Error),
}
