#![deny(unsafe_code)]

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StandardsError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse TOML config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to parse XML {path}: {message}")]
    Xml { path: PathBuf, message: String },

    #[error("baseline {path} belongs to {found}, expected {expected}")]
    BaselineKeyMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("invalid baseline key: {message}")]
    InvalidKey { message: String },

    #[error("config file not found: {path}")]
    MissingConfig { path: PathBuf },

    #[error("baseline rebuild worker unavailable: {message}")]
    Worker { message: String },
}

impl StandardsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn xml(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::Xml {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
