use std::path::PathBuf;
use tabulon_runner::ExecutionError;
use tabulon_schema::{ArgumentError, ResourceError};
use thiserror::Error;

/// Failures reading, writing or executing against a datapackage directory.
#[derive(Debug, Error)]
pub enum DatapackageError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config in {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Resource '{resource}' not found in {path}")]
    ResourceNotFound { resource: String, path: PathBuf },

    #[error("Algorithm '{algorithm}' does not declare argument '{argument}'")]
    ArgumentNotDeclared { algorithm: String, argument: String },

    #[error("Argument '{argument}' in space '{space}' is not backed by a resource")]
    NotAResourceArgument { argument: String, space: String },

    #[error("Resource '{resource}' required by view '{view}' is not populated")]
    ResourceNotPopulated { view: String, resource: String },

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl DatapackageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DatapackageError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        DatapackageError::Json {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, DatapackageError>;
