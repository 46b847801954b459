//! Crate-level error type

use thiserror::Error;

use crate::config::ConfigError;
use crate::editor::EditorError;
use crate::persistence::{PersistenceError, StorageError};
use crate::stylesheet::StyleError;
use crate::template::CatalogError;

/// Any error surfaced by the library
#[derive(Debug, Error)]
pub enum StudioError {
    #[error("style error: {0}")]
    Style(#[from] StyleError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("editor error: {0}")]
    Editor(#[from] EditorError),

    #[error("{0}")]
    Persistence(#[from] PersistenceError),

    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
