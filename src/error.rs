use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FriError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("No extraction files found in {0}")]
    NoInputFound(String),

    #[error("Table could not be loaded ({path}): {source}")]
    Table {
        path: String,
        source: fri_verdict_common::Error,
    },

    #[error(transparent)]
    Engine(#[from] fri_verdict_common::Error),

    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FriError {
    pub fn table(path: &Path, source: fri_verdict_common::Error) -> Self {
        FriError::Table {
            path: path.display().to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, FriError>;
