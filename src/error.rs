use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PreflightError {
    #[error("Workflow directory not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PreflightError>;
