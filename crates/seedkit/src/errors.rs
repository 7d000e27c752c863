//! Error types shared by discovery, execution, and configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors that abort a seeding invocation.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings in {path}: {source}")]
    Settings {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid file pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Seed host error: {0}")]
    Host(String),
}

/// Failure of a single seed script.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("No seed module at {import_path} ({path})")]
    ModuleNotFound { import_path: String, path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Failed(String),
}
