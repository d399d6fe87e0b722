//! Error types for kgprep-core.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or preparing a dataset.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error (config files).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A data row could not be parsed.
    #[error("Failed to parse {}:{line}: {message}", .path.display())]
    Parse {
        /// Source file, or `<reader>` for in-memory input.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// Invalid preparation settings.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A partition asked for more records than remain.
    #[error("Cannot draw {requested} ratings, only {available} available")]
    InsufficientRatings {
        /// Records requested for the partition.
        requested: usize,
        /// Records still unassigned.
        available: usize,
    },

    /// An entity has no edges and the sampler was told to fail on it.
    #[error("Entity {entity} has no neighbors in the knowledge graph")]
    IsolatedEntity {
        /// The isolated entity id.
        entity: u32,
    },

    /// Binary cache could not be read or written.
    #[error("Cache error: {0}")]
    Cache(String),
}

/// Result type for kgprep operations.
pub type Result<T> = std::result::Result<T, Error>;
