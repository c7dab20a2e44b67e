//! Error types for terrain construction, lookup and level handling.

use thiserror::Error;

use crate::level::ValidationReport;

/// Errors raised by the terrain core (grid, chunks, terrain, pathfinding).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TerrainError {
    /// Invalid construction parameters. Never recoverable at the call site.
    #[error("invalid terrain configuration: {0}")]
    Configuration(String),

    /// A coordinate outside `[0, width) x [0, height)`.
    #[error("coordinate ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: usize,
        height: usize,
    },
}

impl TerrainError {
    pub(crate) fn out_of_bounds(x: i64, y: i64, width: usize, height: usize) -> Self {
        TerrainError::OutOfBounds { x, y, width, height }
    }
}

/// Errors raised while reading or writing level documents.
#[derive(Debug, Error)]
pub enum LevelError {
    /// The document parsed but violates the level schema.
    #[error("level validation failed with {} error(s)", .0.errors.len())]
    Validation(ValidationReport),

    #[error("malformed level JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("level I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Terrain(#[from] TerrainError),
}

/// Errors that can occur during chunk storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// Corrupted file or version mismatch.
    #[error("deserialization error: {0}")]
    Deserialization(String),
}

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type Result<T, E = TerrainError> = std::result::Result<T, E>;
