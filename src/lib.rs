//! Chunked tile terrain library
//!
//! A rectangular world of square chunks, addressed as one tile grid, with
//! noise-driven material generation, A* pathfinding over a flattened view,
//! and a JSON level format.

pub mod ascii;
pub mod chunk;
pub mod config;
pub mod coords;
pub mod error;
pub mod generation;
pub mod grid;
pub mod level;
pub mod material;
pub mod pathfinding;
pub mod storage;
pub mod terrain;
pub mod tile;

pub use chunk::Chunk;
pub use config::{AppConfig, TerrainConfig};
pub use coords::{ChunkCoord, CoordinateSystem, LocalOffset, WorldPos};
pub use error::{ConfigError, LevelError, Result, StorageError, TerrainError};
pub use generation::{GenerationMode, GenerationStrategy};
pub use grid::Grid;
pub use material::{MaterialModel, MaterialRange, RangeWeight};
pub use pathfinding::{Connectivity, PathOptions, PathfindingMap};
pub use terrain::GridTerrain;
pub use tile::{Material, Tile};
