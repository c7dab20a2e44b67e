//! Configuration values threaded through terrain construction.
//!
//! Everything can be loaded from a TOML file; missing keys take defaults.
//!
//! ```toml
//! [terrain]
//! chunks_wide = 4
//! chunks_tall = 3
//! chunk_size = 8
//! tile_size = 16.0
//!
//! [generation.noise]
//! frequency = 0.08
//!
//! [[generation.materials.ranges]]
//! material = "water"
//! min = 0.0
//! max = 0.3
//!
//! [validation]
//! max_entities = 200
//! ```

use std::fs;
use std::mem;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::chunk::Chunk;
use crate::coords::{CoordinateSystem, WorldPos};
use crate::error::{ConfigError, Result, TerrainError};
use crate::generation::GenerationStrategy;
use crate::level::ValidationLimits;
use crate::tile::Tile;

/// Default chunk side length in tiles.
pub const DEFAULT_CHUNK_SIZE: usize = 8;

/// Default tile edge in world units.
pub const DEFAULT_TILE_SIZE: f32 = 16.0;

/// Shape and scale of a terrain.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub chunks_wide: usize,
    pub chunks_tall: usize,
    pub chunk_size: usize,
    pub tile_size: f32,
    pub view_origin: WorldPos,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            chunks_wide: 3,
            chunks_tall: 3,
            chunk_size: DEFAULT_CHUNK_SIZE,
            tile_size: DEFAULT_TILE_SIZE,
            view_origin: WorldPos::ORIGIN,
        }
    }
}

impl TerrainConfig {
    pub fn new(chunks_wide: usize, chunks_tall: usize, chunk_size: usize, tile_size: f32) -> Self {
        Self {
            chunks_wide,
            chunks_tall,
            chunk_size,
            tile_size,
            view_origin: WorldPos::ORIGIN,
        }
    }

    /// Reject degenerate terrains before anything is allocated.
    pub fn validate(&self) -> Result<()> {
        if self.chunks_wide == 0 || self.chunks_tall == 0 {
            return Err(TerrainError::Configuration(format!(
                "terrain needs at least one chunk on each axis, got {}x{}",
                self.chunks_wide, self.chunks_tall
            )));
        }
        self.coordinate_system()?;
        self.checked_tiles().map(|_| ())
    }

    pub fn coordinate_system(&self) -> Result<CoordinateSystem> {
        CoordinateSystem::new(self.tile_size, self.chunk_size, self.view_origin)
    }

    /// Total size in tiles, rejecting shapes whose chunk count, tile count or
    /// tile storage does not fit in memory arithmetic.
    pub fn checked_tiles(&self) -> Result<(usize, usize)> {
        let too_large = || {
            TerrainError::Configuration(format!(
                "{}x{} chunks of {} tiles is too large to allocate",
                self.chunks_wide, self.chunks_tall, self.chunk_size
            ))
        };
        let width = self.chunks_wide.checked_mul(self.chunk_size).ok_or_else(too_large)?;
        let height = self.chunks_tall.checked_mul(self.chunk_size).ok_or_else(too_large)?;
        let chunk_bytes = self
            .chunks_wide
            .checked_mul(self.chunks_tall)
            .and_then(|n| n.checked_mul(mem::size_of::<Chunk>()));
        let tile_bytes = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(mem::size_of::<Tile>()));
        match (chunk_bytes, tile_bytes) {
            (Some(c), Some(t)) if c <= isize::MAX as usize && t <= isize::MAX as usize => {
                Ok((width, height))
            }
            _ => Err(too_large()),
        }
    }

    /// Total size in tiles. Saturates on shapes that
    /// [`validate`](Self::validate) rejects.
    pub fn tiles(&self) -> (usize, usize) {
        (
            self.chunks_wide.saturating_mul(self.chunk_size),
            self.chunks_tall.saturating_mul(self.chunk_size),
        )
    }
}

/// Everything the binary reads from a config file.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub terrain: TerrainConfig,
    pub generation: GenerationStrategy,
    pub validation: ValidationLimits,
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ConfigError> {
        let text = fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml(&text)?;
        info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> std::result::Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}
