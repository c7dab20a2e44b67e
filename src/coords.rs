//! Coordinate system for chunked terrain.
//!
//! Three spaces are involved:
//!
//! | Space      | Unit                | Used for                                   |
//! |------------|---------------------|--------------------------------------------|
//! | Tile       | whole tiles         | terrain lookup, pathfinding                |
//! | Chunk      | whole chunks + local offset | storage, generation                 |
//! | World      | `tile_size` units   | placement of tiles in the simulation world |
//!
//! Render positions are world positions shifted by the view origin.
//! Generation space is tile space sampled at tile centres.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TerrainError};

/// A position in world (or render) space.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPos {
    pub x: f32,
    pub y: f32,
}

impl WorldPos {
    pub const ORIGIN: WorldPos = WorldPos { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Chunk coordinate within a terrain (in chunk units).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: usize,
    pub y: usize,
}

impl ChunkCoord {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "chunk({},{})", self.x, self.y)
    }
}

/// Tile offset inside a chunk (0..chunk_size on both axes).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct LocalOffset {
    pub x: usize,
    pub y: usize,
}

impl LocalOffset {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Pure conversions between tile, chunk, world and render space.
///
/// Holds only configuration, so several terrains with different scales can
/// coexist.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateSystem {
    tile_size: f32,
    chunk_size: usize,
    view_origin: WorldPos,
}

impl CoordinateSystem {
    pub fn new(tile_size: f32, chunk_size: usize, view_origin: WorldPos) -> Result<Self> {
        if chunk_size == 0 {
            return Err(TerrainError::Configuration(
                "chunk_size must be positive".to_string(),
            ));
        }
        if !(tile_size.is_finite() && tile_size > 0.0) {
            return Err(TerrainError::Configuration(format!(
                "tile_size must be a positive finite number, got {}",
                tile_size
            )));
        }
        Ok(Self {
            tile_size,
            chunk_size,
            view_origin,
        })
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn view_origin(&self) -> WorldPos {
        self.view_origin
    }

    /// Move the view; only render-space conversions are affected.
    pub fn set_view_origin(&mut self, origin: WorldPos) {
        self.view_origin = origin;
    }

    /// Split a terrain tile coordinate into its chunk and local offset.
    pub fn split_tile(&self, tile_x: usize, tile_y: usize) -> (ChunkCoord, LocalOffset) {
        let chunk = ChunkCoord::new(tile_x / self.chunk_size, tile_y / self.chunk_size);
        let local = LocalOffset::new(tile_x % self.chunk_size, tile_y % self.chunk_size);
        (chunk, local)
    }

    /// Inverse of [`split_tile`](Self::split_tile).
    pub fn join_tile(&self, chunk: ChunkCoord, local: LocalOffset) -> (usize, usize) {
        (
            chunk.x * self.chunk_size + local.x,
            chunk.y * self.chunk_size + local.y,
        )
    }

    /// Terrain tile coordinate of a chunk's top-left tile.
    pub fn chunk_tile_origin(&self, chunk: ChunkCoord) -> (usize, usize) {
        self.join_tile(chunk, LocalOffset::default())
    }

    /// World position of a chunk's top-left corner (its tile-span position).
    pub fn chunk_span_top_left(&self, chunk: ChunkCoord) -> WorldPos {
        let (tx, ty) = self.chunk_tile_origin(chunk);
        self.tile_to_world(tx, ty)
    }

    /// World position of a tile's top-left corner.
    pub fn tile_to_world(&self, tile_x: usize, tile_y: usize) -> WorldPos {
        WorldPos::new(tile_x as f32 * self.tile_size, tile_y as f32 * self.tile_size)
    }

    /// World position of a tile's centre.
    pub fn tile_center(&self, tile_x: usize, tile_y: usize) -> WorldPos {
        let half = self.tile_size * 0.5;
        self.tile_to_world(tile_x, tile_y).offset(half, half)
    }

    /// Tile containing a world position. May be negative or past the terrain
    /// edge; callers bounds-check against their own extent.
    pub fn world_to_tile(&self, pos: WorldPos) -> (i64, i64) {
        (
            (pos.x / self.tile_size).floor() as i64,
            (pos.y / self.tile_size).floor() as i64,
        )
    }

    pub fn world_to_render(&self, pos: WorldPos) -> WorldPos {
        WorldPos::new(pos.x - self.view_origin.x, pos.y - self.view_origin.y)
    }

    pub fn render_to_world(&self, pos: WorldPos) -> WorldPos {
        WorldPos::new(pos.x + self.view_origin.x, pos.y + self.view_origin.y)
    }

    /// Render position of a tile's top-left corner.
    pub fn tile_to_render(&self, tile_x: usize, tile_y: usize) -> WorldPos {
        self.world_to_render(self.tile_to_world(tile_x, tile_y))
    }

    /// Tile under a render-space position (e.g. a cursor).
    pub fn render_to_tile(&self, pos: WorldPos) -> (i64, i64) {
        self.world_to_tile(self.render_to_world(pos))
    }

    /// Noise sampling position for a tile, in tile units at the tile centre.
    ///
    /// Adjacent chunks produce adjacent positions, so they read one
    /// continuous field.
    pub fn generation_position(&self, chunk: ChunkCoord, local: LocalOffset) -> (f64, f64) {
        let (tx, ty) = self.join_tile(chunk, local);
        (tx as f64 + 0.5, ty as f64 + 0.5)
    }
}

/// Deterministic seed for a single terrain position (splitmix64 mixing).
pub fn position_seed(world_seed: u64, x: i64, y: i64) -> u64 {
    let mut hash = world_seed;

    hash = hash.wrapping_add(x as u64);
    hash ^= hash >> 30;
    hash = hash.wrapping_mul(0xbf58476d1ce4e5b9);

    hash = hash.wrapping_add(y as u64);
    hash ^= hash >> 27;
    hash = hash.wrapping_mul(0x94d049bb133111eb);

    hash ^= hash >> 31;
    hash
}
