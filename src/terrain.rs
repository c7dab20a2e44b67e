//! The logical world grid: a rectangle of chunks addressed as one tile grid.

use std::collections::BTreeMap;

use log::info;

use crate::chunk::Chunk;
use crate::config::TerrainConfig;
use crate::coords::{ChunkCoord, CoordinateSystem, LocalOffset, WorldPos};
use crate::error::{Result, TerrainError};
use crate::generation::{GenerationMode, GenerationStrategy};
use crate::pathfinding::PathfindingMap;
use crate::tile::{Material, Tile};

/// A chunked terrain.
///
/// Tile `(tx, ty)` lives in chunk `(tx / chunk_size, ty / chunk_size)` at
/// local offset `(tx % chunk_size, ty % chunk_size)`. Chunks are stored
/// row-major by chunk coordinate.
#[derive(Clone, Debug)]
pub struct GridTerrain {
    config: TerrainConfig,
    coords: CoordinateSystem,
    seed: u64,
    mode: GenerationMode,
    strategy: GenerationStrategy,
    chunks: Vec<Chunk>,
}

impl GridTerrain {
    /// Build a terrain with the default material table.
    pub fn new(config: &TerrainConfig, seed: u64, mode: GenerationMode) -> Result<Self> {
        Self::with_strategy(config, seed, mode, GenerationStrategy::default())
    }

    /// Build a terrain, generating every chunk unless `mode` is sparse.
    pub fn with_strategy(
        config: &TerrainConfig,
        seed: u64,
        mode: GenerationMode,
        strategy: GenerationStrategy,
    ) -> Result<Self> {
        config.validate()?;
        strategy.validate()?;
        let coords = config.coordinate_system()?;

        let fill = strategy.materials.default_material;
        let mut chunks = Vec::with_capacity(config.chunks_wide * config.chunks_tall);
        for cy in 0..config.chunks_tall {
            for cx in 0..config.chunks_wide {
                chunks.push(Chunk::new(ChunkCoord::new(cx, cy), &coords, fill));
            }
        }

        if mode == GenerationMode::Perlin {
            let field = strategy.field(seed);
            let materials = strategy.materials.seeded(seed);
            for chunk in chunks.iter_mut() {
                chunk.generate_with(&field, &materials, &coords);
            }
        }

        let (w, h) = config.tiles();
        info!(
            "Built {}x{} tile terrain ({}x{} chunks of {}, seed {}, mode {})",
            w,
            h,
            config.chunks_wide,
            config.chunks_tall,
            config.chunk_size,
            seed,
            mode.name()
        );

        Ok(Self {
            config: *config,
            coords,
            seed,
            mode,
            strategy,
            chunks,
        })
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn coords(&self) -> &CoordinateSystem {
        &self.coords
    }

    /// Mutable access to the coordinate system, e.g. to move the view origin.
    pub fn coords_mut(&mut self) -> &mut CoordinateSystem {
        &mut self.coords
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn mode(&self) -> GenerationMode {
        self.mode
    }

    pub fn strategy(&self) -> &GenerationStrategy {
        &self.strategy
    }

    pub fn chunk_size(&self) -> usize {
        self.config.chunk_size
    }

    pub fn chunks_wide(&self) -> usize {
        self.config.chunks_wide
    }

    pub fn chunks_tall(&self) -> usize {
        self.config.chunks_tall
    }

    /// `(tiles_wide, tiles_tall)`.
    pub fn total_size(&self) -> (usize, usize) {
        self.config.tiles()
    }

    pub fn in_bounds(&self, tile_x: usize, tile_y: usize) -> bool {
        let (w, h) = self.total_size();
        tile_x < w && tile_y < h
    }

    fn check_bounds(&self, tile_x: usize, tile_y: usize) -> Result<()> {
        if self.in_bounds(tile_x, tile_y) {
            Ok(())
        } else {
            let (w, h) = self.total_size();
            Err(TerrainError::out_of_bounds(tile_x as i64, tile_y as i64, w, h))
        }
    }

    fn chunk_slot(&self, chunk: ChunkCoord) -> Result<usize> {
        if chunk.x < self.config.chunks_wide && chunk.y < self.config.chunks_tall {
            Ok(chunk.y * self.config.chunks_wide + chunk.x)
        } else {
            Err(TerrainError::out_of_bounds(
                chunk.x as i64,
                chunk.y as i64,
                self.config.chunks_wide,
                self.config.chunks_tall,
            ))
        }
    }

    /// Owning chunk and local offset of a terrain tile.
    pub fn resolve(&self, tile_x: usize, tile_y: usize) -> Result<(ChunkCoord, LocalOffset)> {
        self.check_bounds(tile_x, tile_y)?;
        Ok(self.coords.split_tile(tile_x, tile_y))
    }

    pub fn tile_at(&self, tile_x: usize, tile_y: usize) -> Result<&Tile> {
        let (chunk, local) = self.resolve(tile_x, tile_y)?;
        self.chunk(chunk.x, chunk.y)?.tile(local.x, local.y)
    }

    pub fn set_tile_at(&mut self, tile_x: usize, tile_y: usize, tile: Tile) -> Result<()> {
        let (chunk, local) = self.resolve(tile_x, tile_y)?;
        self.chunk_mut(chunk)?.set_tile(local.x, local.y, tile)
    }

    /// Change only the material of a tile, keeping its cached render offset.
    pub fn set_material_at(&mut self, tile_x: usize, tile_y: usize, material: Material) -> Result<()> {
        let (chunk, local) = self.resolve(tile_x, tile_y)?;
        self.chunk_mut(chunk)?.set_material(local.x, local.y, material)
    }

    /// Tile under a world position.
    pub fn tile_at_world(&self, pos: WorldPos) -> Result<&Tile> {
        let (tx, ty) = self.coords.world_to_tile(pos);
        let (w, h) = self.total_size();
        if tx < 0 || ty < 0 {
            return Err(TerrainError::out_of_bounds(tx, ty, w, h));
        }
        self.tile_at(tx as usize, ty as usize)
    }

    /// Row-major index over the whole terrain (not per chunk).
    pub fn array_index_for(&self, tile_x: usize, tile_y: usize) -> Result<usize> {
        self.check_bounds(tile_x, tile_y)?;
        Ok(tile_y * self.total_size().0 + tile_x)
    }

    pub fn chunk(&self, chunk_x: usize, chunk_y: usize) -> Result<&Chunk> {
        let slot = self.chunk_slot(ChunkCoord::new(chunk_x, chunk_y))?;
        Ok(&self.chunks[slot])
    }

    fn chunk_mut(&mut self, chunk: ChunkCoord) -> Result<&mut Chunk> {
        let slot = self.chunk_slot(chunk)?;
        Ok(&mut self.chunks[slot])
    }

    pub fn chunk_for_tile(&self, tile_x: usize, tile_y: usize) -> Result<&Chunk> {
        let (chunk, _) = self.resolve(tile_x, tile_y)?;
        self.chunk(chunk.x, chunk.y)
    }

    /// All chunks, row-major by chunk coordinate.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub(crate) fn chunk_by_slot(&self, slot: usize) -> Option<&Chunk> {
        self.chunks.get(slot)
    }

    /// Every tile with its terrain coordinate, row-major over the terrain.
    pub fn iter_tiles(&self) -> impl Iterator<Item = (usize, usize, &Tile)> + '_ {
        let (w, h) = self.total_size();
        (0..h).flat_map(move |y| {
            (0..w).filter_map(move |x| self.tile_at(x, y).ok().map(|tile| (x, y, tile)))
        })
    }

    /// The chunk as the terrain's seed and mode would produce it, ignoring
    /// later edits.
    pub fn baseline_chunk(&self, chunk_x: usize, chunk_y: usize) -> Result<Chunk> {
        let position = ChunkCoord::new(chunk_x, chunk_y);
        self.chunk_slot(position)?;
        let mut chunk = Chunk::new(position, &self.coords, self.strategy.materials.default_material);
        if self.mode == GenerationMode::Perlin {
            chunk.generate(self.seed, &self.strategy, &self.coords);
        }
        Ok(chunk)
    }

    /// Discard edits to one chunk and restore its seeded content.
    pub fn regenerate_chunk(&mut self, chunk_x: usize, chunk_y: usize) -> Result<()> {
        let fresh = self.baseline_chunk(chunk_x, chunk_y)?;
        *self.chunk_mut(ChunkCoord::new(chunk_x, chunk_y))? = fresh;
        Ok(())
    }

    /// Swap in a chunk (e.g. one restored from storage).
    pub fn replace_chunk(&mut self, chunk: Chunk) -> Result<()> {
        if chunk.size() != self.config.chunk_size {
            return Err(TerrainError::Configuration(format!(
                "{} has size {}, terrain uses {}",
                chunk.position(),
                chunk.size(),
                self.config.chunk_size
            )));
        }
        let position = chunk.position();
        *self.chunk_mut(position)? = chunk;
        Ok(())
    }

    /// Apply a batch of material edits. Every coordinate is checked first so
    /// a bad entry leaves the terrain untouched.
    pub fn apply_tiles<I>(&mut self, tiles: I) -> Result<usize>
    where
        I: IntoIterator<Item = (usize, usize, Material)>,
    {
        let tiles: Vec<_> = tiles.into_iter().collect();
        for &(x, y, _) in &tiles {
            self.check_bounds(x, y)?;
        }
        for &(x, y, material) in &tiles {
            self.set_material_at(x, y, material)?;
        }
        Ok(tiles.len())
    }

    /// Tile count per material, in material order.
    pub fn count_materials(&self) -> BTreeMap<Material, usize> {
        let mut counts = BTreeMap::new();
        for chunk in &self.chunks {
            for tile in chunk.tiles() {
                *counts.entry(tile.material).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Flat snapshot view for pathfinding.
    pub fn pathfinding_map(&self) -> PathfindingMap<'_> {
        PathfindingMap::new(self)
    }
}
