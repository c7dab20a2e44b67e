//! Fixed-size square blocks of tiles, the unit of generation and storage.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::coords::{ChunkCoord, CoordinateSystem, LocalOffset, WorldPos};
use crate::error::{Result, TerrainError};
use crate::generation::{GenerationStrategy, NoiseField};
use crate::grid::Grid;
use crate::material::MaterialModel;
use crate::tile::{Material, Tile};

/// A `chunk_size` x `chunk_size` square of terrain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawChunk")]
pub struct Chunk {
    position: ChunkCoord,
    grid: Grid<Tile>,
    generated: bool,
    /// Seed of the last generation pass, `None` if never generated or
    /// generated from an unseeded model.
    generated_from: Option<u64>,
}

#[derive(Deserialize)]
struct RawChunk {
    position: ChunkCoord,
    grid: Grid<Tile>,
    generated: bool,
    generated_from: Option<u64>,
}

impl TryFrom<RawChunk> for Chunk {
    type Error = TerrainError;

    fn try_from(raw: RawChunk) -> Result<Self> {
        let (width, height) = raw.grid.size();
        if width != height {
            return Err(TerrainError::Configuration(format!(
                "{} has a {}x{} grid, expected a square",
                raw.position, width, height
            )));
        }
        Ok(Self {
            position: raw.position,
            grid: raw.grid,
            generated: raw.generated,
            generated_from: raw.generated_from,
        })
    }
}

impl Chunk {
    /// An ungenerated chunk filled with `fill`.
    pub fn new(position: ChunkCoord, coords: &CoordinateSystem, fill: Material) -> Self {
        let size = coords.chunk_size();
        let mut grid = Grid::new_with(
            size,
            size,
            Tile::new(fill),
            coords.chunk_span_top_left(position),
            position,
            coords.tile_size(),
        );
        for (x, y, tile) in grid.iter_mut() {
            let (tx, ty) = coords.join_tile(position, LocalOffset::new(x, y));
            tile.render_offset = Some(coords.tile_to_world(tx, ty));
        }
        Self {
            position,
            grid,
            generated: false,
            generated_from: None,
        }
    }

    pub fn position(&self) -> ChunkCoord {
        self.position
    }

    /// Side length in tiles.
    pub fn size(&self) -> usize {
        self.grid.width()
    }

    pub fn span_top_left(&self) -> WorldPos {
        self.grid.span_top_left()
    }

    pub fn grid(&self) -> &Grid<Tile> {
        &self.grid
    }

    pub fn is_generated(&self) -> bool {
        self.generated
    }

    pub fn generated_from(&self) -> Option<u64> {
        self.generated_from
    }

    pub fn tile(&self, local_x: usize, local_y: usize) -> Result<&Tile> {
        self.grid.get(local_x, local_y)
    }

    pub fn set_tile(&mut self, local_x: usize, local_y: usize, tile: Tile) -> Result<()> {
        self.grid.set(local_x, local_y, tile)
    }

    /// Change a tile's material, keeping its cached render offset.
    pub fn set_material(&mut self, local_x: usize, local_y: usize, material: Material) -> Result<()> {
        self.grid.get_mut(local_x, local_y)?.material = material;
        Ok(())
    }

    /// Overwrite every tile's material.
    pub fn fill_material(&mut self, material: Material) {
        for (_, _, tile) in self.grid.iter_mut() {
            tile.material = material;
        }
    }

    pub fn tiles(&self) -> &[Tile] {
        self.grid.as_slice()
    }

    pub fn count(&self, material: Material) -> usize {
        self.tiles().iter().filter(|t| t.material == material).count()
    }

    /// Generate this chunk from a terrain seed.
    ///
    /// Builds the seed's noise field; when generating many chunks, build the
    /// field once and call [`generate_with`](Self::generate_with).
    pub fn generate(&mut self, seed: u64, strategy: &GenerationStrategy, coords: &CoordinateSystem) {
        let field = strategy.field(seed);
        let materials = strategy.materials.seeded(seed);
        self.generate_with(&field, &materials, coords);
    }

    /// Populate every tile from `field` through `materials`.
    ///
    /// The replacement tiles are computed in full before any are written.
    pub fn generate_with(
        &mut self,
        field: &dyn NoiseField,
        materials: &MaterialModel,
        coords: &CoordinateSystem,
    ) {
        let position = self.position;
        let tiles: Vec<Tile> = self
            .grid
            .iter()
            .map(|(x, y, _)| {
                let local = LocalOffset::new(x, y);
                let (gx, gy) = coords.generation_position(position, local);
                let material = materials.material_for(field.sample(gx, gy), (gx, gy));
                let (tx, ty) = coords.join_tile(position, local);
                Tile::with_offset(material, coords.tile_to_world(tx, ty))
            })
            .collect();

        for ((_, _, slot), tile) in self.grid.iter_mut().zip(tiles) {
            *slot = tile;
        }
        self.generated = true;
        self.generated_from = materials.seed();
        debug!("Generated {} ({} tiles)", position, self.grid.len());
    }
}
