//! Flat, read-only view of a chunked terrain.

use crate::error::{Result, TerrainError};
use crate::terrain::GridTerrain;
use crate::tile::Tile;

use super::Connectivity;

/// Cardinal offsets, then diagonals; neighbour order is fixed so searches
/// are reproducible.
pub(super) const CARDINAL: [(i64, i64); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];
pub(super) const DIAGONAL: [(i64, i64); 4] = [(1, -1), (1, 1), (-1, 1), (-1, -1)];

/// Arena reference to a tile: chunk slot plus row-major slot in that chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileHandle {
    pub chunk: usize,
    pub local: usize,
}

/// Terrain flattened to `x_count * y_count` handles, position `(x, y)` at
/// `y * x_count + x`.
///
/// Holds indices into the terrain's chunk arena rather than copies, and
/// borrows the terrain so it cannot be edited while the view is alive.
/// Build a new view after edits.
pub struct PathfindingMap<'a> {
    terrain: &'a GridTerrain,
    x_count: usize,
    y_count: usize,
    tile_store: Vec<TileHandle>,
}

impl<'a> PathfindingMap<'a> {
    pub fn new(terrain: &'a GridTerrain) -> Self {
        let (x_count, y_count) = terrain.total_size();
        let coords = terrain.coords();
        let chunk_size = terrain.chunk_size();
        let chunks_wide = terrain.chunks_wide();

        let mut tile_store = Vec::with_capacity(x_count * y_count);
        for y in 0..y_count {
            for x in 0..x_count {
                let (chunk, local) = coords.split_tile(x, y);
                tile_store.push(TileHandle {
                    chunk: chunk.y * chunks_wide + chunk.x,
                    local: local.y * chunk_size + local.x,
                });
            }
        }

        Self {
            terrain,
            x_count,
            y_count,
            tile_store,
        }
    }

    pub fn x_count(&self) -> usize {
        self.x_count
    }

    pub fn y_count(&self) -> usize {
        self.y_count
    }

    pub fn tile_store(&self) -> &[TileHandle] {
        &self.tile_store
    }

    /// `y * x_count + x`, without bounds checking.
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.x_count + x
    }

    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.x_count && y < self.y_count
    }

    pub fn checked_index(&self, x: usize, y: usize) -> Result<usize> {
        if self.in_bounds(x, y) {
            Ok(self.index(x, y))
        } else {
            Err(TerrainError::out_of_bounds(x as i64, y as i64, self.x_count, self.y_count))
        }
    }

    pub fn coordinate_of(&self, index: usize) -> (usize, usize) {
        (index % self.x_count, index / self.x_count)
    }

    /// Look up the tile a handle points at.
    pub fn resolve(&self, handle: TileHandle) -> Option<&'a Tile> {
        self.terrain
            .chunk_by_slot(handle.chunk)
            .and_then(|chunk| chunk.grid().get_index(handle.local))
    }

    pub fn get(&self, x: usize, y: usize) -> Result<&'a Tile> {
        let index = self.checked_index(x, y)?;
        self.resolve(self.tile_store[index])
            .ok_or_else(|| TerrainError::out_of_bounds(x as i64, y as i64, self.x_count, self.y_count))
    }

    /// In-bounds neighbours of `(x, y)`, cardinals first.
    pub fn neighbors(&self, x: usize, y: usize, connectivity: Connectivity) -> Vec<(usize, usize)> {
        let diagonals: &[(i64, i64)] = match connectivity {
            Connectivity::Four => &[],
            Connectivity::Eight => &DIAGONAL,
        };
        CARDINAL
            .iter()
            .chain(diagonals.iter())
            .filter_map(|&(dx, dy)| self.offset(x, y, dx, dy))
            .collect()
    }

    pub(crate) fn offset(&self, x: usize, y: usize, dx: i64, dy: i64) -> Option<(usize, usize)> {
        let nx = x as i64 + dx;
        let ny = y as i64 + dy;
        if nx < 0 || ny < 0 || nx >= self.x_count as i64 || ny >= self.y_count as i64 {
            None
        } else {
            Some((nx as usize, ny as usize))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TerrainConfig;
    use crate::generation::GenerationMode;
    use crate::tile::Material;

    fn terrain() -> GridTerrain {
        GridTerrain::new(&TerrainConfig::new(3, 2, 4, 16.0), 99, GenerationMode::Perlin).unwrap()
    }

    #[test]
    fn test_adapter_matches_terrain() {
        let t = terrain();
        let map = t.pathfinding_map();

        assert_eq!((map.x_count(), map.y_count()), (12, 8));
        assert_eq!(map.tile_store().len(), 96);
        for y in 0..8 {
            for x in 0..12 {
                let handle = map.tile_store()[map.index(x, y)];
                assert_eq!(map.resolve(handle), Some(t.tile_at(x, y).unwrap()));
                assert_eq!(map.index(x, y), t.array_index_for(x, y).unwrap());
            }
        }
    }

    #[test]
    fn test_neighbors_cross_chunk_edges() {
        let mut t = GridTerrain::new(&TerrainConfig::new(2, 1, 4, 16.0), 1, GenerationMode::Sparse).unwrap();
        t.set_material_at(4, 1, Material::Stone).unwrap();
        let map = t.pathfinding_map();

        // (3, 1) is the last column of chunk 0; its east neighbour is in chunk 1.
        let neighbors = map.neighbors(3, 1, Connectivity::Four);
        assert_eq!(neighbors, vec![(3, 0), (4, 1), (3, 2), (2, 1)]);
        assert_eq!(map.get(4, 1).unwrap().material, Material::Stone);
    }

    #[test]
    fn test_corner_neighbors() {
        let t = terrain();
        let map = t.pathfinding_map();
        assert_eq!(map.neighbors(0, 0, Connectivity::Four), vec![(1, 0), (0, 1)]);
        assert_eq!(map.neighbors(0, 0, Connectivity::Eight), vec![(1, 0), (0, 1), (1, 1)]);
        assert_eq!(map.neighbors(5, 5, Connectivity::Eight).len(), 8);
    }

    #[test]
    fn test_out_of_bounds_lookup() {
        let t = terrain();
        let map = t.pathfinding_map();
        assert!(matches!(map.get(12, 0), Err(TerrainError::OutOfBounds { .. })));
        assert!(map.checked_index(0, 8).is_err());
    }
}
