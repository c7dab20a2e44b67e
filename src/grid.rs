//! Rectangular, randomly addressable tile storage.

use serde::{Deserialize, Serialize};

use crate::coords::{ChunkCoord, WorldPos};
use crate::error::{Result, TerrainError};

/// A 2D grid in row-major order, anchored at a world position.
///
/// Unlike a wrapping world map, out-of-range coordinates are errors: the grid
/// knows nothing about its neighbours, so callers that own several grids
/// resolve the right one before indexing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid<T>", bound(deserialize = "T: Deserialize<'de>"))]
pub struct Grid<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
    /// World position of the top-left tile.
    span_top_left: WorldPos,
    /// Logical coordinate of this grid within a larger terrain.
    origin_index: ChunkCoord,
    tile_size: f32,
}

/// Serialized form of [`Grid`], checked by `from_raw` on the way in.
#[derive(Deserialize)]
struct RawGrid<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
    span_top_left: WorldPos,
    origin_index: ChunkCoord,
    tile_size: f32,
}

impl<T> TryFrom<RawGrid<T>> for Grid<T> {
    type Error = TerrainError;

    fn try_from(raw: RawGrid<T>) -> Result<Self> {
        Grid::from_raw(
            raw.width,
            raw.height,
            raw.data,
            raw.span_top_left,
            raw.origin_index,
            raw.tile_size,
        )
    }
}

impl<T: Clone> Grid<T> {
    pub fn new_with(
        width: usize,
        height: usize,
        value: T,
        span_top_left: WorldPos,
        origin_index: ChunkCoord,
        tile_size: f32,
    ) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
            span_top_left,
            origin_index,
            tile_size,
        }
    }

    /// Fill the entire grid with a value.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }
}

impl<T> Grid<T> {
    /// Build a grid around existing row-major data.
    pub fn from_raw(
        width: usize,
        height: usize,
        data: Vec<T>,
        span_top_left: WorldPos,
        origin_index: ChunkCoord,
        tile_size: f32,
    ) -> Result<Self> {
        if width.checked_mul(height) != Some(data.len()) {
            return Err(TerrainError::Configuration(format!(
                "grid data has {} cells, expected {}x{}",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
            span_top_left,
            origin_index,
            tile_size,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)` in tiles.
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn span_top_left(&self) -> WorldPos {
        self.span_top_left
    }

    pub fn origin_index(&self) -> ChunkCoord {
        self.origin_index
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    fn bounds_error(&self, x: i64, y: i64) -> TerrainError {
        TerrainError::out_of_bounds(x, y, self.width, self.height)
    }

    /// Row-major index of `(x, y)`.
    pub fn index_of(&self, x: usize, y: usize) -> Result<usize> {
        if !self.in_bounds(x, y) {
            return Err(self.bounds_error(x as i64, y as i64));
        }
        Ok(y * self.width + x)
    }

    /// Inverse of [`index_of`](Self::index_of).
    pub fn coordinate_of(&self, index: usize) -> Result<(usize, usize)> {
        if index >= self.data.len() {
            // Report the coordinate the index would land on.
            let (x, y) = if self.width == 0 {
                (index, 0)
            } else {
                (index % self.width, index / self.width)
            };
            return Err(self.bounds_error(x as i64, y as i64));
        }
        Ok((index % self.width, index / self.width))
    }

    pub fn get(&self, x: usize, y: usize) -> Result<&T> {
        let idx = self.index_of(x, y)?;
        Ok(&self.data[idx])
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> Result<&mut T> {
        let idx = self.index_of(x, y)?;
        Ok(&mut self.data[idx])
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) -> Result<()> {
        let idx = self.index_of(x, y)?;
        self.data[idx] = value;
        Ok(())
    }

    /// Direct access by row-major index.
    pub fn get_index(&self, index: usize) -> Option<&T> {
        self.data.get(index)
    }

    /// World position of the top-left corner of `(x, y)`.
    pub fn relative_position_of(&self, x: usize, y: usize) -> Result<WorldPos> {
        self.index_of(x, y)?;
        Ok(self.span_top_left.offset(
            x as f32 * self.tile_size,
            y as f32 * self.tile_size,
        ))
    }

    /// Backing cells in row-major order.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Iterate over all cells with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        self.data.iter().enumerate().map(move |(idx, val)| {
            let x = idx % self.width;
            let y = idx / self.width;
            (x, y, val)
        })
    }

    /// Iterate mutably over all cells with their coordinates.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, usize, &mut T)> {
        let width = self.width;
        self.data.iter_mut().enumerate().map(move |(idx, val)| {
            let x = idx % width;
            let y = idx / width;
            (x, y, val)
        })
    }
}
