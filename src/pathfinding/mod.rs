//! Grid pathfinding over chunked terrain.
//!
//! The search never sees chunks: [`PathfindingMap`] flattens a
//! [`GridTerrain`](crate::terrain::GridTerrain) into a single row-major grid
//! and [`find_path`] runs A* over it.
//!
//! # Example
//!
//! ```ignore
//! let map = terrain.pathfinding_map();
//! let options = PathOptions::with_connectivity(Connectivity::Eight);
//! match find_walkable_path(&map, (0, 0), (20, 12), &options)? {
//!     Some(path) => println!("{} steps", path_steps(&path)),
//!     None => println!("unreachable"),
//! }
//! ```

mod astar;
mod map;

pub use astar::{find_path, find_walkable_path, path_steps, PathOptions};
pub use map::{PathfindingMap, TileHandle};

/// Which neighbours a step may move to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Connectivity {
    /// North, east, south, west.
    #[default]
    Four,
    /// Cardinals plus diagonals, each step costing the same.
    Eight,
}

impl Connectivity {
    /// Minimum number of steps between two tiles on open ground
    /// (Manhattan or Chebyshev distance).
    pub fn distance(&self, a: (usize, usize), b: (usize, usize)) -> u32 {
        let dx = a.0.abs_diff(b.0) as u32;
        let dy = a.1.abs_diff(b.1) as u32;
        match self {
            Connectivity::Four => dx + dy,
            Connectivity::Eight => dx.max(dy),
        }
    }
}
