//! A* search over a [`PathfindingMap`].

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::trace;

use crate::error::Result;
use crate::tile::Tile;

use super::map::{PathfindingMap, CARDINAL, DIAGONAL};
use super::Connectivity;

const UNSEEN: u32 = u32::MAX;
const NO_PARENT: usize = usize::MAX;

/// Search settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathOptions {
    pub connectivity: Connectivity,
    /// Allow a diagonal step between two impassable orthogonal tiles.
    pub allow_corner_cutting: bool,
    /// Give up (no path) after expanding this many nodes.
    pub max_expansions: Option<usize>,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            connectivity: Connectivity::Four,
            allow_corner_cutting: false,
            max_expansions: None,
        }
    }
}

impl PathOptions {
    pub fn with_connectivity(connectivity: Connectivity) -> Self {
        Self {
            connectivity,
            ..Self::default()
        }
    }
}

/// Frontier entry. Lower `f` first, then earlier insertion.
#[derive(Clone, Copy)]
struct FrontierNode {
    f: u32,
    seq: u64,
    index: usize,
}

impl PartialEq for FrontierNode {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f && self.seq == other.seq
    }
}

impl Eq for FrontierNode {}

impl PartialOrd for FrontierNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap
        other.f.cmp(&self.f).then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Find a minimal-step path from `start` to `goal`.
///
/// Returns `Ok(None)` when the endpoints are disconnected, either endpoint is
/// not traversable, or the expansion budget runs out. Out-of-range endpoints
/// are an error.
pub fn find_path<F>(
    map: &PathfindingMap<'_>,
    start: (usize, usize),
    goal: (usize, usize),
    options: &PathOptions,
    traversable: F,
) -> Result<Option<Vec<(usize, usize)>>>
where
    F: Fn(&Tile) -> bool,
{
    let start_idx = map.checked_index(start.0, start.1)?;
    let goal_idx = map.checked_index(goal.0, goal.1)?;

    let passable: Vec<bool> = map
        .tile_store()
        .iter()
        .map(|&handle| map.resolve(handle).map_or(false, &traversable))
        .collect();

    if !passable[start_idx] || !passable[goal_idx] {
        return Ok(None);
    }

    let node_count = passable.len();
    let mut g_score = vec![UNSEEN; node_count];
    let mut came_from = vec![NO_PARENT; node_count];
    let mut closed = vec![false; node_count];
    let mut frontier = BinaryHeap::new();
    let mut seq = 0u64;
    let mut expansions = 0usize;

    g_score[start_idx] = 0;
    frontier.push(FrontierNode {
        f: options.connectivity.distance(start, goal),
        seq,
        index: start_idx,
    });

    while let Some(FrontierNode { index, .. }) = frontier.pop() {
        if closed[index] {
            continue;
        }
        if index == goal_idx {
            trace!("Path found after {} expansions", expansions);
            return Ok(Some(reconstruct(map, &came_from, goal_idx)));
        }
        closed[index] = true;

        expansions += 1;
        if options.max_expansions.map_or(false, |limit| expansions > limit) {
            trace!("Expansion budget of {} exhausted", expansions - 1);
            return Ok(None);
        }

        let current = map.coordinate_of(index);
        let next_g = g_score[index] + 1;
        for next in successors(map, &passable, current, options) {
            let next_idx = map.index(next.0, next.1);
            if closed[next_idx] || next_g >= g_score[next_idx] {
                continue;
            }
            g_score[next_idx] = next_g;
            came_from[next_idx] = index;
            seq += 1;
            frontier.push(FrontierNode {
                f: next_g + options.connectivity.distance(next, goal),
                seq,
                index: next_idx,
            });
        }
    }

    trace!("No path after {} expansions", expansions);
    Ok(None)
}

/// Path using each tile's own material traversability.
pub fn find_walkable_path(
    map: &PathfindingMap<'_>,
    start: (usize, usize),
    goal: (usize, usize),
    options: &PathOptions,
) -> Result<Option<Vec<(usize, usize)>>> {
    find_path(map, start, goal, options, Tile::is_traversable)
}

/// Traversable tiles reachable in one step from `pos`.
pub(crate) fn successors(
    map: &PathfindingMap<'_>,
    passable: &[bool],
    pos: (usize, usize),
    options: &PathOptions,
) -> Vec<(usize, usize)> {
    let open = |x: usize, y: usize| passable[map.index(x, y)];
    let mut result = Vec::with_capacity(8);

    for &(dx, dy) in &CARDINAL {
        if let Some((nx, ny)) = map.offset(pos.0, pos.1, dx, dy) {
            if open(nx, ny) {
                result.push((nx, ny));
            }
        }
    }

    if options.connectivity == Connectivity::Eight {
        for &(dx, dy) in &DIAGONAL {
            let Some((nx, ny)) = map.offset(pos.0, pos.1, dx, dy) else {
                continue;
            };
            if !open(nx, ny) {
                continue;
            }
            // Both orthogonal tiles exist whenever the diagonal does.
            let side_a = open(nx, pos.1);
            let side_b = open(pos.0, ny);
            if options.allow_corner_cutting || (side_a && side_b) {
                result.push((nx, ny));
            }
        }
    }

    result
}

fn reconstruct(map: &PathfindingMap<'_>, came_from: &[usize], goal_idx: usize) -> Vec<(usize, usize)> {
    let mut path = vec![map.coordinate_of(goal_idx)];
    let mut current = goal_idx;
    while came_from[current] != NO_PARENT {
        current = came_from[current];
        path.push(map.coordinate_of(current));
    }
    path.reverse();
    path
}

/// Number of steps in a path (0 for a single-tile path).
pub fn path_steps(path: &[(usize, usize)]) -> usize {
    path.len().saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::config::TerrainConfig;
    use crate::error::TerrainError;
    use crate::generation::GenerationMode;
    use crate::terrain::GridTerrain;
    use crate::tile::Material;

    fn open_terrain(chunks: usize, chunk_size: usize) -> GridTerrain {
        GridTerrain::new(
            &TerrainConfig::new(chunks, chunks, chunk_size, 16.0),
            1,
            GenerationMode::Sparse,
        )
        .unwrap()
    }

    fn assert_valid_path(t: &GridTerrain, path: &[(usize, usize)], connectivity: Connectivity) {
        for pair in path.windows(2) {
            let dx = pair[0].0.abs_diff(pair[1].0);
            let dy = pair[0].1.abs_diff(pair[1].1);
            match connectivity {
                Connectivity::Four => assert_eq!(dx + dy, 1),
                Connectivity::Eight => assert!(dx <= 1 && dy <= 1 && dx + dy > 0),
            }
        }
        for &(x, y) in path {
            assert!(t.tile_at(x, y).unwrap().is_traversable());
        }
    }

    /// Breadth-first reference distance under the same movement rules.
    fn bfs_steps(map: &PathfindingMap<'_>, start: (usize, usize), goal: (usize, usize), options: &PathOptions) -> Option<usize> {
        let passable: Vec<bool> = map
            .tile_store()
            .iter()
            .map(|&h| map.resolve(h).unwrap().is_traversable())
            .collect();
        if !passable[map.index(start.0, start.1)] || !passable[map.index(goal.0, goal.1)] {
            return None;
        }
        let mut dist = vec![usize::MAX; passable.len()];
        let mut queue = VecDeque::new();
        dist[map.index(start.0, start.1)] = 0;
        queue.push_back(start);
        while let Some(pos) = queue.pop_front() {
            let d = dist[map.index(pos.0, pos.1)];
            if pos == goal {
                return Some(d);
            }
            for next in successors(map, &passable, pos, options) {
                let idx = map.index(next.0, next.1);
                if dist[idx] == usize::MAX {
                    dist[idx] = d + 1;
                    queue.push_back(next);
                }
            }
        }
        None
    }

    #[test]
    fn test_open_terrain_manhattan() {
        let t = open_terrain(3, 8);
        let map = t.pathfinding_map();
        let options = PathOptions::with_connectivity(Connectivity::Four);

        let path = find_walkable_path(&map, (1, 2), (20, 17), &options).unwrap().unwrap();
        assert_eq!(path.first(), Some(&(1, 2)));
        assert_eq!(path.last(), Some(&(20, 17)));
        assert_eq!(path_steps(&path), 19 + 15);
        assert_valid_path(&t, &path, Connectivity::Four);
    }

    #[test]
    fn test_open_terrain_chebyshev() {
        let t = open_terrain(3, 8);
        let map = t.pathfinding_map();
        let options = PathOptions::with_connectivity(Connectivity::Eight);

        for (start, goal) in [((0, 0), (23, 23)), ((5, 20), (18, 2)), ((4, 4), (4, 11))] {
            let path = find_walkable_path(&map, start, goal, &options).unwrap().unwrap();
            assert_eq!(path_steps(&path) as u32, Connectivity::Eight.distance(start, goal));
            assert_valid_path(&t, &path, Connectivity::Eight);
        }
    }

    #[test]
    fn test_wall_blocks_path() {
        let mut t = open_terrain(3, 8);
        for y in 0..24 {
            t.set_material_at(12, y, Material::Stone).unwrap();
        }
        let map = t.pathfinding_map();

        for connectivity in [Connectivity::Four, Connectivity::Eight] {
            let options = PathOptions::with_connectivity(connectivity);
            assert_eq!(find_walkable_path(&map, (2, 5), (20, 5), &options).unwrap(), None);
        }
    }

    #[test]
    fn test_diagonal_wall_cannot_be_squeezed_through() {
        let mut t = open_terrain(1, 8);
        // Anti-diagonal wall of stone from (7,0) to (0,7).
        for i in 0..8 {
            t.set_material_at(7 - i, i, Material::Stone).unwrap();
        }
        let map = t.pathfinding_map();

        let strict = PathOptions::with_connectivity(Connectivity::Eight);
        assert_eq!(find_walkable_path(&map, (0, 0), (7, 7), &strict).unwrap(), None);

        let loose = PathOptions {
            allow_corner_cutting: true,
            ..strict
        };
        assert!(find_walkable_path(&map, (0, 0), (7, 7), &loose).unwrap().is_some());
    }

    #[test]
    fn test_route_around_obstacle() {
        let mut t = open_terrain(2, 8);
        for y in 0..12 {
            t.set_material_at(8, y, Material::Water).unwrap();
        }
        let map = t.pathfinding_map();
        let options = PathOptions::default();

        let path = find_walkable_path(&map, (4, 4), (12, 4), &options).unwrap().unwrap();
        assert_valid_path(&t, &path, Connectivity::Four);
        assert!(path.contains(&(8, 12)) || path.contains(&(8, 13)) || path.contains(&(8, 14)) || path.contains(&(8, 15)));
        // Down to row 12, across, and back up.
        assert_eq!(path_steps(&path), 8 + 8 + 8);
    }

    #[test]
    fn test_endpoints_on_impassable_tiles() {
        let mut t = open_terrain(2, 4);
        t.set_material_at(0, 0, Material::Stone).unwrap();
        t.set_material_at(7, 7, Material::Water).unwrap();
        let map = t.pathfinding_map();
        let options = PathOptions::default();

        assert_eq!(find_walkable_path(&map, (0, 0), (3, 3), &options).unwrap(), None);
        assert_eq!(find_walkable_path(&map, (3, 3), (7, 7), &options).unwrap(), None);
    }

    #[test]
    fn test_out_of_bounds_endpoints() {
        let t = open_terrain(2, 4);
        let map = t.pathfinding_map();
        let options = PathOptions::default();

        assert!(matches!(
            find_walkable_path(&map, (8, 0), (0, 0), &options),
            Err(TerrainError::OutOfBounds { x: 8, y: 0, .. })
        ));
        assert!(find_walkable_path(&map, (0, 0), (0, 8), &options).is_err());
    }

    #[test]
    fn test_start_equals_goal() {
        let t = open_terrain(1, 4);
        let map = t.pathfinding_map();
        let path = find_walkable_path(&map, (2, 2), (2, 2), &PathOptions::default()).unwrap();
        assert_eq!(path, Some(vec![(2, 2)]));
    }

    #[test]
    fn test_custom_predicate() {
        let t = open_terrain(1, 8);
        let map = t.pathfinding_map();
        // Everything is dirt; a predicate rejecting dirt leaves nothing walkable.
        let path = find_path(&map, (0, 0), (3, 3), &PathOptions::default(), |tile| {
            tile.material != Material::Dirt
        })
        .unwrap();
        assert_eq!(path, None);
    }

    #[test]
    fn test_expansion_budget() {
        let t = open_terrain(4, 8);
        let map = t.pathfinding_map();
        let options = PathOptions {
            max_expansions: Some(5),
            ..PathOptions::default()
        };
        assert_eq!(find_walkable_path(&map, (0, 0), (31, 31), &options).unwrap(), None);
    }

    #[test]
    fn test_tie_breaking_is_deterministic() {
        let t = open_terrain(2, 8);
        let map = t.pathfinding_map();
        let options = PathOptions::default();

        let first = find_walkable_path(&map, (0, 0), (9, 9), &options).unwrap();
        for _ in 0..5 {
            assert_eq!(find_walkable_path(&map, (0, 0), (9, 9), &options).unwrap(), first);
        }
    }

    #[test]
    fn test_equal_cost_ties_pop_in_insertion_order() {
        let t = open_terrain(2, 2);
        let map = t.pathfinding_map();
        let options = PathOptions::with_connectivity(Connectivity::Four);

        // Every monotone route has f = 4. Expanding the oldest frontier node
        // first follows the east neighbour pushed before the south one.
        let path = find_walkable_path(&map, (0, 0), (2, 2), &options).unwrap().unwrap();
        assert_eq!(path, vec![(0, 0), (1, 0), (2, 0), (2, 1), (2, 2)]);
    }

    #[test]
    fn test_matches_breadth_first_on_random_fields() {
        let mut rng = ChaCha8Rng::seed_from_u64(2024);

        for round in 0..12 {
            let mut t = open_terrain(3, 6);
            let (w, h) = t.total_size();
            for y in 0..h {
                for x in 0..w {
                    if rng.gen::<f64>() < 0.3 {
                        t.set_material_at(x, y, Material::Stone).unwrap();
                    }
                }
            }
            let map = t.pathfinding_map();

            for connectivity in [Connectivity::Four, Connectivity::Eight] {
                let options = PathOptions::with_connectivity(connectivity);
                let start = (rng.gen_range(0..w), rng.gen_range(0..h));
                let goal = (rng.gen_range(0..w), rng.gen_range(0..h));

                let expected = bfs_steps(&map, start, goal, &options);
                let found = find_walkable_path(&map, start, goal, &options).unwrap();
                assert_eq!(
                    found.as_deref().map(path_steps),
                    expected,
                    "round {} {:?} {:?} -> {:?}",
                    round,
                    connectivity,
                    start,
                    goal
                );
                if let Some(path) = found {
                    assert_valid_path(&t, &path, connectivity);
                }
            }
        }
    }
}
