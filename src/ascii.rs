//! ASCII rendering of terrains for terminal output.

use std::collections::{BTreeMap, HashSet};

use crate::terrain::GridTerrain;
use crate::tile::Material;

/// Character used for tiles on a path overlay.
pub const PATH_CHAR: char = '*';

/// Render a terrain as one line per tile row, optionally overlaying a path.
pub fn render_terrain(terrain: &GridTerrain, path: Option<&[(usize, usize)]>) -> String {
    let (width, height) = terrain.total_size();
    let on_path: HashSet<(usize, usize)> = path
        .map(|p| p.iter().copied().collect())
        .unwrap_or_default();

    let mut output = String::with_capacity((width + 1) * height);
    for (x, y, tile) in terrain.iter_tiles() {
        if on_path.contains(&(x, y)) {
            output.push(PATH_CHAR);
        } else {
            output.push(tile.material.ascii_char());
        }
        if x + 1 == width {
            output.push('\n');
        }
    }
    output
}

/// One line per material: character, name, count and share of the terrain.
pub fn render_legend(counts: &BTreeMap<Material, usize>) -> String {
    let total: usize = counts.values().sum();
    let mut output = String::new();
    for (material, count) in counts {
        let share = if total == 0 {
            0.0
        } else {
            *count as f64 * 100.0 / total as f64
        };
        output.push_str(&format!(
            "  {} {:<6} {:>7} ({:5.1}%)\n",
            material.ascii_char(),
            material.name(),
            count,
            share
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TerrainConfig;
    use crate::generation::GenerationMode;

    #[test]
    fn test_render_dimensions() {
        let terrain = GridTerrain::new(&TerrainConfig::new(2, 1, 4, 16.0), 5, GenerationMode::Perlin).unwrap();
        let text = render_terrain(&terrain, None);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().all(|l| l.chars().count() == 8));
    }

    #[test]
    fn test_path_overlay() {
        let mut terrain = GridTerrain::new(&TerrainConfig::new(1, 1, 3, 16.0), 0, GenerationMode::Sparse).unwrap();
        terrain.set_material_at(2, 2, Material::Stone).unwrap();
        let text = render_terrain(&terrain, Some(&[(0, 0), (1, 0), (1, 1)]));
        assert_eq!(text, "**,\n,*,\n,,#\n");
    }

    #[test]
    fn test_legend() {
        let terrain = GridTerrain::new(&TerrainConfig::new(1, 1, 2, 16.0), 0, GenerationMode::Sparse).unwrap();
        let legend = render_legend(&terrain.count_materials());
        assert!(legend.contains("dirt"));
        assert!(legend.contains("100.0%"));
    }
}
