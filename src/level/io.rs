//! Level import and export.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use log::{info, warn};
use serde_json::Value;

use crate::config::{AppConfig, TerrainConfig};
use crate::error::LevelError;
use crate::generation::{GenerationMode, GenerationStrategy};
use crate::terrain::GridTerrain;

use super::format::{EntityData, LevelData, TerrainData, TerrainKind, TileData};
use super::validate::{validate, ValidationLimits, ValidationReport};

/// A level loaded into a live terrain.
#[derive(Clone, Debug)]
pub struct Level {
    pub id: String,
    pub terrain: GridTerrain,
    pub entities: Vec<EntityData>,
}

/// Validate a JSON document and deserialize it.
pub fn parse_level(json: &str, limits: &ValidationLimits) -> Result<LevelData, LevelError> {
    let value: Value = serde_json::from_str(json)?;
    let report = validate(&value, limits);
    if !report.valid {
        warn!("Rejected level with {} validation error(s)", report.errors.len());
        return Err(LevelError::Validation(report));
    }
    Ok(serde_json::from_value(value)?)
}

/// Parse, validate and build a level. Either the whole level is built or
/// nothing is.
pub fn import_level(json: &str, config: &AppConfig) -> Result<Level, LevelError> {
    let data = parse_level(json, &config.validation)?;
    let terrain = build_terrain(&data, &config.terrain, &config.generation, &config.validation)?;
    info!(
        "Imported level '{}': {} tiles, {} entities",
        data.id,
        data.terrain.tiles.len(),
        data.entities.len()
    );
    Ok(Level {
        id: data.id,
        terrain,
        entities: data.entities,
    })
}

pub fn load_level<P: AsRef<Path>>(path: P, config: &AppConfig) -> Result<Level, LevelError> {
    let json = std::fs::read_to_string(path.as_ref())?;
    info!("Loading level from {}", path.as_ref().display());
    import_level(&json, config)
}

/// Build the terrain a level describes.
///
/// Without a seed the terrain starts as the default material; with one it is
/// generated first. Listed tiles are then applied on top. A strategy stored
/// in the level takes precedence over `strategy`.
pub fn build_terrain(
    data: &LevelData,
    base: &TerrainConfig,
    strategy: &GenerationStrategy,
    limits: &ValidationLimits,
) -> Result<GridTerrain, LevelError> {
    let config = level_config(data, base)?;
    let (width, height) = checked_extent(&config, limits).map_err(|e| {
        warn!("Level '{}' describes an oversized terrain", data.id);
        LevelError::Validation(ValidationReport::from_errors(vec![e]))
    })?;

    let mut errors = Vec::new();
    for (i, tile) in data.terrain.tiles.iter().enumerate() {
        if tile.grid_x >= width || tile.grid_y >= height {
            errors.push(format!(
                "tile {}: ({}, {}) lies outside the {}x{} terrain",
                i, tile.grid_x, tile.grid_y, width, height
            ));
        }
    }
    for (i, entity) in data.entities.iter().enumerate() {
        let p = entity.grid_position;
        if p.x >= width || p.y >= height {
            errors.push(format!(
                "entity {}: gridPosition ({}, {}) lies outside the {}x{} terrain",
                i, p.x, p.y, width, height
            ));
        }
    }
    if data.terrain.kind == TerrainKind::Dense && data.terrain.tiles.len() != width * height {
        errors.push(format!(
            "dense terrain lists {} tiles but the {}x{} terrain has {}",
            data.terrain.tiles.len(),
            width,
            height,
            width * height
        ));
    }
    if !errors.is_empty() {
        warn!("Level '{}' does not fit its terrain ({} errors)", data.id, errors.len());
        return Err(LevelError::Validation(ValidationReport::from_errors(errors)));
    }

    let (seed, mode) = match data.terrain.seed {
        Some(seed) => (seed, GenerationMode::Perlin),
        None => (0, GenerationMode::Sparse),
    };
    let strategy = data.terrain.generation.as_ref().unwrap_or(strategy);
    let mut terrain = GridTerrain::with_strategy(&config, seed, mode, strategy.clone())?;
    terrain.apply_tiles(
        data.terrain
            .tiles
            .iter()
            .map(|t| (t.grid_x, t.grid_y, t.material)),
    )?;
    Ok(terrain)
}

/// Tile extent of `config`, provided it stays within `limits`.
fn checked_extent(config: &TerrainConfig, limits: &ValidationLimits) -> Result<(usize, usize), String> {
    let (width, height) = config.checked_tiles().map_err(|e| e.to_string())?;
    let axis_limit = limits.max_axis_tiles();
    if width as u64 > axis_limit || height as u64 > axis_limit {
        return Err(format!(
            "terrain of {}x{} tiles exceeds maxCoordinate limit of {}",
            width, height, limits.max_coordinate
        ));
    }
    if (width as u64).saturating_mul(height as u64) > limits.max_terrain_tiles {
        return Err(format!(
            "terrain of {}x{} tiles exceeds maxTerrainTiles limit of {}",
            width, height, limits.max_terrain_tiles
        ));
    }
    Ok((width, height))
}

/// Terrain shape for a level: declared values win, then the extent of its
/// tiles and entities, then `base`.
fn level_config(data: &LevelData, base: &TerrainConfig) -> Result<TerrainConfig, LevelError> {
    let terrain = &data.terrain;
    let chunk_size = terrain.chunk_size.unwrap_or(base.chunk_size);
    if chunk_size == 0 {
        return Err(LevelError::Validation(ValidationReport::from_errors(vec![
            "terrain.chunkSize must be a positive integer".to_string(),
        ])));
    }

    let tile_extent = terrain.tiles.iter().map(|t| (t.grid_x, t.grid_y));
    let entity_extent = data.entities.iter().map(|e| (e.grid_position.x, e.grid_position.y));
    let extent = tile_extent
        .chain(entity_extent)
        .fold(None, |acc: Option<(usize, usize)>, (x, y)| {
            Some(acc.map_or((x, y), |(mx, my)| (mx.max(x), my.max(y))))
        });

    let inferred = |max: Option<usize>, fallback: usize| match max {
        Some(m) => m / chunk_size + 1,
        None => fallback,
    };

    Ok(TerrainConfig {
        chunks_wide: terrain
            .chunks_wide
            .unwrap_or_else(|| inferred(extent.map(|e| e.0), base.chunks_wide)),
        chunks_tall: terrain
            .chunks_tall
            .unwrap_or_else(|| inferred(extent.map(|e| e.1), base.chunks_tall)),
        chunk_size,
        tile_size: terrain.tile_size,
        view_origin: base.view_origin,
    })
}

/// Describe a terrain as a level document.
///
/// `Dense` lists every tile. `Sparse` lists only tiles that differ from what
/// the terrain's seed, mode and strategy would produce. The strategy is
/// written alongside, so importing either form reproduces the terrain
/// whatever the importer's own config says.
pub fn export_level(
    terrain: &GridTerrain,
    id: &str,
    entities: &[EntityData],
    kind: TerrainKind,
) -> Result<LevelData, LevelError> {
    let tiles = match kind {
        TerrainKind::Dense => terrain
            .iter_tiles()
            .map(|(x, y, tile)| TileData {
                grid_x: x,
                grid_y: y,
                material: tile.material,
            })
            .collect(),
        TerrainKind::Sparse => changed_tiles(terrain)?,
    };

    let seed = match terrain.mode() {
        GenerationMode::Perlin => Some(terrain.seed()),
        GenerationMode::Sparse => None,
    };

    info!(
        "Exported level '{}' as {} ({} tiles, {} entities)",
        id,
        kind.name(),
        tiles.len(),
        entities.len()
    );

    Ok(LevelData {
        id: id.to_string(),
        terrain: TerrainData {
            kind,
            tile_size: terrain.coords().tile_size(),
            seed,
            generation: Some(terrain.strategy().clone()),
            chunk_size: Some(terrain.chunk_size()),
            chunks_wide: Some(terrain.chunks_wide()),
            chunks_tall: Some(terrain.chunks_tall()),
            tiles,
        },
        entities: entities.to_vec(),
    })
}

/// Tiles that differ from each chunk's baseline, row-major over the terrain.
fn changed_tiles(terrain: &GridTerrain) -> Result<Vec<TileData>, LevelError> {
    let size = terrain.chunk_size();
    let mut tiles = Vec::new();
    for chunk in terrain.chunks() {
        let position = chunk.position();
        let baseline = terrain.baseline_chunk(position.x, position.y)?;
        for (index, (tile, base)) in chunk.tiles().iter().zip(baseline.tiles()).enumerate() {
            if tile.material != base.material {
                tiles.push(TileData {
                    grid_x: position.x * size + index % size,
                    grid_y: position.y * size + index / size,
                    material: tile.material,
                });
            }
        }
    }
    tiles.sort_by_key(|t| (t.grid_y, t.grid_x));
    Ok(tiles)
}

pub fn save_level<P: AsRef<Path>>(level: &LevelData, path: P) -> Result<(), LevelError> {
    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(BufWriter::new(file), level)?;
    info!("Saved level '{}' to {}", level.id, path.as_ref().display());
    Ok(())
}

/// Read a level file without validating or building it.
pub fn read_level_value<P: AsRef<Path>>(path: P) -> Result<Value, LevelError> {
    let file = File::open(path.as_ref())?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}
