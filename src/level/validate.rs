//! Schema validation for level documents.
//!
//! Works on raw JSON so every problem can be reported at once; typed
//! deserialization would stop at the first one.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::generation::GenerationStrategy;
use crate::tile::Material;

use super::format::EntityKind;

/// Size limits applied during validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationLimits {
    pub max_entities: usize,
    pub max_tiles: usize,
    pub max_coordinate: u64,
    /// Largest terrain (width x height in tiles) a level may describe.
    pub max_terrain_tiles: u64,
}

impl ValidationLimits {
    /// Longest terrain axis in tiles: every coordinate on it stays within
    /// `max_coordinate`.
    pub fn max_axis_tiles(&self) -> u64 {
        self.max_coordinate.saturating_add(1)
    }
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_entities: 1000,
            max_tiles: 1_000_000,
            max_coordinate: 10_000,
            max_terrain_tiles: 4_194_304,
        }
    }
}

/// Outcome of validating a level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.valid {
            return write!(f, "valid");
        }
        writeln!(f, "invalid ({} errors):", self.errors.len())?;
        for error in &self.errors {
            writeln!(f, "  - {}", error)?;
        }
        Ok(())
    }
}

/// Check a level document against the schema and `limits`.
pub fn validate(level: &Value, limits: &ValidationLimits) -> ValidationReport {
    let mut errors = Vec::new();

    let Some(root) = level.as_object() else {
        errors.push("level must be a JSON object".to_string());
        return ValidationReport::from_errors(errors);
    };

    if let Some(id) = root.get("id") {
        if !id.is_string() {
            errors.push("'id' must be a string".to_string());
        }
    }

    match root.get("terrain") {
        None => errors.push("missing required field 'terrain'".to_string()),
        Some(Value::Object(terrain)) => validate_terrain(terrain, limits, &mut errors),
        Some(_) => errors.push("'terrain' must be an object".to_string()),
    }

    match root.get("entities") {
        None => errors.push("missing required field 'entities'".to_string()),
        Some(Value::Array(entities)) => validate_entities(entities, limits, &mut errors),
        Some(_) => errors.push("'entities' must be an array".to_string()),
    }

    ValidationReport::from_errors(errors)
}

fn validate_terrain(terrain: &Map<String, Value>, limits: &ValidationLimits, errors: &mut Vec<String>) {
    if let Some(kind) = terrain.get("type") {
        match kind.as_str() {
            Some("sparse") | Some("dense") => {}
            _ => errors.push(format!(
                "terrain.type must be \"sparse\" or \"dense\", got {}",
                kind
            )),
        }
    }

    if let Some(size) = terrain.get("tileSize") {
        if !size.as_f64().map_or(false, |s| s.is_finite() && s > 0.0) {
            errors.push(format!("terrain.tileSize must be a positive number, got {}", size));
        }
    }

    if let Some(seed) = terrain.get("seed") {
        if seed.as_u64().is_none() {
            errors.push(format!("terrain.seed must be a non-negative integer, got {}", seed));
        }
    }

    if let Some(generation) = terrain.get("generation") {
        match GenerationStrategy::deserialize(generation) {
            Ok(strategy) => {
                if let Err(e) = strategy.validate() {
                    errors.push(format!("terrain.generation: {}", e));
                }
            }
            Err(e) => errors.push(format!("terrain.generation: {}", e)),
        }
    }

    let axis_limit = limits.max_axis_tiles();
    for key in ["chunkSize", "chunksWide", "chunksTall"] {
        if let Some(value) = terrain.get(key) {
            match value.as_u64() {
                Some(v) if v > axis_limit => errors.push(format!(
                    "terrain.{} value {} exceeds maxCoordinate limit of {}",
                    key, v, limits.max_coordinate
                )),
                Some(v) if v > 0 => {}
                _ => errors.push(format!("terrain.{} must be a positive integer, got {}", key, value)),
            }
        }
    }
    validate_extent(terrain, limits, errors);

    let tiles = match terrain.get("tiles") {
        None => {
            errors.push("missing required field 'terrain.tiles'".to_string());
            return;
        }
        Some(Value::Array(tiles)) => tiles,
        Some(_) => {
            errors.push("'terrain.tiles' must be an array".to_string());
            return;
        }
    };

    if tiles.len() > limits.max_tiles {
        errors.push(format!(
            "too many tiles: {} exceeds maxTiles limit of {}",
            tiles.len(),
            limits.max_tiles
        ));
    }

    let mut seen: HashMap<(u64, u64), usize> = HashMap::new();
    for (i, tile) in tiles.iter().enumerate() {
        let Some(tile) = tile.as_object() else {
            errors.push(format!("tile {}: must be an object", i));
            continue;
        };

        let x = tile_coordinate(tile, i, "gridX", "x", limits, errors);
        let y = tile_coordinate(tile, i, "gridY", "y", limits, errors);

        match tile.get("material") {
            None => errors.push(format!("tile {}: missing 'material'", i)),
            Some(Value::String(name)) => {
                if let Err(e) = name.parse::<Material>() {
                    errors.push(format!("tile {}: {}", i, e));
                }
            }
            Some(other) => errors.push(format!("tile {}: 'material' must be a string, got {}", i, other)),
        }

        if let (Some(x), Some(y)) = (x, y) {
            if let Some(first) = seen.insert((x, y), i) {
                errors.push(format!(
                    "tile {}: duplicate coordinate ({}, {}) already given by tile {}",
                    i, x, y, first
                ));
            }
        }
    }
}

/// Declared terrain size against the coordinate and area limits.
fn validate_extent(terrain: &Map<String, Value>, limits: &ValidationLimits, errors: &mut Vec<String>) {
    let dimension = |key: &str| terrain.get(key).and_then(Value::as_u64).filter(|&v| v > 0);
    let Some(chunk_size) = dimension("chunkSize") else {
        return;
    };

    let mut axes = Vec::with_capacity(2);
    for (key, axis) in [("chunksWide", "width"), ("chunksTall", "height")] {
        let Some(chunks) = dimension(key) else {
            continue;
        };
        match chunks.checked_mul(chunk_size) {
            Some(tiles) if tiles <= limits.max_axis_tiles() => axes.push(tiles),
            _ => errors.push(format!(
                "terrain {} of {} chunks x {} tiles exceeds maxCoordinate limit of {}",
                axis, chunks, chunk_size, limits.max_coordinate
            )),
        }
    }

    if let [width, height] = axes[..] {
        let area = width.saturating_mul(height);
        if area > limits.max_terrain_tiles {
            errors.push(format!(
                "terrain of {}x{} tiles exceeds maxTerrainTiles limit of {}",
                width, height, limits.max_terrain_tiles
            ));
        }
    }
}

/// Read one tile axis under either key spelling.
fn tile_coordinate(
    tile: &Map<String, Value>,
    index: usize,
    key: &str,
    short_key: &str,
    limits: &ValidationLimits,
    errors: &mut Vec<String>,
) -> Option<u64> {
    let (name, value) = match (tile.get(key), tile.get(short_key)) {
        (Some(_), Some(_)) => {
            errors.push(format!("tile {}: both '{}' and '{}' given", index, key, short_key));
            return None;
        }
        (Some(v), None) => (key, v),
        (None, Some(v)) => (short_key, v),
        (None, None) => {
            errors.push(format!("tile {}: missing coordinate '{}' (or '{}')", index, key, short_key));
            return None;
        }
    };
    match checked_coordinate(value, limits) {
        Ok(v) => Some(v),
        Err(reason) => {
            errors.push(format!("tile {}: '{}' {}", index, name, reason));
            None
        }
    }
}

fn checked_coordinate(value: &Value, limits: &ValidationLimits) -> Result<u64, String> {
    let Some(v) = value.as_u64() else {
        return Err(format!("must be a non-negative integer, got {}", value));
    };
    if v > limits.max_coordinate {
        return Err(format!(
            "value {} exceeds maxCoordinate limit of {}",
            v, limits.max_coordinate
        ));
    }
    Ok(v)
}

fn validate_entities(entities: &[Value], limits: &ValidationLimits, errors: &mut Vec<String>) {
    if entities.len() > limits.max_entities {
        errors.push(format!(
            "too many entities: {} exceeds maxEntities limit of {}",
            entities.len(),
            limits.max_entities
        ));
    }

    let mut ids: HashMap<&str, usize> = HashMap::new();
    for (i, entity) in entities.iter().enumerate() {
        let Some(entity) = entity.as_object() else {
            errors.push(format!("entity {}: must be an object", i));
            continue;
        };

        match entity.get("id") {
            None => errors.push(format!("entity {}: missing 'id'", i)),
            Some(Value::String(id)) if id.is_empty() => {
                errors.push(format!("entity {}: 'id' must not be empty", i))
            }
            Some(Value::String(id)) => {
                if let Some(first) = ids.insert(id.as_str(), i) {
                    errors.push(format!("entity {}: duplicate id '{}' already used by entity {}", i, id, first));
                }
            }
            Some(other) => errors.push(format!("entity {}: 'id' must be a string, got {}", i, other)),
        }

        match entity.get("type") {
            None => errors.push(format!("entity {}: missing 'type'", i)),
            Some(Value::String(kind)) => {
                if kind.parse::<EntityKind>().is_err() {
                    errors.push(format!(
                        "entity {}: type '{}' is not one of {}",
                        i,
                        kind,
                        EntityKind::allowed_names()
                    ));
                }
            }
            Some(other) => errors.push(format!("entity {}: 'type' must be a string, got {}", i, other)),
        }

        match entity.get("gridPosition") {
            None => errors.push(format!("entity {}: missing 'gridPosition'", i)),
            Some(Value::Object(position)) => {
                for axis in ["x", "y"] {
                    match position.get(axis) {
                        None => errors.push(format!("entity {}: gridPosition missing '{}'", i, axis)),
                        Some(value) => {
                            if let Err(reason) = checked_coordinate(value, limits) {
                                errors.push(format!("entity {}: gridPosition.{} {}", i, axis, reason));
                            }
                        }
                    }
                }
            }
            Some(other) => errors.push(format!("entity {}: 'gridPosition' must be an object, got {}", i, other)),
        }

        if let Some(properties) = entity.get("properties") {
            if !(properties.is_object() || properties.is_null()) {
                errors.push(format!("entity {}: 'properties' must be an object or null", i));
            }
        }
    }
}
