//! Level document types (JSON).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::DEFAULT_TILE_SIZE;
use crate::generation::GenerationStrategy;
use crate::tile::Material;

/// Whether a level lists every tile or only the ones that differ from the
/// terrain's baseline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerrainKind {
    #[default]
    Sparse,
    Dense,
}

impl TerrainKind {
    pub fn name(&self) -> &'static str {
        match self {
            TerrainKind::Sparse => "sparse",
            TerrainKind::Dense => "dense",
        }
    }
}

/// Entity types a level may place. Behaviour lives elsewhere; the core only
/// checks membership and position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Ant,
    Queen,
    Colony,
    Food,
    Obstacle,
    Spawner,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Ant,
        EntityKind::Queen,
        EntityKind::Colony,
        EntityKind::Food,
        EntityKind::Obstacle,
        EntityKind::Spawner,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Ant => "ant",
            EntityKind::Queen => "queen",
            EntityKind::Colony => "colony",
            EntityKind::Food => "food",
            EntityKind::Obstacle => "obstacle",
            EntityKind::Spawner => "spawner",
        }
    }

    /// Comma-separated list of allowed names, for error messages.
    pub fn allowed_names() -> String {
        EntityKind::ALL
            .iter()
            .map(|k| k.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when an entity type is not one of [`EntityKind::ALL`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown entity type '{0}'")]
pub struct UnknownEntityKind(pub String);

impl FromStr for EntityKind {
    type Err = UnknownEntityKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .iter()
            .copied()
            .find(|k| k.name() == s)
            .ok_or_else(|| UnknownEntityKind(s.to_string()))
    }
}

/// A top-level level document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelData {
    #[serde(default)]
    pub id: String,
    pub terrain: TerrainData,
    #[serde(default)]
    pub entities: Vec<EntityData>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerrainData {
    #[serde(rename = "type", default)]
    pub kind: TerrainKind,
    #[serde(default = "default_tile_size")]
    pub tile_size: f32,
    /// When present the terrain is generated from this seed before the
    /// listed tiles are applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Noise and material table the terrain was generated with. Levels
    /// without one use the importer's configured strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks_wide: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks_tall: Option<usize>,
    #[serde(default)]
    pub tiles: Vec<TileData>,
}

fn default_tile_size() -> f32 {
    DEFAULT_TILE_SIZE
}

/// One tile entry. Accepts `gridX`/`gridY` or `x`/`y`; always writes the
/// `grid` form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileData {
    #[serde(rename = "gridX", alias = "x")]
    pub grid_x: usize,
    #[serde(rename = "gridY", alias = "y")]
    pub grid_y: usize,
    pub material: Material,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: usize,
    pub y: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityData {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub grid_position: GridPosition,
    #[serde(default)]
    pub properties: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_both_coordinate_spellings() {
        let level: LevelData = serde_json::from_str(
            r#"{
                "id": "l1",
                "terrain": {
                    "type": "dense",
                    "tileSize": 8,
                    "tiles": [
                        {"gridX": 1, "gridY": 2, "material": "stone"},
                        {"x": 3, "y": 4, "material": "moss"}
                    ]
                },
                "entities": []
            }"#,
        )
        .unwrap();

        assert_eq!(level.terrain.kind, TerrainKind::Dense);
        assert_eq!(level.terrain.tile_size, 8.0);
        assert_eq!(
            level.terrain.tiles,
            vec![
                TileData { grid_x: 1, grid_y: 2, material: Material::Stone },
                TileData { grid_x: 3, grid_y: 4, material: Material::Moss },
            ]
        );
    }

    #[test]
    fn test_entity_fields() {
        let entity: EntityData = serde_json::from_str(
            r#"{"id": "q", "type": "queen", "gridPosition": {"x": 5, "y": 6}, "properties": {"hp": 3}}"#,
        )
        .unwrap();
        assert_eq!(entity.kind, EntityKind::Queen);
        assert_eq!(entity.grid_position, GridPosition { x: 5, y: 6 });
        assert!(entity.properties.unwrap().is_object());

        let bare: EntityData =
            serde_json::from_str(r#"{"id": "f", "type": "food", "gridPosition": {"x": 0, "y": 0}, "properties": null}"#)
                .unwrap();
        assert_eq!(bare.properties, None);
    }

    #[test]
    fn test_serializes_grid_names() {
        let json = serde_json::to_value(TileData { grid_x: 1, grid_y: 2, material: Material::Sand }).unwrap();
        assert_eq!(json["gridX"], 1);
        assert_eq!(json["gridY"], 2);
        assert_eq!(json["material"], "sand");
    }

    #[test]
    fn test_entity_kind_names() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.name().parse::<EntityKind>(), Ok(kind));
        }
        assert_eq!("dragon".parse::<EntityKind>(), Err(UnknownEntityKind("dragon".to_string())));
        assert!(EntityKind::allowed_names().starts_with("ant, queen"));
    }
}
