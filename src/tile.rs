//! Materials and the tiles that carry them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coords::WorldPos;

/// Terrain materials. Closed set; unknown names are rejected at the level
/// boundary and never reach the core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Material {
    Grass,
    #[default]
    Dirt,
    Moss,
    Sand,
    Stone,
    Water,
}

impl Material {
    pub const ALL: [Material; 6] = [
        Material::Grass,
        Material::Dirt,
        Material::Moss,
        Material::Sand,
        Material::Stone,
        Material::Water,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Material::Grass => "grass",
            Material::Dirt => "dirt",
            Material::Moss => "moss",
            Material::Sand => "sand",
            Material::Stone => "stone",
            Material::Water => "water",
        }
    }

    /// Default traversability used by pathfinding.
    pub fn is_traversable(&self) -> bool {
        !matches!(self, Material::Stone | Material::Water)
    }

    /// Get ASCII character for terminal display
    pub fn ascii_char(&self) -> char {
        match self {
            Material::Grass => '.',
            Material::Dirt => ',',
            Material::Moss => '"',
            Material::Sand => ':',
            Material::Stone => '#',
            Material::Water => '~',
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a material name is not one of [`Material::ALL`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown material '{0}'")]
pub struct UnknownMaterial(pub String);

impl FromStr for Material {
    type Err = UnknownMaterial;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Material::ALL
            .iter()
            .copied()
            .find(|m| m.name() == s)
            .ok_or_else(|| UnknownMaterial(s.to_string()))
    }
}

/// A single terrain tile.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Tile {
    pub material: Material,
    /// World position of the tile's top-left corner, cached at generation.
    pub render_offset: Option<WorldPos>,
}

impl Tile {
    pub fn new(material: Material) -> Self {
        Self {
            material,
            render_offset: None,
        }
    }

    pub fn with_offset(material: Material, offset: WorldPos) -> Self {
        Self {
            material,
            render_offset: Some(offset),
        }
    }

    pub fn is_traversable(&self) -> bool {
        self.material.is_traversable()
    }
}
