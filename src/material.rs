//! Noise-to-material mapping.
//!
//! A [`MaterialModel`] is an ordered table of half-open noise bands. A noise
//! sample picks the first band that contains it; anything left over falls
//! back to the default material, so generation can never fail to resolve.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::coords::position_seed;
use crate::error::{Result, TerrainError};
use crate::tile::Material;

/// Position-dependent shaping of a band.
///
/// The weight evaluates to a factor in `[0, 1]` which shrinks the band to
/// `[min, min + (max - min) * factor)`.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RangeWeight {
    #[default]
    Uniform,
    /// Keep the band at roughly `density` of positions, chosen per tile.
    Scatter { density: f64 },
    /// Full band at `center`, fading out linearly to nothing at `radius`.
    Radial { center: (f64, f64), radius: f64 },
}

impl RangeWeight {
    fn factor(&self, position: (f64, f64), seed: u64, band: usize) -> f64 {
        match *self {
            RangeWeight::Uniform => 1.0,
            RangeWeight::Scatter { density } => {
                let salt = seed.wrapping_add((band as u64).wrapping_mul(0x9E3779B97F4A7C15));
                let tile_seed = position_seed(salt, position.0.floor() as i64, position.1.floor() as i64);
                let mut rng = ChaCha8Rng::seed_from_u64(tile_seed);
                if rng.gen::<f64>() < density {
                    1.0
                } else {
                    0.0
                }
            }
            RangeWeight::Radial { center, radius } => {
                if radius <= 0.0 {
                    return 0.0;
                }
                let dx = position.0 - center.0;
                let dy = position.1 - center.1;
                (1.0 - (dx * dx + dy * dy).sqrt() / radius).clamp(0.0, 1.0)
            }
        }
    }
}

/// One band of the material table.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialRange {
    pub material: Material,
    /// Inclusive lower bound.
    pub min: f64,
    /// Exclusive upper bound.
    pub max: f64,
    #[serde(default)]
    pub weight: RangeWeight,
}

impl MaterialRange {
    pub fn new(material: Material, min: f64, max: f64) -> Self {
        Self {
            material,
            min,
            max,
            weight: RangeWeight::Uniform,
        }
    }

    pub fn weighted(material: Material, min: f64, max: f64, weight: RangeWeight) -> Self {
        Self {
            material,
            min,
            max,
            weight,
        }
    }

    fn contains(&self, noise: f64, factor: f64) -> bool {
        let upper = self.min + (self.max - self.min) * factor;
        noise >= self.min && noise < upper
    }
}

/// Ordered material table with a fallback.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialModel {
    pub ranges: Vec<MaterialRange>,
    pub default_material: Material,
    /// Salt for position-dependent weights; set from the terrain seed.
    /// Unseeded models salt with zero.
    #[serde(skip)]
    seed: Option<u64>,
}

impl Default for MaterialModel {
    fn default() -> Self {
        Self {
            ranges: vec![
                MaterialRange::new(Material::Water, 0.0, 0.30),
                MaterialRange::new(Material::Sand, 0.30, 0.36),
                MaterialRange::new(Material::Grass, 0.36, 0.52),
                MaterialRange::weighted(
                    Material::Moss,
                    0.52,
                    0.58,
                    RangeWeight::Scatter { density: 0.6 },
                ),
                MaterialRange::new(Material::Grass, 0.52, 0.58),
                MaterialRange::new(Material::Dirt, 0.58, 0.66),
                MaterialRange::new(Material::Moss, 0.66, 0.69),
                MaterialRange::new(Material::Stone, 0.69, 1.0),
            ],
            default_material: Material::Dirt,
            seed: None,
        }
    }
}

impl MaterialModel {
    pub fn new(ranges: Vec<MaterialRange>, default_material: Material) -> Result<Self> {
        let model = Self {
            ranges,
            default_material,
            seed: None,
        };
        model.validate()?;
        Ok(model)
    }

    /// A model that always yields `material`.
    pub fn uniform(material: Material) -> Self {
        Self {
            ranges: Vec::new(),
            default_material: material,
            seed: None,
        }
    }

    /// Check every band is a well-formed sub-interval of `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        for (i, range) in self.ranges.iter().enumerate() {
            let well_formed = range.min.is_finite()
                && range.max.is_finite()
                && range.min >= 0.0
                && range.max <= 1.0
                && range.min < range.max;
            if !well_formed {
                return Err(TerrainError::Configuration(format!(
                    "material range {} ({}) has invalid bounds [{}, {})",
                    i, range.material, range.min, range.max
                )));
            }
            if let RangeWeight::Scatter { density } = range.weight {
                if !(0.0..=1.0).contains(&density) {
                    return Err(TerrainError::Configuration(format!(
                        "material range {} ({}) has scatter density {} outside [0, 1]",
                        i, range.material, density
                    )));
                }
            }
        }
        Ok(())
    }

    /// Copy of this model salted for a particular terrain seed.
    pub fn seeded(&self, seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..self.clone()
        }
    }

    /// The terrain seed this model was salted with, if any.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Resolve a noise sample at a generation-space position.
    pub fn material_for(&self, noise: f64, position: (f64, f64)) -> Material {
        self.ranges
            .iter()
            .enumerate()
            .find(|(band, range)| {
                // Cheap interval test first; weights may hash.
                noise >= range.min
                    && noise < range.max
                    && range.contains(noise, range.weight.factor(position, self.seed.unwrap_or(0), *band))
            })
            .map(|(_, range)| range.material)
            .unwrap_or(self.default_material)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_wins() {
        let model = MaterialModel::new(
            vec![
                MaterialRange::new(Material::Grass, 0.0, 0.6),
                MaterialRange::new(Material::Stone, 0.4, 1.0),
            ],
            Material::Dirt,
        )
        .unwrap();

        assert_eq!(model.material_for(0.5, (0.0, 0.0)), Material::Grass);
        assert_eq!(model.material_for(0.6, (0.0, 0.0)), Material::Stone);
    }

    #[test]
    fn test_unmatched_falls_back_to_default() {
        let model = MaterialModel::new(
            vec![MaterialRange::new(Material::Grass, 0.2, 0.4)],
            Material::Sand,
        )
        .unwrap();

        assert_eq!(model.material_for(0.1, (0.0, 0.0)), Material::Sand);
        assert_eq!(model.material_for(0.4, (0.0, 0.0)), Material::Sand);
        assert_eq!(model.material_for(0.99, (3.5, 7.5)), Material::Sand);
    }

    #[test]
    fn test_split_bands_resolve_to_same_material() {
        let model = MaterialModel::new(
            vec![
                MaterialRange::new(Material::Moss, 0.1, 0.2),
                MaterialRange::new(Material::Dirt, 0.2, 0.8),
                MaterialRange::new(Material::Moss, 0.8, 0.9),
            ],
            Material::Grass,
        )
        .unwrap();

        assert_eq!(model.material_for(0.15, (0.0, 0.0)), Material::Moss);
        assert_eq!(model.material_for(0.85, (0.0, 0.0)), Material::Moss);
    }

    #[test]
    fn test_radial_weight_shrinks_band_with_distance() {
        let model = MaterialModel::new(
            vec![MaterialRange::weighted(
                Material::Water,
                0.0,
                1.0,
                RangeWeight::Radial {
                    center: (0.0, 0.0),
                    radius: 10.0,
                },
            )],
            Material::Grass,
        )
        .unwrap();

        // At distance 5 the band covers [0, 0.5).
        assert_eq!(model.material_for(0.4, (5.0, 0.0)), Material::Water);
        assert_eq!(model.material_for(0.6, (5.0, 0.0)), Material::Grass);
        assert_eq!(model.material_for(0.0, (20.0, 0.0)), Material::Grass);
    }

    #[test]
    fn test_scatter_is_deterministic_per_position() {
        let model = MaterialModel::new(
            vec![MaterialRange::weighted(
                Material::Moss,
                0.0,
                1.0,
                RangeWeight::Scatter { density: 0.5 },
            )],
            Material::Dirt,
        )
        .unwrap()
        .seeded(42);

        let mut moss = 0;
        for y in 0..32 {
            for x in 0..32 {
                let pos = (x as f64 + 0.5, y as f64 + 0.5);
                let first = model.material_for(0.5, pos);
                assert_eq!(first, model.material_for(0.5, pos));
                if first == Material::Moss {
                    moss += 1;
                }
            }
        }
        // Roughly half of 1024 positions.
        assert!(moss > 350 && moss < 674, "moss count {}", moss);
    }

    #[test]
    fn test_rejects_malformed_ranges() {
        assert!(MaterialModel::new(vec![MaterialRange::new(Material::Grass, 0.5, 0.5)], Material::Dirt).is_err());
        assert!(MaterialModel::new(vec![MaterialRange::new(Material::Grass, -0.1, 0.5)], Material::Dirt).is_err());
        assert!(MaterialModel::new(
            vec![MaterialRange::weighted(
                Material::Grass,
                0.0,
                0.5,
                RangeWeight::Scatter { density: 1.5 }
            )],
            Material::Dirt
        )
        .is_err());
    }

    #[test]
    fn test_default_table_is_valid() {
        assert!(MaterialModel::default().validate().is_ok());
    }
}
