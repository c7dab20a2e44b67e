//! Seeded noise fields and the strategy chunks use to generate tiles.

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::material::MaterialModel;

/// Largest value a field may return; samples live in `[0, 1)`.
const MAX_SAMPLE: f64 = 1.0 - f64::EPSILON;

/// How a terrain gets its initial content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// Every chunk is generated from the seed at construction.
    #[default]
    Perlin,
    /// Chunks start filled with the default material and are populated
    /// explicitly (level loading, editors).
    Sparse,
}

impl GenerationMode {
    pub fn name(&self) -> &'static str {
        match self {
            GenerationMode::Perlin => "perlin",
            GenerationMode::Sparse => "sparse",
        }
    }
}

/// A deterministic, continuous scalar field over generation space.
pub trait NoiseField {
    /// Sample at `(x, y)`; always in `[0, 1)`.
    fn sample(&self, x: f64, y: f64) -> f64;
}

/// Fractal noise parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    /// Base frequency in cycles per tile.
    pub frequency: f64,
    pub octaves: usize,
    pub persistence: f64,
    pub lacunarity: f64,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            frequency: 0.06,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }
}

/// Multi-octave Perlin noise remapped to `[0, 1)`.
pub struct PerlinField {
    fbm: Fbm<Perlin>,
}

impl PerlinField {
    pub fn new(seed: u64, settings: &NoiseSettings) -> Self {
        let fbm = Fbm::<Perlin>::new(fold_seed(seed))
            .set_octaves(settings.octaves.max(1))
            .set_frequency(settings.frequency)
            .set_persistence(settings.persistence)
            .set_lacunarity(settings.lacunarity);
        Self { fbm }
    }
}

impl NoiseField for PerlinField {
    fn sample(&self, x: f64, y: f64) -> f64 {
        let raw = self.fbm.get([x, y]);
        (raw * 0.5 + 0.5).clamp(0.0, MAX_SAMPLE)
    }
}

/// A field with the same value everywhere.
#[derive(Clone, Copy, Debug)]
pub struct ConstantField(pub f64);

impl NoiseField for ConstantField {
    fn sample(&self, _x: f64, _y: f64) -> f64 {
        self.0.clamp(0.0, MAX_SAMPLE)
    }
}

/// Noise settings plus the material table they feed.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationStrategy {
    pub noise: NoiseSettings,
    pub materials: MaterialModel,
}

impl GenerationStrategy {
    pub fn validate(&self) -> Result<()> {
        self.materials.validate()
    }

    /// The single field shared by every chunk of a terrain with this seed.
    pub fn field(&self, seed: u64) -> PerlinField {
        PerlinField::new(seed, &self.noise)
    }
}

/// Perlin seeds are 32-bit; fold both halves so high seed bits still matter.
fn fold_seed(seed: u64) -> u32 {
    (seed ^ (seed >> 32)) as u32
}
