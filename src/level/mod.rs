//! Level files: the JSON document format, its validator, and import/export
//! against a [`GridTerrain`](crate::terrain::GridTerrain).
//!
//! Import always validates the raw document first and reports every problem
//! at once. A level that fails validation never touches a terrain.

mod format;
mod io;
mod validate;

pub use format::{
    EntityData, EntityKind, GridPosition, LevelData, TerrainData, TerrainKind, TileData, UnknownEntityKind,
};
pub use io::{
    build_terrain, export_level, import_level, load_level, parse_level, read_level_value, save_level, Level,
};
pub use validate::{validate, ValidationLimits, ValidationReport};
