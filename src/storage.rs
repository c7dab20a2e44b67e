//! Chunk persistence.
//!
//! Saves chunks (edits included) so a terrain can be restored without
//! re-importing a level.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::chunk::Chunk;
use crate::coords::ChunkCoord;
use crate::error::StorageError;
use crate::terrain::GridTerrain;

/// Storage manager for persisting chunks to disk.
///
/// Chunks are stored in a directory structure organized by world seed:
/// `{base_dir}/world_{seed}/chunk_{x}_{y}.bin`
pub struct ChunkStorage {
    base_dir: PathBuf,
    world_seed: u64,
}

impl ChunkStorage {
    pub fn new<P: AsRef<Path>>(base_dir: P, world_seed: u64) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            world_seed,
        }
    }

    /// Storage for a terrain's own seed.
    pub fn for_terrain<P: AsRef<Path>>(base_dir: P, terrain: &GridTerrain) -> Self {
        Self::new(base_dir, terrain.seed())
    }

    fn world_dir(&self) -> PathBuf {
        self.base_dir.join(format!("world_{}", self.world_seed))
    }

    fn chunk_path(&self, position: ChunkCoord) -> PathBuf {
        self.world_dir()
            .join(format!("chunk_{}_{}.bin", position.x, position.y))
    }

    pub fn chunk_exists(&self, position: ChunkCoord) -> bool {
        self.chunk_path(position).exists()
    }

    pub fn save_chunk(&self, chunk: &Chunk) -> Result<(), StorageError> {
        fs::create_dir_all(self.world_dir())?;

        let file = File::create(self.chunk_path(chunk.position()))?;
        bincode::serialize_into(BufWriter::new(file), chunk)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(())
    }

    /// Load a chunk from disk. Returns None if it was never saved.
    pub fn load_chunk(&self, position: ChunkCoord) -> Result<Option<Chunk>, StorageError> {
        let path = self.chunk_path(position);
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(&path)?;
        let chunk: Chunk = bincode::deserialize_from(BufReader::new(file))
            .map_err(|e| StorageError::Deserialization(format!("{}: {}", path.display(), e)))?;

        if chunk.position() != position {
            return Err(StorageError::Deserialization(format!(
                "{} holds {}, expected {}",
                path.display(),
                chunk.position(),
                position
            )));
        }
        Ok(Some(chunk))
    }

    /// Saved chunk positions, sorted row-major.
    pub fn list_chunks(&self) -> Result<Vec<ChunkCoord>, StorageError> {
        let dir = self.world_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut chunks = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            // "chunk_X_Y"
            if let Some(rest) = stem.strip_prefix("chunk_") {
                if let Some((x, y)) = rest.split_once('_') {
                    if let (Ok(x), Ok(y)) = (x.parse(), y.parse()) {
                        chunks.push(ChunkCoord::new(x, y));
                    }
                }
            }
        }
        chunks.sort_by_key(|c| (c.y, c.x));
        Ok(chunks)
    }

    /// Remove every stored chunk for this world.
    pub fn clear(&self) -> Result<(), StorageError> {
        let dir = self.world_dir();
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        Ok(())
    }

    /// Save every chunk of a terrain. Returns the number written.
    pub fn save_terrain(&self, terrain: &GridTerrain) -> Result<usize, StorageError> {
        for chunk in terrain.chunks() {
            self.save_chunk(chunk)?;
        }
        info!(
            "Saved {} chunks to {}",
            terrain.chunks().len(),
            self.world_dir().display()
        );
        Ok(terrain.chunks().len())
    }

    /// Replace a terrain's chunks with stored ones where they exist.
    ///
    /// Chunks outside the terrain or with a different chunk size are skipped
    /// with a warning. Returns the number restored.
    pub fn restore_terrain(&self, terrain: &mut GridTerrain) -> Result<usize, StorageError> {
        let mut restored = 0;
        for position in self.list_chunks()? {
            let Some(chunk) = self.load_chunk(position)? else {
                continue;
            };
            match terrain.replace_chunk(chunk) {
                Ok(()) => restored += 1,
                Err(e) => warn!("Skipping stored {}: {}", position, e),
            }
        }
        info!("Restored {} chunks from {}", restored, self.world_dir().display());
        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TerrainConfig;
    use crate::coords::WorldPos;
    use crate::generation::GenerationMode;
    use crate::tile::{Material, Tile};
    use serde::Serialize;
    use tempfile::tempdir;

    fn terrain(chunk_size: usize) -> GridTerrain {
        GridTerrain::new(&TerrainConfig::new(2, 2, chunk_size, 16.0), 12345, GenerationMode::Perlin).unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let storage = ChunkStorage::new(dir.path(), 12345);
        let t = terrain(8);

        let chunk = t.chunk(1, 0).unwrap();
        storage.save_chunk(chunk).unwrap();

        assert!(storage.chunk_exists(ChunkCoord::new(1, 0)));
        assert!(!storage.chunk_exists(ChunkCoord::new(0, 1)));
        assert!(dir.path().join("world_12345").join("chunk_1_0.bin").exists());

        let loaded = storage.load_chunk(ChunkCoord::new(1, 0)).unwrap().unwrap();
        assert_eq!(&loaded, chunk);
    }

    #[test]
    fn test_load_nonexistent() {
        let dir = tempdir().unwrap();
        let storage = ChunkStorage::new(dir.path(), 12345);
        assert!(storage.load_chunk(ChunkCoord::new(9, 9)).unwrap().is_none());
        assert!(storage.list_chunks().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_chunk_is_reported() {
        let dir = tempdir().unwrap();
        let storage = ChunkStorage::new(dir.path(), 1);
        fs::create_dir_all(dir.path().join("world_1")).unwrap();
        fs::write(dir.path().join("world_1").join("chunk_0_0.bin"), b"junk").unwrap();

        assert!(matches!(
            storage.load_chunk(ChunkCoord::new(0, 0)),
            Err(StorageError::Deserialization(_))
        ));
    }

    #[derive(Serialize)]
    struct ForgedGrid {
        width: usize,
        height: usize,
        data: Vec<Tile>,
        span_top_left: WorldPos,
        origin_index: ChunkCoord,
        tile_size: f32,
    }

    /// Same layout as a stored `Chunk`, without its checks.
    #[derive(Serialize)]
    struct ForgedChunk {
        position: ChunkCoord,
        grid: ForgedGrid,
        generated: bool,
        generated_from: Option<u64>,
    }

    fn write_forged(dir: &Path, width: usize, height: usize, cells: usize) {
        let source = terrain(8);
        let chunk = source.chunk(0, 0).unwrap();
        let forged = ForgedChunk {
            position: chunk.position(),
            grid: ForgedGrid {
                width,
                height,
                data: chunk.tiles()[..cells].to_vec(),
                span_top_left: chunk.span_top_left(),
                origin_index: chunk.position(),
                tile_size: 16.0,
            },
            generated: true,
            generated_from: Some(12345),
        };
        let world = dir.join("world_12345");
        fs::create_dir_all(&world).unwrap();
        let file = File::create(world.join("chunk_0_0.bin")).unwrap();
        bincode::serialize_into(BufWriter::new(file), &forged).unwrap();
    }

    #[test]
    fn test_truncated_grid_is_rejected() {
        let dir = tempdir().unwrap();
        let storage = ChunkStorage::new(dir.path(), 12345);
        write_forged(dir.path(), 8, 8, 3);

        match storage.load_chunk(ChunkCoord::new(0, 0)) {
            Err(StorageError::Deserialization(message)) => assert!(message.contains("3 cells")),
            other => panic!("expected a deserialization error, got {:?}", other),
        }

        let mut target = terrain(8);
        let before = target.chunk(0, 0).unwrap().clone();
        assert!(matches!(
            storage.restore_terrain(&mut target),
            Err(StorageError::Deserialization(_))
        ));
        assert_eq!(target.chunk(0, 0).unwrap(), &before);
        assert!(target.tile_at(7, 7).is_ok());
    }

    #[test]
    fn test_non_square_grid_is_rejected() {
        let dir = tempdir().unwrap();
        let storage = ChunkStorage::new(dir.path(), 12345);
        write_forged(dir.path(), 8, 4, 32);

        match storage.load_chunk(ChunkCoord::new(0, 0)) {
            Err(StorageError::Deserialization(message)) => assert!(message.contains("8x4")),
            other => panic!("expected a deserialization error, got {:?}", other),
        }
    }

    #[test]
    fn test_terrain_round_trip_keeps_edits() {
        let dir = tempdir().unwrap();
        let mut edited = terrain(8);
        edited.set_material_at(3, 12, Material::Water).unwrap();
        edited.set_material_at(15, 0, Material::Moss).unwrap();

        let storage = ChunkStorage::for_terrain(dir.path(), &edited);
        assert_eq!(storage.save_terrain(&edited).unwrap(), 4);
        assert_eq!(
            storage.list_chunks().unwrap(),
            vec![
                ChunkCoord::new(0, 0),
                ChunkCoord::new(1, 0),
                ChunkCoord::new(0, 1),
                ChunkCoord::new(1, 1)
            ]
        );

        let mut fresh = terrain(8);
        assert_eq!(storage.restore_terrain(&mut fresh).unwrap(), 4);
        assert_eq!(fresh.tile_at(3, 12).unwrap().material, Material::Water);
        assert_eq!(fresh.tile_at(15, 0).unwrap().material, Material::Moss);

        storage.clear().unwrap();
        assert!(storage.list_chunks().unwrap().is_empty());
    }

    #[test]
    fn test_restore_skips_mismatched_chunks() {
        let dir = tempdir().unwrap();
        let storage = ChunkStorage::new(dir.path(), 12345);
        storage.save_terrain(&terrain(4)).unwrap();

        let mut target = terrain(8);
        let before = target.chunk(0, 0).unwrap().clone();
        assert_eq!(storage.restore_terrain(&mut target).unwrap(), 0);
        assert_eq!(target.chunk(0, 0).unwrap(), &before);
    }
}
