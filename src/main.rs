use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::error;

use chunk_terrain::ascii::{render_legend, render_terrain};
use chunk_terrain::level::{self, TerrainKind};
use chunk_terrain::pathfinding::{find_walkable_path, path_steps, Connectivity, PathOptions};
use chunk_terrain::storage::ChunkStorage;
use chunk_terrain::{AppConfig, GenerationMode, GridTerrain};

#[derive(Parser, Debug)]
#[command(name = "chunk_terrain")]
#[command(about = "Generate, edit and navigate chunked tile terrain")]
struct Cli {
    /// TOML config file (terrain shape, generation, validation limits)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a terrain and print it
    Generate {
        #[command(flatten)]
        terrain: TerrainArgs,

        /// Write the terrain as a level file
        #[arg(long)]
        export: Option<PathBuf>,

        /// Level layout used by --export
        #[arg(long, value_enum, default_value = "sparse")]
        kind: KindArg,

        /// Save every chunk under this directory
        #[arg(long)]
        save_chunks: Option<PathBuf>,
    },
    /// Generate a terrain and find a path between two tiles
    Path {
        #[command(flatten)]
        terrain: TerrainArgs,

        /// Start tile as "x,y"
        #[arg(long, value_parser = parse_tile)]
        from: (usize, usize),

        /// Goal tile as "x,y"
        #[arg(long, value_parser = parse_tile)]
        to: (usize, usize),

        /// Allow diagonal steps
        #[arg(long)]
        diagonal: bool,

        /// Give up after this many node expansions
        #[arg(long)]
        max_expansions: Option<usize>,
    },
    /// Validate a level file and print the report
    Validate {
        file: PathBuf,
    },
    /// Load a level file into a terrain and print it
    Import {
        file: PathBuf,

        /// Restore saved chunks from this directory after loading
        #[arg(long)]
        restore_chunks: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct TerrainArgs {
    /// Random seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Chunks across
    #[arg(short = 'W', long)]
    chunks_wide: Option<usize>,

    /// Chunks down
    #[arg(short = 'H', long)]
    chunks_tall: Option<usize>,

    /// Chunk side length in tiles
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Tile edge in world units
    #[arg(long)]
    tile_size: Option<f32>,

    #[arg(long, value_enum, default_value = "perlin")]
    mode: ModeArg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Perlin,
    Sparse,
}

impl From<ModeArg> for GenerationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Perlin => GenerationMode::Perlin,
            ModeArg::Sparse => GenerationMode::Sparse,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    Sparse,
    Dense,
}

impl From<KindArg> for TerrainKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Sparse => TerrainKind::Sparse,
            KindArg::Dense => TerrainKind::Dense,
        }
    }
}

fn parse_tile(s: &str) -> Result<(usize, usize), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"x,y\", got \"{}\"", s))?;
    let x = x.trim().parse().map_err(|e| format!("bad x in \"{}\": {}", s, e))?;
    let y = y.trim().parse().map_err(|e| format!("bad y in \"{}\": {}", s, e))?;
    Ok((x, y))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    match cli.command {
        Command::Generate {
            terrain,
            export,
            kind,
            save_chunks,
        } => generate(&config, &terrain, export, kind.into(), save_chunks),
        Command::Path {
            terrain,
            from,
            to,
            diagonal,
            max_expansions,
        } => path(&config, &terrain, from, to, diagonal, max_expansions),
        Command::Validate { file } => validate(&config, file),
        Command::Import {
            file,
            restore_chunks,
        } => import(&config, file, restore_chunks),
    }
}

/// Build a terrain from config, with CLI flags taking precedence.
fn build_terrain(config: &AppConfig, args: &TerrainArgs) -> Result<GridTerrain, Box<dyn Error>> {
    let mut shape = config.terrain;
    if let Some(w) = args.chunks_wide {
        shape.chunks_wide = w;
    }
    if let Some(h) = args.chunks_tall {
        shape.chunks_tall = h;
    }
    if let Some(size) = args.chunk_size {
        shape.chunk_size = size;
    }
    if let Some(size) = args.tile_size {
        shape.tile_size = size;
    }

    let seed = args.seed.unwrap_or_else(rand::random);
    println!("Generating terrain with seed: {}", seed);
    let terrain = GridTerrain::with_strategy(&shape, seed, args.mode.into(), config.generation.clone())?;
    let (w, h) = terrain.total_size();
    println!(
        "Terrain size: {}x{} tiles ({}x{} chunks of {})",
        w,
        h,
        terrain.chunks_wide(),
        terrain.chunks_tall(),
        terrain.chunk_size()
    );
    Ok(terrain)
}

fn print_terrain(terrain: &GridTerrain, path: Option<&[(usize, usize)]>) {
    println!();
    print!("{}", render_terrain(terrain, path));
    println!();
    print!("{}", render_legend(&terrain.count_materials()));
}

fn generate(
    config: &AppConfig,
    args: &TerrainArgs,
    export: Option<PathBuf>,
    kind: TerrainKind,
    save_chunks: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let terrain = build_terrain(config, args)?;
    print_terrain(&terrain, None);

    if let Some(path) = export {
        let data = level::export_level(&terrain, &format!("seed_{}", terrain.seed()), &[], kind)?;
        level::save_level(&data, &path)?;
        println!("Level written to {}", path.display());
    }

    if let Some(dir) = save_chunks {
        let storage = ChunkStorage::for_terrain(&dir, &terrain);
        let saved = storage.save_terrain(&terrain)?;
        println!("Saved {} chunks under {}", saved, dir.display());
    }
    Ok(())
}

fn path(
    config: &AppConfig,
    args: &TerrainArgs,
    from: (usize, usize),
    to: (usize, usize),
    diagonal: bool,
    max_expansions: Option<usize>,
) -> Result<(), Box<dyn Error>> {
    let terrain = build_terrain(config, args)?;
    let map = terrain.pathfinding_map();

    let connectivity = if diagonal {
        Connectivity::Eight
    } else {
        Connectivity::Four
    };
    let options = PathOptions {
        max_expansions,
        ..PathOptions::with_connectivity(connectivity)
    };

    match find_walkable_path(&map, from, to, &options)? {
        Some(found) => {
            print_terrain(&terrain, Some(&found));
            println!(
                "Path from {:?} to {:?}: {} steps (straight-line minimum {})",
                from,
                to,
                path_steps(&found),
                connectivity.distance(from, to)
            );
        }
        None => {
            print_terrain(&terrain, None);
            println!("No path from {:?} to {:?}", from, to);
        }
    }
    Ok(())
}

fn validate(config: &AppConfig, file: PathBuf) -> Result<(), Box<dyn Error>> {
    let value = level::read_level_value(&file)?;
    let report = level::validate(&value, &config.validation);
    println!("{}: {}", file.display(), report);
    if report.valid {
        Ok(())
    } else {
        Err(format!("{} is not a valid level", file.display()).into())
    }
}

fn import(config: &AppConfig, file: PathBuf, restore_chunks: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    let mut loaded = level::load_level(&file, config)?;

    if let Some(dir) = restore_chunks {
        let storage = ChunkStorage::for_terrain(&dir, &loaded.terrain);
        let restored = storage.restore_terrain(&mut loaded.terrain)?;
        println!("Restored {} chunks from {}", restored, dir.display());
    }

    let (w, h) = loaded.terrain.total_size();
    println!(
        "Level '{}': {}x{} tiles, {} entities",
        loaded.id,
        w,
        h,
        loaded.entities.len()
    );
    print_terrain(&loaded.terrain, None);
    for entity in &loaded.entities {
        println!(
            "  {} {} at ({}, {})",
            entity.kind, entity.id, entity.grid_position.x, entity.grid_position.y
        );
    }
    Ok(())
}
