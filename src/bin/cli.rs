use clap::Parser;
use hexgen::{
    HexCoordinates, Path, Pathfinder, WorldGenerationParams, generate_world, terrain_cost,
    terrain_registry,
};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Генератор гексагональных карт
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Путь к конфигурационному файлу в формате TOML (без него берутся параметры по умолчанию)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Путь для сохранения JSON-сводки (по умолчанию: ./world.json)
    #[arg(short, long, default_value = "world.json")]
    output: PathBuf,

    /// Сид, заменяющий сид из конфигурации
    #[arg(short, long)]
    seed: Option<u64>,

    /// Найти путь между двумя тайлами: `--path 0,-2 0,2` (осевые координаты q,r)
    #[arg(long, num_args = 2, value_parser = parse_axial)]
    path: Option<Vec<HexCoordinates>>,
}

fn parse_axial(value: &str) -> Result<HexCoordinates, String> {
    let (q, r) = value
        .split_once(',')
        .ok_or_else(|| format!("ожидается `q,r`, получено `{value}`"))?;
    let q = q.trim().parse::<i32>().map_err(|e| e.to_string())?;
    let r = r.trim().parse::<i32>().map_err(|e| e.to_string())?;
    Ok(HexCoordinates::axial(q, r))
}

#[derive(Serialize)]
struct WorldSummary<'a> {
    seed: u64,
    width: u32,
    height: u32,
    water_level: f32,
    wind_direction: f32,
    tiles: &'a [hexgen::HexTile],
    rivers: Vec<Vec<HexCoordinates>>,
    lakes: Vec<Vec<HexCoordinates>>,
    path: Option<Path>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hexgen=info")))
        .init();

    let cli = Cli::parse();

    println!("🔍 Загрузка конфигурации...");
    let mut params = match &cli.config {
        Some(path) => WorldGenerationParams::from_toml_file(path)?,
        None => WorldGenerationParams::default(),
    };
    if cli.seed.is_some() {
        params.seed = cli.seed;
    }
    let registry = terrain_registry(&params)?;

    println!(
        "Генерация мира (размер: {}×{})...",
        params.width, params.height
    );
    let world = generate_world(&params, &registry)?;
    let grid = &world.grid;

    let path = match cli.path.as_deref() {
        Some([start, goal]) => {
            println!("Поиск пути {start} → {goal}...");
            let mut pathfinder = Pathfinder::new(grid, terrain_cost(&registry));
            Some(pathfinder.find_path(*start, *goal)?)
        }
        _ => None,
    };

    let to_coordinates = |groups: &[Vec<usize>]| -> Vec<Vec<HexCoordinates>> {
        groups
            .iter()
            .map(|g| g.iter().map(|&i| grid.tile(i).coordinates()).collect())
            .collect()
    };
    let summary = WorldSummary {
        seed: world.seed,
        width: grid.width,
        height: grid.height,
        water_level: grid.water_level,
        wind_direction: world.wind_direction,
        tiles: grid.tiles(),
        rivers: to_coordinates(&grid.rivers),
        lakes: to_coordinates(&grid.lakes),
        path,
    };

    println!("Сохранение в {:?}", cli.output);
    let writer = BufWriter::new(File::create(&cli.output)?);
    serde_json::to_writer_pretty(writer, &summary)?;

    println!(
        "\nГотово! Сид {}, рек: {}, озёр: {}.",
        world.seed,
        grid.rivers.len(),
        grid.lakes.len()
    );
    Ok(())
}
