//! Полный цикл генерации мира
//!
//! Проходы выполняются строго по порядку: высоты → разметка воды → осадки →
//! температура → реки и озёра → типы местности. Результат полностью определяется
//! размерами, сидом и параметрами.

use crate::climate::{generate_altitude, generate_temperature, simulate_rain_shadow};
use crate::config::WorldGenerationParams;
use crate::error::MapError;
use crate::grid::HexGrid;
use crate::hydrology::{categorize_water, generate_rivers};
use crate::terrain::{TerrainRegistry, classify_terrain};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

/// Сгенерированная карта вместе с тем, что нужно для её воспроизведения
#[derive(Debug, Clone)]
pub struct GeneratedWorld {
    pub seed: u64,
    /// Направление ветра в градусах, выбранное для дождевой тени
    pub wind_direction: f32,
    pub grid: HexGrid,
}

/// Реестр типов местности из параметров или встроенный
pub fn terrain_registry(params: &WorldGenerationParams) -> Result<TerrainRegistry, MapError> {
    match &params.terrains {
        Some(terrains) => TerrainRegistry::new(terrains.clone()),
        None => Ok(TerrainRegistry::earthlike()),
    }
}

/// Сид из параметров; если его нет, берётся случайный и пишется в лог
#[must_use]
pub fn resolve_seed(params: &WorldGenerationParams) -> u64 {
    params.seed.unwrap_or_else(|| {
        let seed = rand::random();
        info!("Сид не задан, выбран случайный: {}", seed);
        seed
    })
}

/// Генерирует новую карту по параметрам
pub fn generate_world(
    params: &WorldGenerationParams,
    registry: &TerrainRegistry,
) -> Result<GeneratedWorld, MapError> {
    params.validate()?;
    let seed = resolve_seed(params);
    let mut grid = HexGrid::new(params.width, params.height, params.water_level);
    let wind_direction = run_passes(&mut grid, params, registry, seed)?;
    Ok(GeneratedWorld {
        seed,
        wind_direction,
        grid,
    })
}

/// Перегенерирует существующую сетку с другим сидом, сохраняя её топологию
pub fn regenerate(
    world: &mut GeneratedWorld,
    params: &WorldGenerationParams,
    registry: &TerrainRegistry,
    seed: u64,
) -> Result<(), MapError> {
    params.validate()?;
    world.grid.reset();
    world.wind_direction = run_passes(&mut world.grid, params, registry, seed)?;
    world.seed = seed;
    Ok(())
}

fn run_passes(
    grid: &mut HexGrid,
    params: &WorldGenerationParams,
    registry: &TerrainRegistry,
    seed: u64,
) -> Result<f32, MapError> {
    info!(
        "Генерация мира {}×{} (сид {}, уровень воды {})",
        grid.width, grid.height, seed, grid.water_level
    );
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    generate_altitude(grid, &params.altitude, &mut rng);
    categorize_water(grid);
    let wind_direction = simulate_rain_shadow(grid, &params.precipitation, &mut rng);
    generate_temperature(grid, &params.temperature, &mut rng);
    generate_rivers(grid, &params.rivers, &params.lakes, &mut rng);
    classify_terrain(grid, registry)?;

    info!("Мир сгенерирован");
    Ok(wind_direction)
}
