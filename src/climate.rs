//! Высоты, осадки и температура
//!
//! Каждый проход записывает результат прямо в тайлы сетки.

use crate::automata::cellular_automata_pass;
use crate::config::{
    AltitudeSettings, CellularAutomataSettings, ElevationFeatureSettings, NoiseSettings,
    PrecipitationSettings, TemperatureSettings,
};
use crate::grid::HexGrid;
use crate::hex::{direction_from_degrees, dot};
use crate::hydrology::ocean_distances;
use crate::noise::{ScalarField, generate_noise_map, inverse_lerp, lerp};
use rand::Rng;
use std::f32::consts::PI;
use tracing::{debug, info, warn};

/// Генерирует карту высот.
///
/// Базовый и «верхний» шумы смешиваются третьим шумом, сверху накладываются
/// горные хребты, края карты уводятся под воду, после чего автомат сглаживает
/// береговую линию и границу гор.
pub fn generate_altitude<R: Rng>(grid: &mut HexGrid, settings: &AltitudeSettings, rng: &mut R) {
    let water_level = grid.water_level;

    let base = generate_noise_map(
        grid,
        &NoiseSettings {
            exponent: settings.noise.exponent / 1.5,
            ..settings.noise.clone()
        },
        rng,
    );
    let upper = generate_noise_map(
        grid,
        &NoiseSettings {
            scale: settings.noise.scale * 3.0,
            exponent: settings.noise.exponent * 1.5,
            ..settings.noise.clone()
        },
        rng,
    );
    let blend = generate_noise_map(grid, &NoiseSettings::new(2.0, 1.0, 1), rng);

    let mut altitude = ScalarField::from_vec(
        (0..grid.len())
            .map(|i| lerp(base.get(i), upper.get(i), blend.get(i)))
            .collect(),
    );

    if settings.elevation_features.enabled {
        let mask = mountain_mask(grid, &settings.elevation_features, rng);
        for (alt, m) in altitude.data.iter_mut().zip(&mask.data) {
            let strength = inverse_lerp(water_level, 2.0 * water_level, *alt)
                * (1.0 - alt.powi(8))
                * m;
            *alt = lerp(*alt, *alt + m, strength).clamp(0.0, 1.0);
        }
    }

    shape_water_boundary(grid, &mut altitude, &settings.water_boundary_noise, rng);

    let coast = CellularAutomataSettings {
        boundary: water_level,
        neighbors_for_transition: settings.neighbors_for_transition,
        passes: 1,
    };
    let mountains = CellularAutomataSettings {
        boundary: settings.mountain_level,
        neighbors_for_transition: settings.neighbors_for_transition,
        passes: settings.mountain_passes,
    };
    let altitude = cellular_automata_pass(grid, &altitude, &coast);
    let altitude = cellular_automata_pass(grid, &altitude, &mountains);

    for (i, &value) in altitude.data.iter().enumerate() {
        grid.tile_mut(i).set_altitude(value);
    }

    let above_water = altitude.data.iter().filter(|&&a| a > water_level).count();
    info!(
        "Высоты построены: средняя {:.3}, выше уровня воды {} из {}",
        altitude.mean(),
        above_water,
        grid.len()
    );
}

/// Маска горных хребтов: шум, сложенный в гребни `1 - |2x - 1|`,
/// несколько слоёв смешиваются отдельным шумом
fn mountain_mask<R: Rng>(
    grid: &HexGrid,
    settings: &ElevationFeatureSettings,
    rng: &mut R,
) -> ScalarField {
    let ridge = |v: f32| 1.0 - (v * 2.0 - 1.0).abs();

    let mut mask = generate_noise_map(grid, &settings.mountain_noise, rng);
    mask.data.iter_mut().for_each(|v| *v = ridge(*v));

    let mix = generate_noise_map(grid, &settings.mix_noise, rng);
    for _ in 1..settings.range_count {
        let layer = generate_noise_map(grid, &settings.mountain_noise, rng);
        for (i, m) in mask.data.iter_mut().enumerate() {
            *m = lerp(*m, ridge(layer.get(i)), mix.get(i)).clamp(0.0, 1.0);
        }
    }

    mask.data.iter_mut().for_each(|v| *v = v.powf(1.5));
    mask
}

fn shape_water_boundary<R: Rng>(
    grid: &HexGrid,
    altitude: &mut ScalarField,
    noise: &NoiseSettings,
    rng: &mut R,
) {
    let competing = generate_noise_map(grid, noise, rng);
    let width = grid.width as f32;
    let height = grid.height as f32;

    for (i, tile) in grid.tiles().iter().enumerate() {
        let c = tile.coordinates();
        let x = 2.0 * ((c.q() - (c.r() + c.s())).abs() as f32 / 2.0) / width;
        let y = 2.0 * ((c.r() - c.s()).abs() as f32 / 2.0) / height;

        let shaping = ((x * PI / 2.0).cos() * (y * PI / 2.0).cos()).powi(4);
        let alt = altitude.get(i);
        let mix = x.max(y).powf(1.75)
            * (1.0 - alt.powi(8))
            * lerp(0.75, 1.25, competing.get(i));
        altitude.set(i, lerp(alt, shaping, mix).clamp(0.0, 1.0));
    }
}

/// Модель дождевой тени. Возвращает направление ветра в градусах.
///
/// Тайлы обходятся по ветру. Каждый тайл теряет влагу пропорционально высоте
/// и передаёт остаток облаков соседу с подветренной стороны. В конце осадки
/// усредняются с соседями.
pub fn simulate_rain_shadow<R: Rng>(
    grid: &mut HexGrid,
    settings: &PrecipitationSettings,
    rng: &mut R,
) -> f32 {
    let degrees = settings
        .wind_direction
        .unwrap_or_else(|| rng.gen_range(0.0..360.0));
    let wind = direction_from_degrees(degrees);

    let mut order: Vec<usize> = (0..grid.len()).collect();
    order.sort_by(|&a, &b| {
        let da = dot(grid.tile(a).coordinates().to_vec3(), wind);
        let db = dot(grid.tile(b).coordinates().to_vec3(), wind);
        da.total_cmp(&db)
    });

    let mut cloud: Vec<f32> = grid
        .tiles()
        .iter()
        .map(|t| {
            if t.is_ocean() {
                settings.ocean_cloud_cover
            } else if t.is_fresh_water() {
                settings.fresh_water_cloud_cover
            } else {
                settings.land_cloud_cover
            }
        })
        .collect();

    let mut shadow = vec![0.0_f32; grid.len()];
    for &i in &order {
        let tile = grid.tile(i);
        let altitude = tile.altitude();
        let rain = cloud[i].min(1.0 - altitude);
        shadow[i] = rain.clamp(0.0, 1.0);

        let downwind = tile.coordinates().in_direction(wind);
        if let Some(next) = grid.index_of(downwind) {
            if !grid.tile(next).is_ocean() {
                cloud[next] += rain * (1.0 - altitude.powf(1.5));
            }
        }
    }

    for i in 0..grid.len() {
        let neighbors = grid.neighbors(i);
        let sum = shadow[i] + neighbors.iter().map(|&n| shadow[n]).sum::<f32>();
        let value = sum / (neighbors.len() + 1) as f32;
        grid.tile_mut(i).set_precipitation(value);
    }

    let mean = grid.tiles().iter().map(|t| t.precipitation()).sum::<f32>() / grid.len() as f32;
    info!("Осадки: ветер {:.0}°, средние осадки {:.3}", degrees, mean);
    degrees
}

/// Генерирует температуру: шум, уточнённый широтой, близостью океана и высотой
pub fn generate_temperature<R: Rng>(
    grid: &mut HexGrid,
    settings: &TemperatureSettings,
    rng: &mut R,
) {
    let noise = generate_noise_map(grid, &settings.noise, rng);
    if !settings.refine {
        for (i, &value) in noise.data.iter().enumerate() {
            grid.tile_mut(i).set_temperature(value);
        }
        info!("Температура без уточнения: средняя {:.3}", noise.mean());
        return;
    }

    let (pole, equator) = if settings.warm_poles {
        (settings.equator_multiplier, settings.pole_multiplier)
    } else {
        (settings.pole_multiplier, settings.equator_multiplier)
    };
    let height = grid.height as f32;

    let latitude: Vec<f32> = grid
        .tiles()
        .iter()
        .enumerate()
        .map(|(i, tile)| {
            let c = tile.coordinates();
            let d = (c.r() - c.s()).abs() as f32 / 2.0;
            let m = 1.0 - (PI * d / height).sin();
            (noise.get(i) * lerp(pole, equator, m)).clamp(0.0, 1.0)
        })
        .collect();
    let average = latitude.iter().sum::<f32>() / latitude.len() as f32;
    debug!("Средняя температура после широтной поправки: {:.3}", average);

    let distances = ocean_distances(grid);
    let max_radius = (grid.height + grid.width) as f32 / 2.0 * settings.ocean_influence_ratio;
    let mut unreachable = 0;

    for (i, &base) in latitude.iter().enumerate() {
        let tile = grid.tile(i);
        let value = if tile.is_ocean() {
            base
        } else {
            let proximity = match distances[i] {
                Some(d) if max_radius > 0.0 => (d as f32 / max_radius).min(1.0),
                Some(_) => 1.0,
                None => {
                    unreachable += 1;
                    1.0
                }
            };
            let blended = lerp(base, average, (1.0 - proximity).powi(2)).clamp(0.0, 1.0);
            let low = (1.0 - tile.altitude()).powi(2);
            lerp(blended / 1.5, blended * 1.5, low).clamp(0.0, 1.0)
        };
        grid.tile_mut(i).set_temperature(value);
    }

    if unreachable > 0 {
        warn!(
            "На карте нет океана, близость океана не учтена для {} тайлов",
            unreachable
        );
    }
    let mean = grid.tiles().iter().map(|t| t.temperature()).sum::<f32>() / grid.len() as f32;
    info!("Температура построена: средняя {:.3}", mean);
}
