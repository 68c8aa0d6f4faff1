//! Вода на карте: океан, пресная вода, реки и озёра

use crate::config::{LakeSettings, RiverSettings};
use crate::grid::HexGrid;
use crate::hex::{dot, normalize};
use crate::terrain::{FRESH_WATER, OCEAN};
use rand::Rng;
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info, warn};

/// Размечает воду: всё, что связано с краем карты через тайлы не выше уровня воды,
/// становится океаном, остальные низины становятся пресной водой.
pub fn categorize_water(grid: &mut HexGrid) {
    let water_level = grid.water_level;
    let is_low = |grid: &HexGrid, i: usize| grid.tile(i).altitude() <= water_level;

    let mut visited = vec![false; grid.len()];
    let mut queue: VecDeque<usize> = grid
        .border_tiles()
        .iter()
        .copied()
        .filter(|&i| is_low(grid, i))
        .collect();

    let mut ocean = 0;
    while let Some(i) = queue.pop_front() {
        if visited[i] {
            continue;
        }
        visited[i] = true;
        grid.tile_mut(i).set_terrain(Some(OCEAN.to_string()));
        ocean += 1;
        for &n in grid.neighbors(i) {
            if !visited[n] && is_low(grid, n) {
                queue.push_back(n);
            }
        }
    }

    let mut fresh = 0;
    for i in 0..grid.len() {
        if !visited[i] && is_low(grid, i) {
            grid.tile_mut(i).set_terrain(Some(FRESH_WATER.to_string()));
            fresh += 1;
        }
    }

    info!("Океан: {} тайлов, пресная вода: {} тайлов", ocean, fresh);
}

/// Расстояние в шагах от каждого тайла до ближайшего океана; `None`, если океана нет
#[must_use]
pub fn ocean_distances(grid: &HexGrid) -> Vec<Option<u32>> {
    let mut distances = vec![None; grid.len()];
    let mut queue = VecDeque::new();
    for (i, tile) in grid.tiles().iter().enumerate() {
        if tile.is_ocean() {
            distances[i] = Some(0);
            queue.push_back(i);
        }
    }

    while let Some(i) = queue.pop_front() {
        let next = distances[i].map_or(0, |d| d + 1);
        for &n in grid.neighbors(i) {
            if distances[n].is_none() {
                distances[n] = Some(next);
                queue.push_back(n);
            }
        }
    }

    if !grid.is_empty() && distances.iter().all(Option::is_none) {
        warn!("На карте нет океана, расстояние до океана не определено");
    }
    distances
}

/// Чем закончилось русло
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiverEnd {
    /// Впадает в океан или пресную воду
    Water(usize),
    /// Сливается с другой рекой
    Confluence(usize),
    /// Дальше некуда течь
    DeadEnd,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiverTrace {
    pub tiles: Vec<usize>,
    pub end: RiverEnd,
}

/// Ведёт русло от истока вниз по склону.
///
/// Ближайшая вода или другая река в радиусе `bias_range` становится целью,
/// и соседи в её направлении кажутся ниже. Русло не касается само себя.
pub fn trace_river<R: Rng>(
    grid: &HexGrid,
    source: usize,
    settings: &RiverSettings,
    rng: &mut R,
) -> RiverTrace {
    let mut tiles = vec![source];
    let mut in_river = HashSet::from([source]);
    let mut bias: Option<usize> = None;

    loop {
        let current = tiles[tiles.len() - 1];
        if bias.is_none() {
            bias = nearest_drain(grid, current, settings.bias_range, &in_river);
        }

        let neighbors = grid.neighbors(current);
        if let Some(&water) = neighbors.iter().find(|&&n| grid.tile(n).is_water()) {
            return RiverTrace {
                tiles,
                end: RiverEnd::Water(water),
            };
        }
        if let Some(&river) = neighbors
            .iter()
            .find(|&&n| grid.tile(n).has_river() && !in_river.contains(&n))
        {
            return RiverTrace {
                tiles,
                end: RiverEnd::Confluence(river),
            };
        }

        let here = grid.tile(current).coordinates().to_vec3();
        let to_bias = bias.map(|b| {
            let there = grid.tile(b).coordinates().to_vec3();
            normalize([there[0] - here[0], there[1] - here[1], there[2] - here[2]])
        });

        let mut lowest = grid.tile(current).altitude();
        let mut next = None;
        for &n in neighbors {
            if in_river.contains(&n) {
                continue;
            }
            let touches_river = grid
                .neighbors(n)
                .iter()
                .any(|&nn| nn != current && in_river.contains(&nn));
            if touches_river {
                continue;
            }

            let alignment = to_bias.map_or(0.0, |target| {
                let there = grid.tile(n).coordinates().to_vec3();
                let step = normalize([there[0] - here[0], there[1] - here[1], there[2] - here[2]]);
                ((dot(step, target) + 1.0) * 0.5).clamp(0.0, 1.0)
            });
            let effective = grid.tile(n).altitude() - alignment * settings.bias_strength
                + rng.gen_range(-settings.jitter..=settings.jitter);
            if effective < lowest {
                lowest = effective;
                next = Some(n);
            }
        }

        match next {
            Some(n) => {
                tiles.push(n);
                in_river.insert(n);
            }
            None => {
                return RiverTrace {
                    tiles,
                    end: RiverEnd::DeadEnd,
                };
            }
        }
    }
}

fn nearest_drain(
    grid: &HexGrid,
    from: usize,
    range: u32,
    in_river: &HashSet<usize>,
) -> Option<usize> {
    grid.tiles_in_range(from, range)
        .into_iter()
        .filter(|i| !in_river.contains(i))
        .filter(|&i| {
            let tile = grid.tile(i);
            tile.has_river() || tile.is_water()
        })
        .min_by_key(|&i| grid.distance(from, i))
}

/// Закрепляет русло на карте, если оно не короче `min_length`.
///
/// Короткое русло отбрасывается, и флаг реки на его тайлах снимается.
pub fn commit_river(grid: &mut HexGrid, tiles: &[usize], min_length: usize) -> bool {
    let accepted = tiles.len() >= min_length;
    for &i in tiles {
        grid.tile_mut(i).set_has_river(accepted);
    }
    accepted
}

/// Выращивает озеро у хвоста реки. Возвращает тайлы озера (пусто, если не вышло).
///
/// Тайлы озера получают тип воды, теряют флаг реки и опускаются ниже уровня воды.
pub fn build_lake<R: Rng>(
    grid: &mut HexGrid,
    river: &[usize],
    settings: &LakeSettings,
    rng: &mut R,
) -> Vec<usize> {
    if river.len() < 3 {
        debug!("Русло из {} тайлов слишком короткое для озера", river.len());
        return Vec::new();
    }

    let tail_len = ((river.len() as f32 * settings.tail_fraction).round() as usize).clamp(1, river.len());
    let seed = river[river.len() - tail_len..]
        .iter()
        .flat_map(|&i| grid.neighbors(i).iter().copied())
        .filter(|n| !river.contains(n))
        .filter(|&n| grid.tile(n).altitude() < 1.0)
        .min_by(|&a, &b| grid.tile(a).altitude().total_cmp(&grid.tile(b).altitude()));
    let Some(seed) = seed else {
        debug!("Нет подходящего тайла для озера");
        return Vec::new();
    };

    let mut lake = vec![seed];
    let mut in_lake = HashSet::from([seed]);
    let mut absorbed = None;

    while rng.gen_range(0.0..1.0_f32) <= 1.0 - (lake.len() - 1) as f32 * settings.stop_increment {
        let frontier = lake_frontier(grid, &lake, &in_lake);
        if let Some(water) = adjacent_water(grid, &frontier) {
            absorbed = Some(water);
            break;
        }

        let score = |n: usize| {
            let adjacent = grid
                .neighbors(n)
                .iter()
                .filter(|nn| in_lake.contains(nn))
                .count();
            grid.tile(n).altitude() - settings.roundness_bias * (adjacent as f32 - 1.0)
        };
        let Some(next) = frontier
            .into_iter()
            .min_by(|&a, &b| score(a).total_cmp(&score(b)))
        else {
            break;
        };
        lake.push(next);
        in_lake.insert(next);
    }

    // Рост мог остановиться рядом с водой: такое озеро всё равно сливается с ней
    let absorbed = absorbed.or_else(|| adjacent_water(grid, &lake_frontier(grid, &lake, &in_lake)));
    let mut terrain = FRESH_WATER;
    if let Some(water) = absorbed {
        if grid.tile(water).is_ocean() {
            terrain = OCEAN;
        }
        lake.push(water);
    }

    let altitudes = grid.snapshot(|t| t.altitude());
    let (low, high) = settings.depth_factor;
    for &i in &lake {
        let neighbors = grid.neighbors(i);
        let mean = (altitudes[i] + neighbors.iter().map(|&n| altitudes[n]).sum::<f32>())
            / (neighbors.len() + 1) as f32;
        let floor = grid.water_level * rng.gen_range(low..=high);

        let tile = grid.tile_mut(i);
        tile.set_terrain(Some(terrain.to_string()));
        tile.set_has_river(false);
        tile.set_altitude(mean.min(floor));
    }

    debug!("Озеро из {} тайлов ({})", lake.len(), terrain);
    lake
}

fn lake_frontier(grid: &HexGrid, lake: &[usize], in_lake: &HashSet<usize>) -> Vec<usize> {
    let mut frontier: Vec<usize> = lake
        .iter()
        .flat_map(|&i| grid.neighbors(i).iter().copied())
        .filter(|n| !in_lake.contains(n))
        .collect();
    frontier.sort_unstable();
    frontier.dedup();
    frontier
}

/// Водный тайл на границе озера; океан важнее пресной воды
fn adjacent_water(grid: &HexGrid, frontier: &[usize]) -> Option<usize> {
    frontier
        .iter()
        .copied()
        .find(|&n| grid.tile(n).is_ocean())
        .or_else(|| frontier.iter().copied().find(|&n| grid.tile(n).is_fresh_water()))
}

/// Разрезает русло по тайлам озера. Участки короче `min_length` перестают быть реками
fn split_at_lake(
    grid: &mut HexGrid,
    river: &[usize],
    lake: &HashSet<usize>,
    min_length: usize,
) -> Vec<Vec<usize>> {
    let mut kept = Vec::new();
    for part in river.split(|t| lake.contains(t)).filter(|part| !part.is_empty()) {
        if part.len() >= min_length {
            kept.push(part.to_vec());
        } else {
            for &i in part {
                grid.tile_mut(i).set_has_river(false);
            }
        }
    }
    kept
}

/// Пресная вода на краю карты или рядом с океаном сама становится океаном.
///
/// Возвращает число перекрашенных тайлов.
fn spread_ocean(grid: &mut HexGrid) -> usize {
    let on_border: Vec<usize> = grid
        .border_tiles()
        .iter()
        .copied()
        .filter(|&i| joins_ocean(grid, i))
        .collect();
    let mut converted = on_border.len();
    for &i in &on_border {
        grid.tile_mut(i).set_terrain(Some(OCEAN.to_string()));
    }

    let mut queue: VecDeque<usize> = (0..grid.len()).filter(|&i| grid.tile(i).is_ocean()).collect();

    while let Some(i) = queue.pop_front() {
        let joined: Vec<usize> = grid
            .neighbors(i)
            .iter()
            .copied()
            .filter(|&n| joins_ocean(grid, n))
            .collect();
        for n in joined {
            grid.tile_mut(n).set_terrain(Some(OCEAN.to_string()));
            converted += 1;
            queue.push_back(n);
        }
    }
    converted
}

fn joins_ocean(grid: &HexGrid, index: usize) -> bool {
    let tile = grid.tile(index);
    tile.is_fresh_water() && tile.altitude() <= grid.water_level
}

/// Прокладывает реки от высоких влажных тайлов и строит озёра на тупиковых концах
pub fn generate_rivers<R: Rng>(
    grid: &mut HexGrid,
    rivers: &RiverSettings,
    lakes: &LakeSettings,
    rng: &mut R,
) {
    if !rivers.enabled {
        return;
    }

    let mut candidates: Vec<usize> = grid
        .tiles()
        .iter()
        .enumerate()
        .filter(|(_, t)| {
            !t.is_water()
                && t.altitude() >= rivers.min_altitude
                && t.temperature() >= rivers.min_temperature
                && t.precipitation() >= rivers.min_precipitation
        })
        .map(|(i, _)| i)
        .collect();
    candidates.sort_by(|&a, &b| grid.tile(b).altitude().total_cmp(&grid.tile(a).altitude()));
    debug!("Кандидатов в истоки: {}", candidates.len());

    let mut discarded = 0;
    for source in candidates {
        let tile = grid.tile(source);
        if tile.has_river() || tile.is_water() {
            continue;
        }
        let weight = f64::from(tile.precipitation() * tile.altitude()).clamp(0.0, 1.0);
        if !rng.gen_bool(weight) {
            continue;
        }

        let mut trace = trace_river(grid, source, rivers, rng);
        if trace.end == RiverEnd::DeadEnd && rng.gen_bool(rivers.lake_chance.clamp(0.0, 1.0)) {
            let lake = build_lake(grid, &trace.tiles, lakes, rng);
            if !lake.is_empty() {
                let in_lake: HashSet<usize> = lake.iter().copied().collect();
                if let Some(cut) = trace.tiles.iter().position(|t| in_lake.contains(t)) {
                    trace.end = RiverEnd::Water(trace.tiles[cut]);
                    trace.tiles.truncate(cut);
                }
                for river in std::mem::take(&mut grid.rivers) {
                    let parts = split_at_lake(grid, &river, &in_lake, rivers.min_length);
                    grid.rivers.extend(parts);
                }
                grid.lakes.push(lake);
            }
        }

        if !trace.tiles.is_empty() && commit_river(grid, &trace.tiles, rivers.min_length) {
            debug!(
                "Река из {} тайлов, исток {}, конец {:?}",
                trace.tiles.len(),
                grid.tile(source).coordinates(),
                trace.end
            );
            grid.rivers.push(trace.tiles);
        } else {
            discarded += 1;
        }
    }

    let joined = spread_ocean(grid);
    if joined > 0 {
        debug!("Озёра соединили с океаном {} тайлов пресной воды", joined);
    }

    if grid.rivers.is_empty() {
        warn!("Ни одной реки не сгенерировано");
    }
    info!(
        "Рек: {}, озёр: {}, отброшено коротких русел: {}",
        grid.rivers.len(),
        grid.lakes.len(),
        discarded
    );
}
