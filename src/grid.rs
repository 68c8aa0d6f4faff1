//! Гексагональная сетка: тайлы, соседство, граница карты
//!
//! Тайлы хранятся в плоском векторе. Индекс тайла назначается один раз при
//! построении сетки, все поля (высота, осадки, температура) адресуются этим индексом.

use crate::error::MapError;
use crate::hex::HexCoordinates;
use crate::terrain::{FRESH_WATER, OCEAN};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

/// Один гекс карты
#[derive(Debug, Clone, Serialize)]
pub struct HexTile {
    coordinates: HexCoordinates,
    altitude: f32,
    precipitation: f32,
    temperature: f32,
    terrain: Option<String>,
    has_river: bool,
}

impl HexTile {
    fn new(coordinates: HexCoordinates) -> Self {
        Self {
            coordinates,
            altitude: 0.0,
            precipitation: 0.0,
            temperature: 0.0,
            terrain: None,
            has_river: false,
        }
    }

    #[must_use]
    pub fn coordinates(&self) -> HexCoordinates {
        self.coordinates
    }

    #[must_use]
    pub fn altitude(&self) -> f32 {
        self.altitude
    }

    #[must_use]
    pub fn precipitation(&self) -> f32 {
        self.precipitation
    }

    #[must_use]
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn set_altitude(&mut self, value: f32) {
        self.altitude = checked_attribute("altitude", value);
    }

    pub fn set_precipitation(&mut self, value: f32) {
        self.precipitation = checked_attribute("precipitation", value);
    }

    pub fn set_temperature(&mut self, value: f32) {
        self.temperature = checked_attribute("temperature", value);
    }

    #[must_use]
    pub fn terrain(&self) -> Option<&str> {
        self.terrain.as_deref()
    }

    pub fn set_terrain(&mut self, terrain: Option<String>) {
        self.terrain = terrain;
    }

    #[must_use]
    pub fn is_ocean(&self) -> bool {
        self.terrain() == Some(OCEAN)
    }

    #[must_use]
    pub fn is_fresh_water(&self) -> bool {
        self.terrain() == Some(FRESH_WATER)
    }

    #[must_use]
    pub fn is_water(&self) -> bool {
        self.is_ocean() || self.is_fresh_water()
    }

    #[must_use]
    pub fn has_river(&self) -> bool {
        self.has_river
    }

    pub fn set_has_river(&mut self, has_river: bool) {
        self.has_river = has_river;
    }

    fn reset(&mut self) {
        self.altitude = 0.0;
        self.precipitation = 0.0;
        self.temperature = 0.0;
        self.terrain = None;
        self.has_river = false;
    }
}

/// NaN считается дефектом вызывающего кода, значения вне [0, 1] обрезаются
fn checked_attribute(name: &str, value: f32) -> f32 {
    assert!(!value.is_nan(), "попытка записать NaN в атрибут {name}");
    value.clamp(0.0, 1.0)
}

/// Границы прямоугольника карты в осевых координатах
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridBounds {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

#[derive(Debug, Clone)]
pub struct HexGrid {
    pub width: u32,
    pub height: u32,
    pub water_level: f32,
    /// Реки: последовательности индексов тайлов от истока к устью
    pub rivers: Vec<Vec<usize>>,
    /// Озёра: группы индексов тайлов
    pub lakes: Vec<Vec<usize>>,
    bounds: GridBounds,
    tiles: Vec<HexTile>,
    index: HashMap<HexCoordinates, usize>,
    neighbors: Vec<Vec<usize>>,
    border: Vec<usize>,
}

impl HexGrid {
    /// Строит прямоугольную карту `width × height` в смещённой раскладке.
    ///
    /// Для каждого столбца q строки r сдвигаются на `q >> 1`, поэтому карта
    /// выглядит прямоугольной, а каждая ячейка удовлетворяет q + r + s = 0.
    #[must_use]
    pub fn new(width: u32, height: u32, water_level: f32) -> Self {
        assert!(width > 0 && height > 0, "размеры сетки должны быть положительными");

        let right = (width / 2) as i32;
        let left = -(width as i32 - 1 - right);
        let bottom = (height / 2) as i32;
        let top = -(height as i32 - 1 - bottom);
        debug!(left, right, top, bottom, "Границы сетки");

        let mut tiles = Vec::with_capacity((width * height) as usize);
        let mut index = HashMap::with_capacity((width * height) as usize);

        for q in left..=right {
            let q_offset = q >> 1;
            for r in (top - q_offset)..=(bottom - q_offset) {
                let coordinates = HexCoordinates::new(q, r, -q - r);
                index.insert(coordinates, tiles.len());
                tiles.push(HexTile::new(coordinates));
            }
        }

        let neighbors: Vec<Vec<usize>> = tiles
            .iter()
            .map(|tile| {
                tile.coordinates
                    .neighbors()
                    .filter_map(|c| index.get(&c).copied())
                    .collect()
            })
            .collect();

        let border = neighbors
            .iter()
            .enumerate()
            .filter(|(_, n)| n.len() < 6)
            .map(|(i, _)| i)
            .collect::<Vec<_>>();

        info!(
            "Сетка {}×{}: {} тайлов, {} на границе",
            width,
            height,
            tiles.len(),
            border.len()
        );

        Self {
            width,
            height,
            water_level,
            rivers: Vec::new(),
            lakes: Vec::new(),
            bounds: GridBounds {
                left,
                right,
                top,
                bottom,
            },
            tiles,
            index,
            neighbors,
            border,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    #[must_use]
    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    #[must_use]
    pub fn tiles(&self) -> &[HexTile] {
        &self.tiles
    }

    #[must_use]
    pub fn tile(&self, index: usize) -> &HexTile {
        &self.tiles[index]
    }

    pub fn tile_mut(&mut self, index: usize) -> &mut HexTile {
        &mut self.tiles[index]
    }

    /// Индекс тайла по координатам; `None` для координат за краем карты
    #[must_use]
    pub fn index_of(&self, coordinates: HexCoordinates) -> Option<usize> {
        self.index.get(&coordinates).copied()
    }

    /// Как [`HexGrid::index_of`], но отсутствие тайла считается ошибкой
    pub fn fetch(&self, coordinates: HexCoordinates) -> Result<usize, MapError> {
        self.index_of(coordinates)
            .ok_or(MapError::TileNotFound(coordinates))
    }

    #[must_use]
    pub fn neighbors(&self, index: usize) -> &[usize] {
        &self.neighbors[index]
    }

    /// Тайлы, у которых меньше шести соседей
    #[must_use]
    pub fn border_tiles(&self) -> &[usize] {
        &self.border
    }

    /// Тайлы на расстоянии не больше `range` от заданного (включая его самого)
    #[must_use]
    pub fn tiles_in_range(&self, index: usize, range: u32) -> Vec<usize> {
        self.tiles[index]
            .coordinates
            .within(range)
            .into_iter()
            .filter_map(|c| self.index_of(c))
            .collect()
    }

    #[must_use]
    pub fn distance(&self, a: usize, b: usize) -> u32 {
        self.tiles[a].coordinates.distance(self.tiles[b].coordinates)
    }

    /// Сбрасывает результаты предыдущей генерации, сохраняя топологию
    pub fn reset(&mut self) {
        for tile in &mut self.tiles {
            tile.reset();
        }
        self.rivers.clear();
        self.lakes.clear();
    }

    /// Снимок атрибута всех тайлов в порядке индексов
    pub fn snapshot<F>(&self, attribute: F) -> Vec<f32>
    where
        F: Fn(&HexTile) -> f32,
    {
        self.tiles.iter().map(attribute).collect()
    }
}
