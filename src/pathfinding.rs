//! Поиск пути A* по сетке
//!
//! Стоимость входа в тайл задаёт функция стоимости (обычно по типу местности).
//! Эвристика (гексагональное расстояние) допустима, пока все стоимости не меньше 1.

use crate::error::MapError;
use crate::grid::{HexGrid, HexTile};
use crate::heap::IndexedHeap;
use crate::hex::HexCoordinates;
use crate::terrain::TerrainRegistry;
use serde::Serialize;
use std::cmp::Ordering;
use tracing::{debug, warn};

/// Состояние вершины во время одного запроса
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathNode {
    pub tile: usize,
    pub g: f32,
    pub h: f32,
    pub came_from: Option<usize>,
}

impl PathNode {
    fn new(tile: usize) -> Self {
        Self {
            tile,
            g: f32::INFINITY,
            h: 0.0,
            came_from: None,
        }
    }

    #[must_use]
    pub fn f(&self) -> f32 {
        self.g + self.h
    }
}

/// Найденный путь. Пустой, если цель недостижима
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Path {
    pub tiles: Vec<HexCoordinates>,
    pub cost: f32,
}

impl Path {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            tiles: Vec::new(),
            cost: 0.0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }
}

type Priority = (f32, f32);

fn by_f_then_h(a: &Priority, b: &Priority) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1))
}

/// Стоимость входа в тайл по его типу местности
pub fn terrain_cost(
    registry: &TerrainRegistry,
) -> impl Fn(&HexTile) -> Result<f32, MapError> + '_ {
    move |tile: &HexTile| {
        let id = tile
            .terrain()
            .ok_or(MapError::UnclassifiedTile(tile.coordinates()))?;
        registry
            .get(id)
            .map(|t| t.movement_cost)
            .ok_or_else(|| MapError::UnknownTerrain(id.to_string()))
    }
}

/// A* по одной сетке. Бесконечная стоимость делает тайл непроходимым
pub struct Pathfinder<'a, F> {
    grid: &'a HexGrid,
    cost: F,
    nodes: Vec<PathNode>,
    closed: Vec<bool>,
    touched: Vec<usize>,
    open: IndexedHeap<Priority, fn(&Priority, &Priority) -> Ordering>,
    warned_inadmissible: bool,
}

impl<'a, F> Pathfinder<'a, F>
where
    F: Fn(&HexTile) -> Result<f32, MapError>,
{
    #[must_use]
    pub fn new(grid: &'a HexGrid, cost: F) -> Self {
        Self {
            grid,
            cost,
            nodes: (0..grid.len()).map(PathNode::new).collect(),
            closed: vec![false; grid.len()],
            touched: Vec::new(),
            open: IndexedHeap::new(grid.len(), by_f_then_h as fn(&Priority, &Priority) -> Ordering),
            warned_inadmissible: false,
        }
    }

    /// Кратчайший путь от `start` до `goal` включительно
    pub fn find_path(&mut self, start: HexCoordinates, goal: HexCoordinates) -> Result<Path, MapError> {
        let start_index = self.grid.fetch(start)?;
        let goal_index = self.grid.fetch(goal)?;

        if start_index == goal_index {
            return Ok(Path {
                tiles: vec![start],
                cost: 0.0,
            });
        }

        let result = self.search(start_index, goal_index);
        self.reset();
        let path = result?;

        if path.is_empty() {
            warn!("Путь из {} в {} не найден", start, goal);
        } else {
            debug!(
                "Путь из {} в {}: {} тайлов, стоимость {:.2}",
                start,
                goal,
                path.len(),
                path.cost
            );
        }
        Ok(path)
    }

    fn search(&mut self, start: usize, goal: usize) -> Result<Path, MapError> {
        let grid = self.grid;

        let h = grid.distance(start, goal) as f32;
        self.touch(start);
        self.nodes[start].g = 0.0;
        self.nodes[start].h = h;
        self.open.insert(start, (h, h));

        while let Some((current, _)) = self.open.pop() {
            if current == goal {
                return Ok(self.reconstruct(goal));
            }
            self.closed[current] = true;

            for &neighbor in grid.neighbors(current) {
                if self.closed[neighbor] {
                    continue;
                }
                let step = self.entry_cost(neighbor)?;
                let tentative = self.nodes[current].g + step;
                if tentative < self.nodes[neighbor].g {
                    self.touch(neighbor);
                    let node = &mut self.nodes[neighbor];
                    node.g = tentative;
                    node.h = grid.distance(neighbor, goal) as f32;
                    node.came_from = Some(current);
                    let priority = (node.f(), node.h);
                    if !self.open.update(neighbor, priority) {
                        self.open.insert(neighbor, priority);
                    }
                }
            }
        }

        Ok(Path::empty())
    }

    fn entry_cost(&mut self, index: usize) -> Result<f32, MapError> {
        let cost = (self.cost)(self.grid.tile(index))?;
        if cost < 1.0 && !self.warned_inadmissible {
            warn!(
                "Стоимость {:.2} меньше 1: эвристика перестаёт быть допустимой, путь может быть не кратчайшим",
                cost
            );
            self.warned_inadmissible = true;
        }
        Ok(cost)
    }

    fn reconstruct(&self, goal: usize) -> Path {
        let mut tiles = vec![self.grid.tile(goal).coordinates()];
        let mut current = goal;
        while let Some(previous) = self.nodes[current].came_from {
            tiles.push(self.grid.tile(previous).coordinates());
            current = previous;
        }
        tiles.reverse();
        Path {
            tiles,
            cost: self.nodes[goal].g,
        }
    }

    fn touch(&mut self, index: usize) {
        if self.nodes[index].g.is_infinite() && !self.closed[index] {
            self.touched.push(index);
        }
    }

    fn reset(&mut self) {
        for index in self.touched.drain(..) {
            self.nodes[index] = PathNode::new(index);
            self.closed[index] = false;
        }
        self.open.clear();
    }
}
