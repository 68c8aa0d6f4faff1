//! Типы местности и их назначение тайлам
//!
//! Тип местности описывается набором правил. Тайл получает первый (по возрастанию
//! приоритета) тип, все правила которого выполняются. При равных приоритетах
//! побеждает тип, зарегистрированный раньше.

use crate::error::MapError;
use crate::grid::HexGrid;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{info, warn};

/// Океан: назначается при разметке воды, до классификации
pub const OCEAN: &str = "ocean";
/// Пресная вода: замкнутые низины и озёра
pub const FRESH_WATER: &str = "fresh_water";

/// Правило, проверяющее один тайл
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TerrainRule {
    AltitudeRange {
        min: f32,
        max: f32,
    },
    PrecipitationRange {
        min: f32,
        max: f32,
    },
    TemperatureRange {
        min: f32,
        max: f32,
    },
    /// Текущий тип тайла входит в список (или не входит, если `invert`)
    TerrainMembership {
        terrains: Vec<String>,
        #[serde(default)]
        invert: bool,
    },
    /// В радиусе `range`, считая сам тайл, не меньше `required` тайлов из списка
    /// (или меньше, если `invert`)
    TerrainCountInRange {
        terrains: Vec<String>,
        range: u32,
        required: usize,
        #[serde(default)]
        invert: bool,
    },
}

impl TerrainRule {
    /// `assigned` — типы местности всех тайлов до начала классификации
    #[must_use]
    pub fn matches(&self, grid: &HexGrid, index: usize, assigned: &[Option<String>]) -> bool {
        let tile = grid.tile(index);
        match self {
            TerrainRule::AltitudeRange { min, max } => (*min..=*max).contains(&tile.altitude()),
            TerrainRule::PrecipitationRange { min, max } => {
                (*min..=*max).contains(&tile.precipitation())
            }
            TerrainRule::TemperatureRange { min, max } => {
                (*min..=*max).contains(&tile.temperature())
            }
            TerrainRule::TerrainMembership { terrains, invert } => {
                contains(terrains, assigned[index].as_deref()) != *invert
            }
            TerrainRule::TerrainCountInRange {
                terrains,
                range,
                required,
                invert,
            } => {
                let count = grid
                    .tiles_in_range(index, *range)
                    .into_iter()
                    .filter(|&i| contains(terrains, assigned[i].as_deref()))
                    .count();
                (count >= *required) != *invert
            }
        }
    }
}

fn contains(terrains: &[String], terrain: Option<&str>) -> bool {
    terrain.is_some_and(|t| terrains.iter().any(|x| x == t))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TerrainType {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    /// Меньшее значение проверяется раньше
    pub priority: i32,
    pub movement_cost: f32,
    pub rules: Vec<TerrainRule>,
}

impl TerrainType {
    #[must_use]
    pub fn new(id: &str, priority: i32, movement_cost: f32, rules: Vec<TerrainRule>) -> Self {
        Self {
            id: id.to_string(),
            display_name: id.to_string(),
            priority,
            movement_cost,
            rules,
        }
    }

    #[must_use]
    pub fn matches(&self, grid: &HexGrid, index: usize, assigned: &[Option<String>]) -> bool {
        self.rules.iter().all(|rule| rule.matches(grid, index, assigned))
    }
}

/// Упорядоченный по приоритету набор типов местности
#[derive(Debug, Clone)]
pub struct TerrainRegistry {
    types: Vec<TerrainType>,
    by_id: HashMap<String, usize>,
}

impl TerrainRegistry {
    /// Проверяет определения и упорядочивает их по приоритету (сортировка устойчивая)
    pub fn new(types: Vec<TerrainType>) -> Result<Self, MapError> {
        let mut seen = HashSet::new();
        for terrain in &types {
            if terrain.rules.is_empty() {
                return Err(MapError::EmptyRuleList(terrain.id.clone()));
            }
            if !seen.insert(terrain.id.as_str()) {
                return Err(MapError::DuplicateTerrain(terrain.id.clone()));
            }
        }

        let registry = Self::build(types);
        for pair in registry.types.windows(2) {
            if pair[0].priority == pair[1].priority {
                warn!(
                    "Типы `{}` и `{}` имеют одинаковый приоритет {}; раньше проверяется `{}`",
                    pair[0].id, pair[1].id, pair[0].priority, pair[0].id
                );
            }
        }
        Ok(registry)
    }

    fn build(mut types: Vec<TerrainType>) -> Self {
        types.sort_by_key(|t| t.priority);
        let by_id = types
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect();
        Self { types, by_id }
    }

    /// Встроенный набор биомов: вода, горы, побережье и климатические зоны
    #[must_use]
    pub fn earthlike() -> Self {
        use TerrainRule::{AltitudeRange, PrecipitationRange, TemperatureRange, TerrainCountInRange};

        let land = || TerrainRule::TerrainMembership {
            terrains: vec![OCEAN.to_string(), FRESH_WATER.to_string()],
            invert: true,
        };
        let water = |id: &str| TerrainRule::TerrainMembership {
            terrains: vec![id.to_string()],
            invert: false,
        };
        let temp = |min, max| TemperatureRange { min, max };
        let rain = |min, max| PrecipitationRange { min, max };

        Self::build(vec![
            TerrainType::new(OCEAN, 0, 8.0, vec![water(OCEAN)]),
            TerrainType::new(FRESH_WATER, 1, 5.0, vec![water(FRESH_WATER)]),
            TerrainType::new("mountain", 10, 4.0, vec![land(), AltitudeRange { min: 0.8, max: 1.0 }]),
            TerrainType::new(
                "coast",
                15,
                1.0,
                vec![
                    land(),
                    AltitudeRange { min: 0.0, max: 0.3 },
                    TerrainCountInRange {
                        terrains: vec![OCEAN.to_string()],
                        range: 1,
                        required: 1,
                        invert: false,
                    },
                ],
            ),
            TerrainType::new("arctic", 20, 1.5, vec![land(), temp(0.0, 0.24)]),
            TerrainType::new("tundra", 21, 1.2, vec![land(), temp(0.24, 0.4)]),
            TerrainType::new("boreal_forest", 30, 2.0, vec![land(), temp(0.4, 0.56), rain(0.125, 1.0)]),
            TerrainType::new("temperate_rainforest", 40, 2.5, vec![land(), temp(0.56, 0.8), rain(0.5, 1.0)]),
            TerrainType::new("temperate_forest", 41, 2.0, vec![land(), temp(0.56, 0.8), rain(0.25, 0.5)]),
            TerrainType::new("woodland", 42, 1.5, vec![land(), temp(0.4, 0.8), rain(0.05, 0.25)]),
            TerrainType::new("grassland", 49, 1.0, vec![land(), temp(0.4, 0.8)]),
            TerrainType::new("tropical_rainforest", 50, 2.5, vec![land(), temp(0.8, 1.0), rain(0.63, 1.0)]),
            TerrainType::new("savanna", 51, 1.0, vec![land(), temp(0.8, 1.0), rain(0.188, 0.63)]),
            TerrainType::new("desert", 52, 1.2, vec![land(), temp(0.8, 1.0), rain(0.0, 0.188)]),
        ])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Типы в порядке проверки
    pub fn iter(&self) -> impl Iterator<Item = &TerrainType> {
        self.types.iter()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&TerrainType> {
        self.by_id.get(id).map(|&i| &self.types[i])
    }

    /// Первый подходящий тайлу тип
    #[must_use]
    pub fn classify(
        &self,
        grid: &HexGrid,
        index: usize,
        assigned: &[Option<String>],
    ) -> Option<&TerrainType> {
        self.types.iter().find(|t| t.matches(grid, index, assigned))
    }
}

/// Назначает тип местности каждому тайлу.
///
/// Правила видят типы, назначенные до классификации (океан и пресную воду из
/// гидрологии), поэтому результат не зависит от порядка обхода. Если хотя бы один
/// тайл не подошёл ни под один тип, сетка не изменяется.
pub fn classify_terrain(grid: &mut HexGrid, registry: &TerrainRegistry) -> Result<(), MapError> {
    let assigned: Vec<Option<String>> = grid
        .tiles()
        .iter()
        .map(|t| t.terrain().map(str::to_string))
        .collect();

    let mut result = Vec::with_capacity(grid.len());
    for index in 0..grid.len() {
        let terrain = registry
            .classify(grid, index, &assigned)
            .ok_or_else(|| MapError::NoMatchingTerrain(grid.tile(index).coordinates()))?;
        result.push(terrain.id.clone());
    }

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for id in &result {
        *counts.entry(id.as_str()).or_insert(0) += 1;
    }
    info!("Местность назначена: {:?}", counts);

    for (index, id) in result.into_iter().enumerate() {
        grid.tile_mut(index).set_terrain(Some(id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::HexCoordinates;

    fn altitude_only(id: &str, priority: i32, min: f32, max: f32) -> TerrainType {
        TerrainType::new(id, priority, 1.0, vec![TerrainRule::AltitudeRange { min, max }])
    }

    #[test]
    fn rejects_empty_rule_list() {
        let err = TerrainRegistry::new(vec![TerrainType::new("void", 0, 1.0, vec![])]).unwrap_err();
        assert!(matches!(err, MapError::EmptyRuleList(id) if id == "void"));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = TerrainRegistry::new(vec![
            altitude_only("plain", 0, 0.0, 1.0),
            altitude_only("plain", 1, 0.0, 1.0),
        ])
        .unwrap_err();
        assert!(matches!(err, MapError::DuplicateTerrain(id) if id == "plain"));
    }

    #[test]
    fn lower_priority_wins_and_ties_keep_registration_order() {
        let registry = TerrainRegistry::new(vec![
            altitude_only("late", 5, 0.0, 1.0),
            altitude_only("first_tie", 1, 0.0, 1.0),
            altitude_only("second_tie", 1, 0.0, 1.0),
        ])
        .unwrap();
        let ids: Vec<&str> = registry.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["first_tie", "second_tie", "late"]);

        let grid = HexGrid::new(3, 3, 0.2);
        let assigned = vec![None; grid.len()];
        assert_eq!(registry.classify(&grid, 0, &assigned).unwrap().id, "first_tie");
    }

    #[test]
    fn range_rules_are_inclusive() {
        let mut grid = HexGrid::new(3, 3, 0.2);
        grid.tile_mut(0).set_altitude(0.5);
        let assigned = vec![None; grid.len()];
        assert!(TerrainRule::AltitudeRange { min: 0.5, max: 0.5 }.matches(&grid, 0, &assigned));
        assert!(!TerrainRule::AltitudeRange { min: 0.51, max: 1.0 }.matches(&grid, 0, &assigned));
    }

    #[test]
    fn membership_and_count_rules() {
        let grid = HexGrid::new(5, 5, 0.2);
        let center = grid.index_of(HexCoordinates::axial(0, 0)).unwrap();
        let mut assigned = vec![None; grid.len()];
        for &n in grid.neighbors(center).iter().take(2) {
            assigned[n] = Some(OCEAN.to_string());
        }

        let near_ocean = |required, invert| TerrainRule::TerrainCountInRange {
            terrains: vec![OCEAN.to_string()],
            range: 1,
            required,
            invert,
        };
        assert!(near_ocean(2, false).matches(&grid, center, &assigned));
        assert!(!near_ocean(3, false).matches(&grid, center, &assigned));
        assert!(near_ocean(3, true).matches(&grid, center, &assigned));

        let is_ocean = |invert| TerrainRule::TerrainMembership {
            terrains: vec![OCEAN.to_string()],
            invert,
        };
        assert!(!is_ocean(false).matches(&grid, center, &assigned));
        assert!(is_ocean(true).matches(&grid, center, &assigned));
    }

    #[test]
    fn count_rule_includes_the_tile_itself() {
        let grid = HexGrid::new(5, 5, 0.2);
        let center = grid.index_of(HexCoordinates::axial(0, 0)).unwrap();
        let mut assigned = vec![None; grid.len()];
        assigned[center] = Some(OCEAN.to_string());
        let rule = |required| TerrainRule::TerrainCountInRange {
            terrains: vec![OCEAN.to_string()],
            range: 2,
            required,
            invert: false,
        };
        assert!(rule(1).matches(&grid, center, &assigned));
        assert!(!rule(2).matches(&grid, center, &assigned));

        let alone = TerrainRule::TerrainCountInRange {
            terrains: vec![OCEAN.to_string()],
            range: 0,
            required: 1,
            invert: false,
        };
        assert!(alone.matches(&grid, center, &assigned));
        let neighbor = grid.neighbors(center)[0];
        assert!(!alone.matches(&grid, neighbor, &assigned));
    }

    #[test]
    fn unmatched_tile_is_an_error_and_grid_is_untouched() {
        let mut grid = HexGrid::new(4, 4, 0.2);
        for i in 0..grid.len() {
            grid.tile_mut(i).set_altitude(0.3);
        }
        grid.tile_mut(5).set_altitude(0.9);
        let registry = TerrainRegistry::new(vec![altitude_only("lowland", 0, 0.0, 0.5)]).unwrap();

        let err = classify_terrain(&mut grid, &registry).unwrap_err();
        let expected = grid.tile(5).coordinates();
        assert!(matches!(err, MapError::NoMatchingTerrain(c) if c == expected));
        assert!(grid.tiles().iter().all(|t| t.terrain().is_none()));
    }

    #[test]
    fn earthlike_keeps_water_and_covers_land() {
        let mut grid = HexGrid::new(6, 6, 0.2);
        for i in 0..grid.len() {
            let tile = grid.tile_mut(i);
            tile.set_altitude(0.5);
            tile.set_temperature((i as f32) / 36.0);
            tile.set_precipitation(1.0 - (i as f32) / 36.0);
        }
        grid.tile_mut(0).set_terrain(Some(OCEAN.to_string()));
        grid.tile_mut(1).set_altitude(0.95);

        classify_terrain(&mut grid, &TerrainRegistry::earthlike()).unwrap();

        assert_eq!(grid.tile(0).terrain(), Some(OCEAN));
        assert_eq!(grid.tile(1).terrain(), Some("mountain"));
        assert!(grid.tiles().iter().all(|t| t.terrain().is_some()));
    }

    #[test]
    fn rules_deserialize_from_tagged_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            terrains: Vec<TerrainType>,
        }
        let wrapper: Wrapper = toml::from_str(
            r#"
            [[terrains]]
            id = "marsh"
            priority = 3
            movement_cost = 3.0
            rules = [
                { kind = "altitude_range", min = 0.2, max = 0.3 },
                { kind = "terrain_count_in_range", terrains = ["fresh_water"], range = 2, required = 1 },
            ]
            "#,
        )
        .unwrap();
        let marsh = &wrapper.terrains[0];
        assert_eq!(marsh.rules.len(), 2);
        assert!(matches!(
            marsh.rules[1],
            TerrainRule::TerrainCountInRange { invert: false, required: 1, .. }
        ));
    }
}
