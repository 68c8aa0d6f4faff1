use std::collections::{HashSet, VecDeque};

use hexgen::climate::generate_altitude;
use hexgen::config::AltitudeSettings;
use hexgen::hydrology::categorize_water;
use hexgen::{
    HexGrid, Pathfinder, TerrainRegistry, WorldGenerationParams, generate_world, terrain_cost,
    terrain_registry,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn params(seed: u64) -> WorldGenerationParams {
    WorldGenerationParams {
        seed: Some(seed),
        width: 48,
        height: 32,
        ..WorldGenerationParams::default()
    }
}

#[test]
fn generated_tiles_are_well_formed() {
    let world = generate_world(&params(2024), &TerrainRegistry::earthlike()).unwrap();
    let grid = &world.grid;

    assert_eq!(grid.len(), 48 * 32);
    for tile in grid.tiles() {
        let c = tile.coordinates();
        assert_eq!(c.q() + c.r() + c.s(), 0);
        for value in [tile.altitude(), tile.precipitation(), tile.temperature()] {
            assert!((0.0..=1.0).contains(&value), "{value} вне [0, 1] в {c}");
        }
        assert!(tile.terrain().is_some());
    }
}

fn assert_ocean_is_edge_lowland(grid: &HexGrid) {
    let low = |i: usize| grid.tile(i).altitude() <= grid.water_level;
    let mut reachable = vec![false; grid.len()];
    let mut queue: VecDeque<usize> = grid.border_tiles().iter().copied().filter(|&i| low(i)).collect();
    while let Some(i) = queue.pop_front() {
        if reachable[i] {
            continue;
        }
        reachable[i] = true;
        queue.extend(grid.neighbors(i).iter().copied().filter(|&n| low(n) && !reachable[n]));
    }

    for (i, tile) in grid.tiles().iter().enumerate() {
        let c = tile.coordinates();
        assert_eq!(tile.is_ocean(), reachable[i], "тайл {c}");
        if tile.is_fresh_water() {
            assert!(low(i), "пресная вода выше уровня в {c}");
        }
    }
}

#[test]
fn ocean_is_the_lowland_connected_to_the_edge() {
    let mut grid = HexGrid::new(40, 30, 0.175);
    let mut rng = ChaCha8Rng::seed_from_u64(77);
    generate_altitude(&mut grid, &AltitudeSettings::default(), &mut rng);
    categorize_water(&mut grid);
    assert_ocean_is_edge_lowland(&grid);

    let registry = TerrainRegistry::earthlike();
    for seed in 40..=50 {
        let params = WorldGenerationParams {
            seed: Some(seed),
            ..WorldGenerationParams::default()
        };
        let world = generate_world(&params, &registry).unwrap();
        assert_ocean_is_edge_lowland(&world.grid);
    }
}

#[test]
fn water_never_sits_above_the_water_level() {
    let world = generate_world(&params(9), &TerrainRegistry::earthlike()).unwrap();
    let grid = &world.grid;
    for tile in grid.tiles().iter().filter(|t| t.is_water()) {
        assert!(tile.altitude() <= grid.water_level + 1e-6);
    }
}

#[test]
fn rivers_are_simple_and_flagged() {
    let mut params = params(31);
    params.width = 64;
    params.height = 48;
    let world = generate_world(&params, &TerrainRegistry::earthlike()).unwrap();
    let grid = &world.grid;

    for river in &grid.rivers {
        let unique: HashSet<_> = river.iter().collect();
        assert_eq!(unique.len(), river.len());
        assert!(river.iter().all(|&i| grid.tile(i).has_river()));
        assert!(river.iter().all(|&i| !grid.tile(i).is_water()));
    }
    for lake in &grid.lakes {
        assert!(lake.iter().all(|&i| grid.tile(i).is_water()));
    }
}

#[test]
fn rivers_are_unbroken_chains() {
    let registry = TerrainRegistry::earthlike();
    for seed in [2, 7, 19, 38, 41] {
        let params = WorldGenerationParams {
            seed: Some(seed),
            ..WorldGenerationParams::default()
        };
        let world = generate_world(&params, &registry).unwrap();
        let grid = &world.grid;
        for river in &grid.rivers {
            assert!(river.len() >= params.rivers.min_length);
            for pair in river.windows(2) {
                assert_eq!(grid.distance(pair[0], pair[1]), 1, "разрыв русла, сид {seed}");
            }
        }
    }
}

#[test]
fn same_seed_same_world() {
    let registry = TerrainRegistry::earthlike();
    let a = generate_world(&params(123), &registry).unwrap();
    let b = generate_world(&params(123), &registry).unwrap();
    let c = generate_world(&params(124), &registry).unwrap();

    assert_eq!(a.grid.snapshot(|t| t.altitude()), b.grid.snapshot(|t| t.altitude()));
    assert_ne!(a.grid.snapshot(|t| t.altitude()), c.grid.snapshot(|t| t.altitude()));
    assert_eq!(a.wind_direction, b.wind_direction);
    assert_eq!(a.grid.rivers, b.grid.rivers);

    let terrains = |grid: &HexGrid| -> Vec<Option<String>> {
        grid.tiles().iter().map(|t| t.terrain().map(str::to_string)).collect()
    };
    assert_eq!(terrains(&a.grid), terrains(&b.grid));
}

#[test]
fn paths_follow_terrain_costs() {
    let registry = TerrainRegistry::earthlike();
    let world = generate_world(&params(55), &registry).unwrap();
    let grid = &world.grid;

    let start = grid.tile(0).coordinates();
    let goal = grid.tile(grid.len() - 1).coordinates();
    let mut pathfinder = Pathfinder::new(grid, terrain_cost(&registry));
    let path = pathfinder.find_path(start, goal).unwrap();

    assert_eq!(path.tiles.first(), Some(&start));
    assert_eq!(path.tiles.last(), Some(&goal));
    assert!(path.len() as u32 > start.distance(goal));

    let mut expected = 0.0;
    for pair in path.tiles.windows(2) {
        assert_eq!(pair[0].distance(pair[1]), 1);
        let tile = grid.tile(grid.index_of(pair[1]).unwrap());
        expected += registry.get(tile.terrain().unwrap()).unwrap().movement_cost;
    }
    assert!((path.cost - expected).abs() < 1e-3);
}

#[test]
fn terrains_from_toml_drive_classification() {
    let params = WorldGenerationParams::from_toml_str(
        r#"
        seed = 8
        width = 20
        height = 16

        [[terrains]]
        id = "ocean"
        priority = 0
        movement_cost = 5.0
        rules = [{ kind = "terrain_membership", terrains = ["ocean"] }]

        [[terrains]]
        id = "lake"
        priority = 1
        movement_cost = 5.0
        rules = [{ kind = "terrain_membership", terrains = ["fresh_water"] }]

        [[terrains]]
        id = "land"
        priority = 2
        movement_cost = 1.0
        rules = [{ kind = "altitude_range", min = 0.0, max = 1.0 }]
        "#,
    )
    .unwrap();

    let registry = terrain_registry(&params).unwrap();
    assert_eq!(registry.len(), 3);
    let world = generate_world(&params, &registry).unwrap();
    let ids: HashSet<&str> = world.grid.tiles().iter().filter_map(|t| t.terrain()).collect();
    assert!(ids.is_subset(&HashSet::from(["ocean", "lake", "land"])));
    assert!(ids.contains("land"));
}
