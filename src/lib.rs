pub mod automata;
pub mod climate;
pub mod config;
pub mod error;
pub mod generator;
pub mod grid;
pub mod heap;
pub mod hex;
pub mod hydrology;
pub mod noise;
pub mod pathfinding;
pub mod terrain;

pub use config::{NoiseSettings, WorldGenerationParams};
pub use error::MapError;
pub use generator::{GeneratedWorld, generate_world, terrain_registry};
pub use grid::{HexGrid, HexTile};
pub use hex::HexCoordinates;
pub use pathfinding::{Path, Pathfinder, terrain_cost};
pub use terrain::{TerrainRegistry, TerrainRule, TerrainType};
