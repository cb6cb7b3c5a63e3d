//! WasteTrack CLI support: container input loading and random scenarios.

pub mod input;
pub mod scenarios;

pub use input::{load_containers, SimulationRecord};
pub use scenarios::{offset_by_bearing, random_containers};
