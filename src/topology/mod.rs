pub mod building;
pub mod building_tests;
pub mod floor_range;

pub use building::Building;
pub use floor_range::FloorRange;
