pub mod car;
pub mod handle;
pub mod sensors;

pub use car::Car;
pub use handle::CarCommand;
pub use handle::CarHandle;
pub use sensors::AlwaysClear;
pub use sensors::ChannelSensor;
pub use sensors::SafetySensor;
pub use sensors::SimulatedLoadCell;
pub use sensors::SimulatedObstruction;
