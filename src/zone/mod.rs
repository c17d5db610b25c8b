pub mod zone;

pub use zone::SensorFactory;
pub use zone::Zone;
