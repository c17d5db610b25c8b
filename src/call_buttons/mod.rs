pub mod registry;
pub mod registry_tests;

pub use registry::HallCallRegistry;
pub use registry::HallLamps;
pub use registry::SharedLamps;
