pub mod dispatcher;

pub use dispatcher::find_car;
pub use dispatcher::Tier;
