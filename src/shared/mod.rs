pub mod error;
pub mod macros;
pub mod notifications;
pub mod structs;

pub use error::DispatchError;
pub use notifications::Notification;
pub use structs::ButtonState;
pub use structs::CarId;
pub use structs::CarState;
pub use structs::CarStatus;
pub use structs::Direction;
pub use structs::DoorState;
pub use structs::Floor;
pub use structs::SafetyState;
pub use structs::ZoneId;
