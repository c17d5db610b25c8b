/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Serialize;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::{ButtonState, CarId, Direction, DispatchError, Floor, ZoneId};

/// Fire-and-forget events for displays and logging. Nobody acknowledges them.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub enum Notification {
    FloorChanged {
        car: CarId,
        floor: Floor,
    },
    DoorOpened {
        car: CarId,
        floor: Floor,
    },
    DoorClosed {
        car: CarId,
        floor: Floor,
    },
    LampChanged {
        zone: ZoneId,
        floor: Floor,
        direction: Direction,
        lamp: ButtonState,
    },
    CabinButtonChanged {
        car: CarId,
        floor: Floor,
        lamp: ButtonState,
    },
    CarStalled {
        car: CarId,
        floor: Floor,
        error: DispatchError,
    },
}
