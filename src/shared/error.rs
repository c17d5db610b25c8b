/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::{CarId, Floor, ZoneId};

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Error, Serialize, Debug, Clone, PartialEq)]
pub enum DispatchError {
    #[error("floor {floor} is outside the served range [{min}, {max}]")]
    FloorOutOfRange { floor: Floor, min: Floor, max: Floor },

    #[error("zone {zone} has no car that can take a call")]
    NoCarsAvailable { zone: ZoneId },

    #[error("car {car} could not close its doors at floor {floor} within {waited:?}")]
    DoorInterlockTimeout {
        car: CarId,
        floor: Floor,
        waited: Duration,
    },

    #[error("car {car} broke an invariant: {detail}")]
    InvariantViolation { car: CarId, detail: String },

    #[error("car {car} is not accepting requests")]
    CarUnavailable { car: CarId },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
