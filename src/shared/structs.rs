/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Deserialize;
use serde::Serialize;
use std::fmt;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::DispatchError;

/***************************************/
/*       Public data structures        */
/***************************************/

/// Signed floor number. Ground floor is 1, basements count down from -1, zero does not exist.
pub type Floor = i32;

/// Zones are named with a letter, starting at `A`.
pub type ZoneId = char;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CarId {
    pub zone: ZoneId,
    pub number: u32,
}

impl CarId {
    pub fn new(zone: ZoneId, number: u32) -> CarId {
        CarId { zone, number }
    }
}

impl fmt::Display for CarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.zone, self.number)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarState {
    #[serde(rename = "idle")]
    Idle,
    #[serde(rename = "movingUp")]
    MovingUp,
    #[serde(rename = "movingDown")]
    MovingDown,
}

impl CarState {
    pub fn moving(direction: Direction) -> CarState {
        match direction {
            Direction::Up => CarState::MovingUp,
            Direction::Down => CarState::MovingDown,
        }
    }

    /// Travel direction, `None` while idle.
    pub fn direction(self) -> Option<Direction> {
        match self {
            CarState::Idle => None,
            CarState::MovingUp => Some(Direction::Up),
            CarState::MovingDown => Some(Direction::Down),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DoorState {
    Open,
    Closed,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SafetyState {
    Clear,
    Tripped,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ButtonState {
    On,
    Off,
}

/**
 * Snapshot of one car, published by the car's own loop after every change.
 *
 * This is the only view other components get of a car. The dispatcher scores cars from it and the
 * binary prints it on `status`.
 */
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CarStatus {
    pub id: CarId,
    pub floor: Floor,
    pub state: CarState,
    pub door: DoorState,
    #[serde(rename = "landingDoor")]
    pub landing_door: DoorState,
    pub weight: SafetyState,
    pub obstruction: SafetyState,
    #[serde(rename = "pendingStops")]
    pub pending_stops: Vec<Floor>,
    pub display: Floor,
    pub fault: Option<DispatchError>,
}

impl CarStatus {
    pub fn new(id: CarId, floor: Floor) -> CarStatus {
        CarStatus {
            id,
            floor,
            state: CarState::Idle,
            door: DoorState::Closed,
            landing_door: DoorState::Closed,
            weight: SafetyState::Clear,
            obstruction: SafetyState::Clear,
            pending_stops: Vec::new(),
            display: floor,
            fault: None,
        }
    }

    pub fn is_stalled(&self) -> bool {
        self.fault.is_some()
    }
}
