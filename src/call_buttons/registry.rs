/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::debug;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::{ButtonState, Direction, DispatchError, Floor, Notification, ZoneId};
use crate::topology::FloorRange;

pub type SharedLamps = Arc<Mutex<HallLamps>>;

/**
 * Hall-call lamps for one direction in one zone.
 *
 * Up buttons exist on every served floor but the top one, down buttons on every served floor but the
 * bottom one. A single-floor zone keeps both buttons on its only floor.
 */
#[derive(Debug, Clone)]
pub struct HallCallRegistry {
    lamps: BTreeMap<Floor, ButtonState>,
    min: Floor,
    max: Floor,
}

impl HallCallRegistry {
    pub fn new(range: FloorRange, direction: Direction) -> HallCallRegistry {
        let skip = if range.len() > 1 {
            match direction {
                Direction::Up => Some(range.max),
                Direction::Down => Some(range.min),
            }
        } else {
            None
        };
        let lamps = range
            .floors()
            .filter(|floor| Some(*floor) != skip)
            .map(|floor| (floor, ButtonState::Off))
            .collect::<BTreeMap<_, _>>();

        HallCallRegistry {
            min: lamps.keys().next().copied().unwrap_or(range.min),
            max: lamps.keys().next_back().copied().unwrap_or(range.max),
            lamps,
        }
    }

    /// Turns the lamp on. Returns whether the lamp changed.
    pub fn press(&mut self, floor: Floor) -> Result<bool, DispatchError> {
        match self.lamps.get_mut(&floor) {
            Some(lamp) => {
                let changed = *lamp == ButtonState::Off;
                *lamp = ButtonState::On;
                Ok(changed)
            }
            None => Err(DispatchError::FloorOutOfRange {
                floor,
                min: self.min,
                max: self.max,
            }),
        }
    }

    /// Turns the lamp off. Floors without a button in this direction are ignored.
    pub fn clear(&mut self, floor: Floor) -> bool {
        match self.lamps.get_mut(&floor) {
            Some(lamp) if *lamp == ButtonState::On => {
                *lamp = ButtonState::Off;
                true
            }
            _ => false,
        }
    }

    pub fn is_on(&self, floor: Floor) -> bool {
        self.lamps.get(&floor) == Some(&ButtonState::On)
    }

    pub fn pending(&self) -> Vec<Floor> {
        self.lamps
            .iter()
            .filter(|(_, lamp)| **lamp == ButtonState::On)
            .map(|(floor, _)| *floor)
            .collect()
    }
}

/**
 * The up and down registries of a zone.
 *
 * Shared between the zone, which presses lamps when a hall call arrives, and its cars, which clear
 * them when they open their doors. Every change is forwarded as a `LampChanged` notification.
 */
#[derive(Debug)]
pub struct HallLamps {
    zone: ZoneId,
    up: HallCallRegistry,
    down: HallCallRegistry,
    notification_tx: cbc::Sender<Notification>,
}

impl HallLamps {
    pub fn new(
        zone: ZoneId,
        range: FloorRange,
        notification_tx: cbc::Sender<Notification>,
    ) -> HallLamps {
        HallLamps {
            zone,
            up: HallCallRegistry::new(range, Direction::Up),
            down: HallCallRegistry::new(range, Direction::Down),
            notification_tx,
        }
    }

    pub fn shared(self) -> SharedLamps {
        Arc::new(Mutex::new(self))
    }

    /// Turns the lamp on. Returns whether it was off before.
    pub fn press(&mut self, floor: Floor, direction: Direction) -> Result<bool, DispatchError> {
        let changed = self.registry_mut(direction).press(floor)?;
        if changed {
            self.notify(floor, direction, ButtonState::On);
        }
        Ok(changed)
    }

    pub fn clear(&mut self, floor: Floor, direction: Direction) {
        if self.registry_mut(direction).clear(floor) {
            self.notify(floor, direction, ButtonState::Off);
        }
    }

    pub fn clear_both(&mut self, floor: Floor) {
        self.clear(floor, Direction::Up);
        self.clear(floor, Direction::Down);
    }

    pub fn is_on(&self, floor: Floor, direction: Direction) -> bool {
        self.registry(direction).is_on(floor)
    }

    pub fn pending(&self, direction: Direction) -> Vec<Floor> {
        self.registry(direction).pending()
    }

    fn registry(&self, direction: Direction) -> &HallCallRegistry {
        match direction {
            Direction::Up => &self.up,
            Direction::Down => &self.down,
        }
    }

    fn registry_mut(&mut self, direction: Direction) -> &mut HallCallRegistry {
        match direction {
            Direction::Up => &mut self.up,
            Direction::Down => &mut self.down,
        }
    }

    fn notify(&self, floor: Floor, direction: Direction, lamp: ButtonState) {
        debug!("Zone {} {} lamp at floor {} is {:?}", self.zone, direction, floor, lamp);
        let _ = self.notification_tx.send(Notification::LampChanged {
            zone: self.zone,
            floor,
            direction,
            lamp,
        });
    }
}
