/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::{info, warn};
use rand::Rng;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::SafetyState;

/**
 * A door safety sensor. The car reads both of its sensors before every close attempt and only
 * closes when both report `Clear`.
 */
pub trait SafetySensor: Send {
    fn read(&mut self) -> SafetyState;
}

/// Sensor that never trips.
pub struct AlwaysClear;

impl SafetySensor for AlwaysClear {
    fn read(&mut self) -> SafetyState {
        SafetyState::Clear
    }
}

/**
 * Sensor fed from a channel, the way a hardware polling thread reports obstruction changes.
 * The latest value received wins. Starts out clear.
 */
pub struct ChannelSensor {
    rx: cbc::Receiver<bool>,
    tripped: bool,
}

impl ChannelSensor {
    pub fn new(rx: cbc::Receiver<bool>) -> ChannelSensor {
        ChannelSensor { rx, tripped: false }
    }
}

impl SafetySensor for ChannelSensor {
    fn read(&mut self) -> SafetyState {
        while let Ok(tripped) = self.rx.try_recv() {
            self.tripped = tripped;
        }
        if self.tripped {
            SafetyState::Tripped
        } else {
            SafetyState::Clear
        }
    }
}

/**
 * Simulated load cell. A fresh payload in `[0, max_payload + 100)` kg is drawn when the doors open
 * (the first read after a clear one); while the car is overloaded each further read sheds 100 kg.
 */
pub struct SimulatedLoadCell {
    max_payload_kg: u32,
    load_kg: Option<u32>,
}

impl SimulatedLoadCell {
    pub fn new(max_payload_kg: u32) -> SimulatedLoadCell {
        SimulatedLoadCell {
            max_payload_kg,
            load_kg: None,
        }
    }
}

impl SafetySensor for SimulatedLoadCell {
    fn read(&mut self) -> SafetyState {
        let load = match self.load_kg {
            Some(load) => load.saturating_sub(100),
            None => rand::thread_rng().gen_range(0..self.max_payload_kg.saturating_add(100)),
        };

        if load > self.max_payload_kg {
            warn!("Car capacity reached ({} kg), waiting for the load to drop", load);
            self.load_kg = Some(load);
            SafetyState::Tripped
        } else {
            self.load_kg = None;
            SafetyState::Clear
        }
    }
}

/// Simulated door beam, blocked on 30% of fresh reads and free again on the next one.
pub struct SimulatedObstruction {
    blocked: bool,
}

impl SimulatedObstruction {
    pub fn new() -> SimulatedObstruction {
        SimulatedObstruction { blocked: false }
    }
}

impl Default for SimulatedObstruction {
    fn default() -> Self {
        SimulatedObstruction::new()
    }
}

impl SafetySensor for SimulatedObstruction {
    fn read(&mut self) -> SafetyState {
        if self.blocked {
            info!("Door is free again");
            self.blocked = false;
            return SafetyState::Clear;
        }
        if rand::thread_rng().gen_range(0..100) >= 70 {
            warn!("Door is blocked, waiting until it is free");
            self.blocked = true;
            SafetyState::Tripped
        } else {
            SafetyState::Clear
        }
    }
}

/***************************************/
/*             Unit tests              */
/***************************************/
