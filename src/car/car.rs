/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::{debug, error, info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

/***************************************/
/*           Local modules             */
/***************************************/
use crate::call_buttons::SharedLamps;
use crate::car::handle::{CarCommand, CarHandle, SharedStatus};
use crate::car::sensors::SafetySensor;
use crate::config::CarConfig;
use crate::shared::{
    ButtonState, CarId, CarState, CarStatus, Direction, DispatchError, DoorState, Floor,
    Notification, SafetyState,
};
use crate::topology::FloorRange;

/***************************************/
/*               Enums                 */
/***************************************/
/// Why the loop stopped running an itinerary.
enum Halt {
    Terminated,
    Fault(DispatchError),
}

impl From<DispatchError> for Halt {
    fn from(error: DispatchError) -> Halt {
        Halt::Fault(error)
    }
}

/**
 * One elevator car and its motion loop.
 *
 * The `Car` owns its position, travel state, pending stops, doors, cabin buttons, floor displays and
 * safety sensors. Nothing else writes to them: other threads talk to the car through a `CarHandle`,
 * whose commands are picked up whenever the loop is idle or parked (travelling between floors,
 * dwelling with the door open, waiting for a sensor to clear).
 *
 * # Motion
 * - `Idle`: leaves towards the nearest pending stop, or services it on the spot if the car is there.
 * - `MovingUp` / `MovingDown`: steps floor by floor while there are stops further along, stopping at
 *   every pending floor. At the end of the sweep it turns around if stops remain, otherwise goes idle.
 *
 * # Doors
 * Doors are opened at every serviced stop and closed after the dwell time, but only once both sensors
 * read `Clear`. A tripped sensor is re-read with exponential backoff; if it never clears within the
 * interlock timeout the car stalls with `DoorInterlockTimeout` and leaves its doors open.
 */
pub struct Car {
    // Identity
    id: CarId,
    range: FloorRange,

    // Motion
    floor: Floor,
    state: CarState,
    pending_stops: BTreeSet<Floor>,
    hall_calls: BTreeSet<(Floor, Direction)>,

    // Doors, buttons, displays
    cabin_door: DoorState,
    landing_doors: BTreeMap<Floor, DoorState>,
    floor_buttons: BTreeMap<Floor, ButtonState>,
    floor_displays: BTreeMap<Floor, Floor>,
    cabin_display: Floor,

    // Safety
    weight: SafetyState,
    obstruction: SafetyState,
    weight_sensor: Box<dyn SafetySensor>,
    obstruction_sensor: Box<dyn SafetySensor>,
    fault: Option<DispatchError>,

    // Timing
    door_dwell: Duration,
    travel_time: Duration,
    interlock_timeout: Duration,
    interlock_backoff: Duration,
    interlock_backoff_max: Duration,

    // Channels and shared state
    command_rx: cbc::Receiver<CarCommand>,
    notification_tx: cbc::Sender<Notification>,
    lamps: SharedLamps,
    status: SharedStatus,
}

impl Car {
    /// Builds the car parked at `floor` with its doors closed, plus the handle used to reach it.
    pub fn new(
        id: CarId,
        range: FloorRange,
        floor: Floor,
        config: &CarConfig,
        weight_sensor: Box<dyn SafetySensor>,
        obstruction_sensor: Box<dyn SafetySensor>,
        lamps: SharedLamps,
        notification_tx: cbc::Sender<Notification>,
    ) -> Result<(Car, CarHandle), DispatchError> {
        range.check(floor)?;

        let (command_tx, command_rx) = cbc::unbounded::<CarCommand>();
        let status = Arc::new(RwLock::new(CarStatus::new(id, floor)));
        let handle = CarHandle::new(
            id,
            range,
            command_tx,
            status.clone(),
            config.ack_timeout(),
        );

        let car = Car {
            id,
            range,
            floor,
            state: CarState::Idle,
            pending_stops: BTreeSet::new(),
            hall_calls: BTreeSet::new(),
            cabin_door: DoorState::Closed,
            landing_doors: range.floors().map(|f| (f, DoorState::Closed)).collect(),
            floor_buttons: range.floors().map(|f| (f, ButtonState::Off)).collect(),
            floor_displays: range.floors().map(|f| (f, floor)).collect(),
            cabin_display: floor,
            weight: SafetyState::Clear,
            obstruction: SafetyState::Clear,
            weight_sensor,
            obstruction_sensor,
            fault: None,
            door_dwell: config.door_dwell(),
            travel_time: config.travel_time(),
            interlock_timeout: config.interlock_timeout(),
            interlock_backoff: Duration::from_millis(config.interlock_backoff_ms),
            interlock_backoff_max: Duration::from_millis(
                config.interlock_backoff_max_ms.max(config.interlock_backoff_ms),
            ),
            command_rx,
            notification_tx,
            lamps,
            status,
        };
        Ok((car, handle))
    }

    /// Runs until terminated or until the car stalls. A stall is returned as the error.
    pub fn run(mut self) -> Result<(), DispatchError> {
        info!("Car {} ready at floor {}", self.id, self.floor);
        self.publish();

        let halt = loop {
            let result = if self.pending_stops.is_empty() {
                match self.command_rx.recv() {
                    Ok(command) => self.handle_command(command),
                    Err(_) => Err(Halt::Terminated),
                }
            } else {
                self.run_itinerary()
            };

            if let Err(halt) = result {
                break halt;
            }
        };

        match halt {
            Halt::Terminated => {
                info!("Car {} terminated at floor {}", self.id, self.floor);
                Ok(())
            }
            Halt::Fault(error) => {
                self.stall(error.clone());
                Err(error)
            }
        }
    }

    /***************************************/
    /*              Commands               */
    /***************************************/
    fn handle_command(&mut self, command: CarCommand) -> Result<(), Halt> {
        match command {
            CarCommand::RequestFloor(floor) => self.request_floor(floor),
            CarCommand::AssignHallCall {
                floor,
                direction,
                ack_tx,
            } => {
                match self.add_stop(floor) {
                    Ok(_) => {
                        self.hall_calls.insert((floor, direction));
                        self.plan_departure();
                    }
                    Err(e) => warn!("Car {} dropped hall call: {}", self.id, e),
                }
                self.publish();
                let _ = ack_tx.send(self.snapshot());
            }
            CarCommand::WithdrawHallCall { floor, direction } => {
                self.withdraw_hall_call(floor, direction)
            }
            CarCommand::CancelStop(floor) => self.cancel_stop(floor),
            CarCommand::Terminate => return Err(Halt::Terminated),
        }
        Ok(())
    }

    fn request_floor(&mut self, floor: Floor) {
        if floor == self.floor {
            debug!("Car {} is already at floor {}", self.id, floor);
            return;
        }
        match self.add_stop(floor) {
            Ok(_) => {
                info!("Car {} cabin call to floor {}", self.id, floor);
                self.set_floor_button(floor, ButtonState::On);
                self.plan_departure();
                self.publish();
            }
            Err(e) => warn!("Car {} dropped cabin call: {}", self.id, e),
        }
    }

    fn cancel_stop(&mut self, floor: Floor) {
        let removed = self.pending_stops.remove(&floor);
        self.hall_calls.retain(|(f, _)| *f != floor);
        self.set_floor_button(floor, ButtonState::Off);
        if self.pending_stops.is_empty() {
            self.set_state(CarState::Idle);
        }
        if removed {
            info!("Car {} cancelled stop at floor {}", self.id, floor);
            self.publish();
        }
    }

    fn withdraw_hall_call(&mut self, floor: Floor, direction: Direction) {
        if !self.hall_calls.remove(&(floor, direction)) {
            return;
        }
        let still_needed = self.floor_buttons.get(&floor) == Some(&ButtonState::On)
            || self.hall_calls.iter().any(|(f, _)| *f == floor);
        if still_needed {
            return;
        }

        warn!("Car {} withdrew hall call at floor {} going {}", self.id, floor, direction);
        self.pending_stops.remove(&floor);
        if self.pending_stops.is_empty() {
            self.set_state(CarState::Idle);
        }
        self.publish();
    }

    /// Merges a floor into the sorted stop set. Returns whether it was new.
    fn add_stop(&mut self, floor: Floor) -> Result<bool, DispatchError> {
        self.range.check(floor)?;
        Ok(self.pending_stops.insert(floor))
    }

    /// Leaves Idle towards the nearest pending stop. Returns true when that stop is the current floor.
    fn plan_departure(&mut self) -> bool {
        if self.state != CarState::Idle {
            return false;
        }
        let nearest = self
            .pending_stops
            .iter()
            .copied()
            .min_by_key(|stop| (stop - self.floor).abs());

        match nearest {
            Some(stop) if stop > self.floor => self.set_state(CarState::MovingUp),
            Some(stop) if stop < self.floor => self.set_state(CarState::MovingDown),
            Some(_) => return true,
            None => {}
        }
        false
    }

    /***************************************/
    /*               Motion                */
    /***************************************/
    fn run_itinerary(&mut self) -> Result<(), Halt> {
        while !self.pending_stops.is_empty() {
            match self.state.direction() {
                None => {
                    if self.plan_departure() {
                        self.service_stop()?;
                    }
                }
                Some(direction) => self.sweep(direction)?,
            }
        }
        self.set_state(CarState::Idle);
        self.publish();
        Ok(())
    }

    fn sweep(&mut self, direction: Direction) -> Result<(), Halt> {
        if self.pending_stops.is_empty() {
            return Err(Halt::Fault(DispatchError::InvariantViolation {
                car: self.id,
                detail: format!("{:?} with no pending stops", self.state),
            }));
        }
        let moving = CarState::moving(direction);

        while self.state == moving {
            // A stop at the current floor is served before leaving it
            if self.pending_stops.contains(&self.floor) {
                self.service_stop()?;
                continue;
            }
            if !self.has_stops_beyond(direction) {
                break;
            }

            self.close_doors()?;
            self.pause(self.travel_time)?;
            if self.state != moving || self.pending_stops.contains(&self.floor) {
                continue;
            }
            if !self.has_stops_beyond(direction) {
                break;
            }

            let next = match self.range.step(self.floor, direction) {
                Some(next) => next,
                None => break,
            };
            self.move_to(next, direction);
        }

        // The state may have changed while parked at a stop
        if self.state == moving {
            if self.pending_stops.is_empty() {
                self.set_state(CarState::Idle);
            } else {
                self.set_state(CarState::moving(direction.opposite()));
                info!("Car {} is now going {}", self.id, direction.opposite());
            }
            self.publish();
        }
        Ok(())
    }

    fn has_stops_beyond(&self, direction: Direction) -> bool {
        match direction {
            Direction::Up => self.pending_stops.range(self.floor + 1..).next().is_some(),
            Direction::Down => self.pending_stops.range(..self.floor).next().is_some(),
        }
    }

    fn move_to(&mut self, floor: Floor, direction: Direction) {
        debug!(
            "Car {} moving {} from floor {} to floor {}",
            self.id, direction, self.floor, floor
        );
        self.floor = floor;
        self.update_displays();
        let _ = self.notification_tx.send(Notification::FloorChanged {
            car: self.id,
            floor,
        });
        self.publish();
    }

    fn update_displays(&mut self) {
        let floor = self.floor;
        self.cabin_display = floor;
        for display in self.floor_displays.values_mut() {
            *display = floor;
        }
    }

    /// Opens the doors at the current floor, marks the stop visited and clears its lamps and button.
    /// A call for this floor taken while the doors are open restarts the dwell.
    fn service_stop(&mut self) -> Result<(), Halt> {
        let floor = self.floor;
        self.open_doors();

        while self.pending_stops.remove(&floor) {
            self.clear_calls(floor);
            self.set_floor_button(floor, ButtonState::Off);
            if self.pending_stops.is_empty() {
                self.set_state(CarState::Idle);
            }
            self.publish();

            self.pause(self.door_dwell)?;
        }
        self.close_doors()
    }

    /// The lamp matching the travel direction is cleared; at a turnaround or when arriving from idle
    /// both are. Hall calls assigned to this car at the floor are always cleared.
    fn clear_calls(&mut self, floor: Floor) {
        let continuing = self
            .state
            .direction()
            .filter(|direction| self.has_stops_beyond(*direction));

        let mut lamps = self.lamps.lock().unwrap_or_else(PoisonError::into_inner);
        match continuing {
            Some(direction) => lamps.clear(floor, direction),
            None => lamps.clear_both(floor),
        }
        self.hall_calls.retain(|(f, direction)| {
            if *f == floor {
                lamps.clear(floor, *direction);
                false
            } else {
                true
            }
        });
    }

    /***************************************/
    /*                Doors                */
    /***************************************/
    fn open_doors(&mut self) {
        if self.cabin_door == DoorState::Open && self.landing_door() == DoorState::Open {
            return;
        }
        self.cabin_door = DoorState::Open;
        self.landing_doors.insert(self.floor, DoorState::Open);
        info!("Car {} doors opened at floor {}", self.id, self.floor);
        let _ = self.notification_tx.send(Notification::DoorOpened {
            car: self.id,
            floor: self.floor,
        });
    }

    /// Closes cabin and landing door once both sensors are clear, retrying with backoff.
    fn close_doors(&mut self) -> Result<(), Halt> {
        if self.cabin_door == DoorState::Closed && self.landing_door() == DoorState::Closed {
            return Ok(());
        }

        let started = Instant::now();
        let mut backoff = self.interlock_backoff;
        loop {
            if self.check_sensors() {
                self.cabin_door = DoorState::Closed;
                self.landing_doors.insert(self.floor, DoorState::Closed);
                info!("Car {} doors closed at floor {}", self.id, self.floor);
                let _ = self.notification_tx.send(Notification::DoorClosed {
                    car: self.id,
                    floor: self.floor,
                });
                self.publish();
                return Ok(());
            }

            let waited = started.elapsed();
            if waited >= self.interlock_timeout {
                return Err(Halt::Fault(DispatchError::DoorInterlockTimeout {
                    car: self.id,
                    floor: self.floor,
                    waited,
                }));
            }
            debug!(
                "Car {} holding doors open at floor {} (weight {:?}, obstruction {:?})",
                self.id, self.floor, self.weight, self.obstruction
            );
            self.pause(backoff.min(self.interlock_timeout - waited))?;
            backoff = (backoff * 2).min(self.interlock_backoff_max);
        }
    }

    /// Reads both sensors. True when the doors may close.
    fn check_sensors(&mut self) -> bool {
        let weight = self.weight_sensor.read();
        let obstruction = self.obstruction_sensor.read();
        if weight != self.weight || obstruction != self.obstruction {
            self.weight = weight;
            self.obstruction = obstruction;
            self.publish();
        }
        weight == SafetyState::Clear && obstruction == SafetyState::Clear
    }

    fn landing_door(&self) -> DoorState {
        self.landing_doors
            .get(&self.floor)
            .copied()
            .unwrap_or(DoorState::Closed)
    }

    /***************************************/
    /*           Shared helpers            */
    /***************************************/
    /// Waits for `duration` while still taking commands.
    fn pause(&mut self, duration: Duration) -> Result<(), Halt> {
        while let Ok(command) = self.command_rx.try_recv() {
            self.handle_command(command)?;
        }

        let deadline = Instant::now() + duration;
        loop {
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            cbc::select! {
                recv(self.command_rx) -> command => {
                    match command {
                        Ok(command) => self.handle_command(command)?,
                        Err(_) => return Err(Halt::Terminated),
                    }
                }
                default(deadline - now) => return Ok(()),
            }
        }
    }

    fn set_state(&mut self, state: CarState) {
        if self.state != state {
            debug!("Car {} {:?} -> {:?}", self.id, self.state, state);
            self.state = state;
        }
    }

    fn set_floor_button(&mut self, floor: Floor, lamp: ButtonState) {
        if let Some(button) = self.floor_buttons.get_mut(&floor) {
            if *button != lamp {
                *button = lamp;
                let _ = self.notification_tx.send(Notification::CabinButtonChanged {
                    car: self.id,
                    floor,
                    lamp,
                });
            }
        }
    }

    fn stall(&mut self, error: DispatchError) {
        error!("Car {} stalled at floor {}: {}", self.id, self.floor, error);
        self.fault = Some(error.clone());
        self.release_hall_calls();
        let _ = self.notification_tx.send(Notification::CarStalled {
            car: self.id,
            floor: self.floor,
            error,
        });
        self.publish();
    }

    /// Turns off the lamps of hall calls this car will no longer serve, so a new press reaches a
    /// working car.
    fn release_hall_calls(&mut self) {
        let mut lamps = self.lamps.lock().unwrap_or_else(PoisonError::into_inner);
        for (floor, direction) in std::mem::take(&mut self.hall_calls) {
            warn!(
                "Car {} released hall call at floor {} going {}",
                self.id, floor, direction
            );
            lamps.clear(floor, direction);
        }
    }

    fn snapshot(&self) -> CarStatus {
        CarStatus {
            id: self.id,
            floor: self.floor,
            state: self.state,
            door: self.cabin_door,
            landing_door: self.landing_door(),
            weight: self.weight,
            obstruction: self.obstruction,
            pending_stops: self.pending_stops.iter().copied().collect(),
            display: self.cabin_display,
            fault: self.fault.clone(),
        }
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        *self.status.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }
}
