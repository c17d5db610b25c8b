/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::{info, warn};
use std::sync::{Mutex, PoisonError};
use std::thread::{Builder, JoinHandle};

/***************************************/
/*           Local modules             */
/***************************************/
use crate::call_buttons::{HallLamps, SharedLamps};
use crate::car::{Car, CarHandle, SafetySensor};
use crate::config::CarConfig;
use crate::dispatch::find_car;
use crate::shared::{CarId, CarStatus, Direction, DispatchError, Floor, Notification, ZoneId};
use crate::topology::FloorRange;

/// Builds the weight and obstruction sensors for a car.
pub type SensorFactory = dyn Fn(CarId) -> (Box<dyn SafetySensor>, Box<dyn SafetySensor>);

/**
 * A bank of cars serving one contiguous floor range, together with its hall-call lamps.
 *
 * The zone is the unit of dispatch. Every car's loop is started when the zone is built and runs on its
 * own thread until `shutdown`. Hall calls are dispatched one at a time: choosing a car and handing it
 * the stop happen under the same lock, so two calls arriving together cannot both claim one idle car.
 */
pub struct Zone {
    id: ZoneId,
    range: FloorRange,
    cars: Vec<CarHandle>,
    car_threads: Vec<JoinHandle<Result<(), DispatchError>>>,
    lamps: SharedLamps,
    dispatch_lock: Mutex<()>,
}

impl Zone {
    /// Builds a zone with `car_count` cars parked on the ground floor, or the lowest served floor if the
    /// zone does not reach the ground floor.
    pub fn new(
        id: ZoneId,
        range: FloorRange,
        car_count: usize,
        config: &CarConfig,
        sensors: &SensorFactory,
        notification_tx: cbc::Sender<Notification>,
    ) -> Result<Zone, DispatchError> {
        let home = if range.contains(1) { 1 } else { range.min };
        Zone::with_cars(
            id,
            range,
            &vec![home; car_count],
            config,
            sensors,
            notification_tx,
        )
    }

    /// Builds a zone with one car per entry of `start_floors`, parked on that floor.
    pub fn with_cars(
        id: ZoneId,
        range: FloorRange,
        start_floors: &[Floor],
        config: &CarConfig,
        sensors: &SensorFactory,
        notification_tx: cbc::Sender<Notification>,
    ) -> Result<Zone, DispatchError> {
        if start_floors.is_empty() {
            return Err(DispatchError::NoCarsAvailable { zone: id });
        }

        let lamps = HallLamps::new(id, range, notification_tx.clone()).shared();
        let mut cars = Vec::with_capacity(start_floors.len());
        let mut car_threads = Vec::with_capacity(start_floors.len());

        for (number, floor) in (1..).zip(start_floors.iter().copied()) {
            let car_id = CarId::new(id, number);
            let (weight_sensor, obstruction_sensor) = sensors(car_id);
            let (car, handle) = Car::new(
                car_id,
                range,
                floor,
                config,
                weight_sensor,
                obstruction_sensor,
                lamps.clone(),
                notification_tx.clone(),
            )?;

            let car_thread = Builder::new()
                .name(format!("car_{}", car_id))
                .spawn(move || car.run())
                .map_err(|_| DispatchError::CarUnavailable { car: car_id })?;

            cars.push(handle);
            car_threads.push(car_thread);
        }

        info!(
            "Created zone {} serving floors {} to {} with {} cars",
            id,
            range.min,
            range.max,
            cars.len()
        );

        Ok(Zone {
            id,
            range,
            cars,
            car_threads,
            lamps,
            dispatch_lock: Mutex::new(()),
        })
    }

    pub fn id(&self) -> ZoneId {
        self.id
    }

    pub fn range(&self) -> FloorRange {
        self.range
    }

    pub fn cars(&self) -> &[CarHandle] {
        &self.cars
    }

    pub fn car(&self, car: CarId) -> Result<&CarHandle, DispatchError> {
        self.cars
            .iter()
            .find(|handle| handle.id() == car)
            .ok_or(DispatchError::CarUnavailable { car })
    }

    pub fn statuses(&self) -> Vec<CarStatus> {
        self.cars.iter().map(CarHandle::status).collect()
    }

    /// Hall call: lights the lamp, picks a car and hands it the stop. Returns the chosen car.
    pub fn request_elevator(
        &self,
        floor: Floor,
        direction: Direction,
    ) -> Result<CarId, DispatchError> {
        self.range.check(floor)?;
        let _dispatching = self
            .dispatch_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let lit = self.lock_lamps().press(floor, direction)?;
        info!("Zone {} hall call at floor {} going {}", self.id, floor, direction);

        match self.assign(floor, direction) {
            Ok(car) => {
                info!("Zone {} sent car {} to floor {}", self.id, car, floor);
                Ok(car)
            }
            Err(e) => {
                warn!("Zone {} dropped hall call at floor {}: {}", self.id, floor, e);
                if lit {
                    self.lock_lamps().clear(floor, direction);
                }
                Err(e)
            }
        }
    }

    /// Cabin call from inside `car`.
    pub fn request_floor(&self, car: CarId, floor: Floor) -> Result<(), DispatchError> {
        self.car(car)?.request_floor(floor)
    }

    pub fn cancel_stop(&self, car: CarId, floor: Floor) -> Result<(), DispatchError> {
        self.car(car)?.cancel_stop(floor)
    }

    pub fn is_lamp_on(&self, floor: Floor, direction: Direction) -> bool {
        self.lock_lamps().is_on(floor, direction)
    }

    pub fn pending_calls(&self, direction: Direction) -> Vec<Floor> {
        self.lock_lamps().pending(direction)
    }

    /// Stops every car loop and reports how each one ended.
    pub fn shutdown(self) -> Vec<(CarId, Result<(), DispatchError>)> {
        for car in &self.cars {
            car.terminate();
        }
        self.cars
            .iter()
            .map(CarHandle::id)
            .zip(self.car_threads)
            .map(|(car, thread)| {
                let result = thread.join().unwrap_or_else(|_| {
                    Err(DispatchError::InvariantViolation {
                        car,
                        detail: "car thread panicked".into(),
                    })
                });
                (car, result)
            })
            .collect()
    }

    fn assign(&self, floor: Floor, direction: Direction) -> Result<CarId, DispatchError> {
        let statuses = self.statuses();
        let (index, _tier) = find_car(self.id, floor, direction, &statuses)?;
        let car = &self.cars[index];
        car.assign_hall_call(floor, direction)?;
        Ok(car.id())
    }

    fn lock_lamps(&self) -> std::sync::MutexGuard<'_, HallLamps> {
        self.lamps.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
