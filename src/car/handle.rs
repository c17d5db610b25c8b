/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::{CarId, CarStatus, Direction, DispatchError, Floor};
use crate::topology::FloorRange;

pub type SharedStatus = Arc<RwLock<CarStatus>>;

/// Requests other threads send into a car's loop.
#[derive(Debug)]
pub enum CarCommand {
    /// Cabin call. Ignored when the car is already at the floor.
    RequestFloor(Floor),
    /// Hall call picked by the dispatcher. Acknowledged once the stop is merged and the new status
    /// is published.
    AssignHallCall {
        floor: Floor,
        direction: Direction,
        ack_tx: cbc::Sender<CarStatus>,
    },
    /// Takes back a hall call whose assignment was not acknowledged in time. The stop stays when a
    /// cabin call or another hall call still needs the floor.
    WithdrawHallCall { floor: Floor, direction: Direction },
    CancelStop(Floor),
    Terminate,
}

/**
 * The thread-safe side of a car.
 *
 * Holds the command channel into the car's loop and the status snapshot the loop publishes. Floors are
 * checked against the car's served range here, so out-of-range requests are rejected at the call site.
 */
#[derive(Clone, Debug)]
pub struct CarHandle {
    id: CarId,
    range: FloorRange,
    command_tx: cbc::Sender<CarCommand>,
    status: SharedStatus,
    ack_timeout: Duration,
}

impl CarHandle {
    pub fn new(
        id: CarId,
        range: FloorRange,
        command_tx: cbc::Sender<CarCommand>,
        status: SharedStatus,
        ack_timeout: Duration,
    ) -> CarHandle {
        CarHandle {
            id,
            range,
            command_tx,
            status,
            ack_timeout,
        }
    }

    pub fn id(&self) -> CarId {
        self.id
    }

    pub fn status(&self) -> CarStatus {
        self.status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn request_floor(&self, floor: Floor) -> Result<(), DispatchError> {
        self.range.check(floor)?;
        self.send(CarCommand::RequestFloor(floor))
    }

    /// Hands a hall call to the car and blocks until the car has taken it into its itinerary.
    ///
    /// If no ack arrives within the ack timeout the call is withdrawn again, so a car that picks the
    /// command up late does not serve a call the zone has already given up on.
    pub fn assign_hall_call(
        &self,
        floor: Floor,
        direction: Direction,
    ) -> Result<CarStatus, DispatchError> {
        self.range.check(floor)?;
        let (ack_tx, ack_rx) = cbc::bounded::<CarStatus>(1);
        self.send(CarCommand::AssignHallCall {
            floor,
            direction,
            ack_tx,
        })?;
        match ack_rx.recv_timeout(self.ack_timeout) {
            Ok(status) => Ok(status),
            Err(_) => {
                let _ = self
                    .command_tx
                    .send(CarCommand::WithdrawHallCall { floor, direction });
                Err(DispatchError::CarUnavailable { car: self.id })
            }
        }
    }

    /// Withdraws a stop. Removing a floor that is not pending is a no-op.
    pub fn cancel_stop(&self, floor: Floor) -> Result<(), DispatchError> {
        self.range.check(floor)?;
        self.send(CarCommand::CancelStop(floor))
    }

    pub fn terminate(&self) {
        let _ = self.command_tx.send(CarCommand::Terminate);
    }

    fn send(&self, command: CarCommand) -> Result<(), DispatchError> {
        self.command_tx
            .send(command)
            .map_err(|_| DispatchError::CarUnavailable { car: self.id })
    }
}
