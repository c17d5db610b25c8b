/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::info;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::config::{BuildingConfig, CarConfig};
use crate::shared::{CarId, CarStatus, Direction, DispatchError, Floor, Notification, ZoneId};
use crate::topology::FloorRange;
use crate::zone::{SensorFactory, Zone};

/**
 * Splits a building's floors into contiguous zone ranges.
 *
 * With basements, the first zone serves every basement plus the ground floor and the remaining zones
 * share floors 2 and up. Without basements all zones share the floors from 1 up. Each zone gets the
 * same number of floors and the last one takes the remainder.
 */
pub fn partition(config: &BuildingConfig) -> Result<Vec<FloorRange>, DispatchError> {
    let mut ranges = Vec::with_capacity(config.zones);
    let mut upper_zones = config.zones;
    let mut first_upper = 1;

    if config.basements > 0 {
        if config.zones == 1 {
            return Ok(vec![FloorRange::new(-config.basements, config.floors)?]);
        }
        ranges.push(FloorRange::new(-config.basements, 1)?);
        upper_zones -= 1;
        first_upper = 2;
    }

    let upper_floors = config.floors - first_upper + 1;
    if upper_zones == 0 || upper_floors < upper_zones as i32 {
        return Err(DispatchError::InvalidConfig(format!(
            "{} floors cannot be split across {} zones",
            config.floors, config.zones
        )));
    }

    let floors_per_zone = upper_floors / upper_zones as i32;
    let mut min = first_upper;
    for zone in 0..upper_zones {
        let max = if zone + 1 == upper_zones {
            config.floors
        } else {
            min + floors_per_zone - 1
        };
        ranges.push(FloorRange::new(min, max)?);
        min = max + 1;
    }
    Ok(ranges)
}

/// All zones of one building. Routes hall calls to the zone serving the floor.
pub struct Building {
    zones: Vec<Zone>,
}

impl Building {
    pub fn new(
        building: &BuildingConfig,
        car: &CarConfig,
        sensors: &SensorFactory,
        notification_tx: cbc::Sender<Notification>,
    ) -> Result<Building, DispatchError> {
        let zones = partition(building)?
            .into_iter()
            .zip('A'..='Z')
            .map(|(range, id)| {
                Zone::new(
                    id,
                    range,
                    building.cars_per_zone,
                    car,
                    sensors,
                    notification_tx.clone(),
                )
            })
            .collect::<Result<Vec<Zone>, DispatchError>>()?;

        info!(
            "Created building with {} floors, {} basements and {} zones",
            building.floors,
            building.basements,
            zones.len()
        );
        Ok(Building { zones })
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn zone(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|zone| zone.id() == id)
    }

    pub fn zone_for(&self, floor: Floor) -> Result<&Zone, DispatchError> {
        self.zones
            .iter()
            .find(|zone| zone.range().contains(floor))
            .ok_or_else(|| {
                let min = self.zones.first().map_or(floor, |zone| zone.range().min);
                let max = self.zones.last().map_or(floor, |zone| zone.range().max);
                DispatchError::FloorOutOfRange { floor, min, max }
            })
    }

    pub fn request_elevator(
        &self,
        floor: Floor,
        direction: Direction,
    ) -> Result<CarId, DispatchError> {
        self.zone_for(floor)?.request_elevator(floor, direction)
    }

    pub fn request_floor(&self, car: CarId, floor: Floor) -> Result<(), DispatchError> {
        self.zone(car.zone)
            .ok_or(DispatchError::CarUnavailable { car })?
            .request_floor(car, floor)
    }

    pub fn cancel_stop(&self, car: CarId, floor: Floor) -> Result<(), DispatchError> {
        self.zone(car.zone)
            .ok_or(DispatchError::CarUnavailable { car })?
            .cancel_stop(car, floor)
    }

    pub fn statuses(&self) -> Vec<CarStatus> {
        self.zones.iter().flat_map(Zone::statuses).collect()
    }

    pub fn shutdown(self) -> Vec<(CarId, Result<(), DispatchError>)> {
        self.zones.into_iter().flat_map(Zone::shutdown).collect()
    }
}
