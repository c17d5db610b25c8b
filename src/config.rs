/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::DispatchError;
use crate::topology::building::partition;

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub building: BuildingConfig,
    pub car: CarConfig,
}

#[derive(Deserialize, Clone, Debug)]
pub struct BuildingConfig {
    pub floors: i32,
    #[serde(default)]
    pub basements: i32,
    pub zones: usize,
    pub cars_per_zone: usize,
}

/**
 * Timing and payload settings shared by every car.
 *
 * All durations are in milliseconds. `travel_ms` is the abstract time of one floor-to-floor step,
 * `door_dwell_ms` the time the door stays open before the first close attempt. When a sensor is tripped,
 * close attempts are retried with a backoff that starts at `interlock_backoff_ms` and doubles up to
 * `interlock_backoff_max_ms`, until `interlock_timeout_ms` has passed.
 */
#[derive(Deserialize, Clone, Debug)]
pub struct CarConfig {
    pub door_dwell_ms: u64,
    pub travel_ms: u64,
    pub interlock_timeout_ms: u64,
    pub interlock_backoff_ms: u64,
    pub interlock_backoff_max_ms: u64,
    pub ack_timeout_ms: u64,
    pub max_payload_kg: u32,
}

impl CarConfig {
    pub fn door_dwell(&self) -> Duration {
        Duration::from_millis(self.door_dwell_ms)
    }

    pub fn travel_time(&self) -> Duration {
        Duration::from_millis(self.travel_ms)
    }

    pub fn interlock_timeout(&self) -> Duration {
        Duration::from_millis(self.interlock_timeout_ms)
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }
}

/***************************************/
/*             Public API              */
/***************************************/
pub fn load_config(path: &Path) -> Result<Config, DispatchError> {
    let config_str = fs::read_to_string(path).map_err(|e| {
        DispatchError::InvalidConfig(format!("failed to read {}: {}", path.display(), e))
    })?;
    parse_config(&config_str)
}

pub fn parse_config(config_str: &str) -> Result<Config, DispatchError> {
    let config: Config = toml::from_str(config_str)
        .map_err(|e| DispatchError::InvalidConfig(format!("failed to parse configuration: {}", e)))?;
    config.validate()?;
    Ok(config)
}

impl Config {
    pub fn validate(&self) -> Result<(), DispatchError> {
        let building = &self.building;
        if building.floors < 1 {
            return Err(DispatchError::InvalidConfig(
                "a building needs at least one floor above ground".into(),
            ));
        }
        if building.basements < 0 {
            return Err(DispatchError::InvalidConfig(
                "basements is a count and cannot be negative".into(),
            ));
        }
        if building.zones == 0 || building.zones > 26 {
            return Err(DispatchError::InvalidConfig(format!(
                "zones must be between 1 and 26, got {}",
                building.zones
            )));
        }
        if building.cars_per_zone == 0 {
            return Err(DispatchError::NoCarsAvailable { zone: 'A' });
        }

        // Every zone must serve at least one floor
        partition(building)?;

        if self.car.interlock_backoff_ms == 0 {
            return Err(DispatchError::InvalidConfig(
                "interlock_backoff_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
