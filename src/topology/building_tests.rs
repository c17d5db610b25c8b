/*
 * Unit tests for the building partition and configuration loading
 *
 * The unit tests follows the Arrange, Act, Assert pattern.
 *
 * Tests:
 * - test_partition_without_basements
 * - test_partition_with_basements
 * - test_partition_single_zone
 * - test_building_routes_hall_calls
 * - test_parse_config
 */

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod building_tests {
    use crate::car::{AlwaysClear, SafetySensor};
    use crate::config::{parse_config, BuildingConfig};
    use crate::shared::Direction::{Down, Up};
    use crate::shared::{CarId, DispatchError, Notification};
    use crate::topology::building::partition;
    use crate::topology::{Building, FloorRange};
    use crossbeam_channel::unbounded;
    use std::thread::sleep;
    use std::time::{Duration, Instant};

    const TEST_CONFIG: &str = r#"
        [building]
        floors = 10
        basements = 2
        zones = 3
        cars_per_zone = 2

        [car]
        door_dwell_ms = 5
        travel_ms = 5
        interlock_timeout_ms = 100
        interlock_backoff_ms = 2
        interlock_backoff_max_ms = 10
        ack_timeout_ms = 1000
        max_payload_kg = 500
    "#;

    fn building_config(floors: i32, basements: i32, zones: usize) -> BuildingConfig {
        BuildingConfig {
            floors,
            basements,
            zones,
            cars_per_zone: 1,
        }
    }

    fn clear_sensors(_car: CarId) -> (Box<dyn SafetySensor>, Box<dyn SafetySensor>) {
        (Box::new(AlwaysClear), Box::new(AlwaysClear))
    }

    #[test]
    fn test_partition_without_basements() {
        // Act
        let ranges = partition(&building_config(10, 0, 3)).unwrap();

        // Assert
        assert_eq!(
            ranges,
            vec![
                FloorRange::new(1, 3).unwrap(),
                FloorRange::new(4, 6).unwrap(),
                FloorRange::new(7, 10).unwrap(),
            ]
        );
    }

    #[test]
    fn test_partition_with_basements() {
        // Act
        let ranges = partition(&building_config(60, 6, 4)).unwrap();
        let too_many_zones = partition(&building_config(3, 1, 4));

        // Assert
        assert_eq!(
            ranges,
            vec![
                FloorRange::new(-6, 1).unwrap(),
                FloorRange::new(2, 20).unwrap(),
                FloorRange::new(21, 39).unwrap(),
                FloorRange::new(40, 60).unwrap(),
            ]
        );
        assert!(matches!(too_many_zones, Err(DispatchError::InvalidConfig(_))));
    }

    #[test]
    fn test_partition_single_zone() {
        assert_eq!(
            partition(&building_config(5, 2, 1)).unwrap(),
            vec![FloorRange::new(-2, 5).unwrap()]
        );
    }

    #[test]
    fn test_building_routes_hall_calls() {
        // Arrange
        let config = parse_config(TEST_CONFIG).unwrap();
        let (notification_tx, _notification_rx) = unbounded::<Notification>();
        let building =
            Building::new(&config.building, &config.car, &clear_sensors, notification_tx).unwrap();

        // Act
        let basement = building.request_elevator(-2, Up).unwrap();
        let upper = building.request_elevator(9, Down).unwrap();
        let outside = building.request_elevator(11, Down);

        // Assert
        assert_eq!(building.zones().len(), 3);
        assert_eq!(basement.zone, 'A');
        assert_eq!(upper.zone, 'C');
        assert!(matches!(outside, Err(DispatchError::FloorOutOfRange { floor: 11, .. })));

        let deadline = Instant::now() + Duration::from_secs(3);
        while building
            .statuses()
            .iter()
            .any(|status| !status.pending_stops.is_empty())
        {
            assert!(Instant::now() < deadline, "cars never finished their calls");
            sleep(Duration::from_millis(1));
        }
        building.request_floor(basement, 1).unwrap();

        // Cleanup
        for (_, result) in building.shutdown() {
            assert_eq!(result, Ok(()));
        }
    }

    #[test]
    fn test_parse_config() {
        // Arrange
        let no_cars = TEST_CONFIG.replace("cars_per_zone = 2", "cars_per_zone = 0");
        let broken = TEST_CONFIG.replace("floors = 10", "floors = \"ten\"");

        // Act
        let config = parse_config(TEST_CONFIG).unwrap();

        // Assert
        assert_eq!(config.building.basements, 2);
        assert_eq!(config.car.door_dwell(), Duration::from_millis(5));
        assert!(matches!(parse_config(&no_cars), Err(DispatchError::NoCarsAvailable { .. })));
        assert!(matches!(parse_config(&broken), Err(DispatchError::InvalidConfig(_))));
    }
}
