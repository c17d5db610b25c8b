/*
 * Unit tests for the hall-call lamp registries
 *
 * The unit tests follows the Arrange, Act, Assert pattern.
 *
 * Tests:
 * - test_button_layout
 * - test_press_and_clear
 * - test_lamp_notifications
 */

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod registry_tests {
    use crate::call_buttons::{HallCallRegistry, HallLamps};
    use crate::shared::Direction::{Down, Up};
    use crate::shared::{ButtonState, DispatchError, Notification};
    use crate::topology::FloorRange;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_button_layout() {
        // Arrange
        let range = FloorRange::new(-2, 3).unwrap();
        let mut up = HallCallRegistry::new(range, Up);
        let mut down = HallCallRegistry::new(range, Down);

        // Act
        let top_up = up.press(3);
        let bottom_down = down.press(-2);
        let outside = up.press(7);

        // Assert
        assert_eq!(top_up, Err(DispatchError::FloorOutOfRange { floor: 3, min: -2, max: 2 }));
        assert_eq!(
            bottom_down,
            Err(DispatchError::FloorOutOfRange { floor: -2, min: -1, max: 3 })
        );
        assert!(outside.is_err());
        assert_eq!(up.press(-2), Ok(true));
        assert_eq!(down.press(3), Ok(true));
    }

    #[test]
    fn test_press_and_clear() {
        // Arrange
        let mut up = HallCallRegistry::new(FloorRange::new(1, 10).unwrap(), Up);

        // Act
        let first = up.press(4);
        let second = up.press(4);
        up.press(7).unwrap();
        let cleared = up.clear(4);
        let cleared_again = up.clear(4);

        // Assert
        assert_eq!(first, Ok(true));
        assert_eq!(second, Ok(false));
        assert!(cleared);
        assert!(!cleared_again);
        assert!(!up.is_on(4));
        assert!(up.is_on(7));
        assert_eq!(up.pending(), vec![7]);
        assert!(!up.clear(10));
    }

    #[test]
    fn test_lamp_notifications() {
        // Arrange
        let (notification_tx, notification_rx) = unbounded::<Notification>();
        let mut lamps = HallLamps::new('B', FloorRange::new(1, 5).unwrap(), notification_tx);

        // Act
        lamps.press(3, Up).unwrap();
        lamps.press(3, Up).unwrap();
        lamps.press(3, Down).unwrap();
        lamps.clear_both(3);

        // Assert
        let received: Vec<Notification> = notification_rx.try_iter().collect();
        assert_eq!(
            received,
            vec![
                Notification::LampChanged { zone: 'B', floor: 3, direction: Up, lamp: ButtonState::On },
                Notification::LampChanged { zone: 'B', floor: 3, direction: Down, lamp: ButtonState::On },
                Notification::LampChanged { zone: 'B', floor: 3, direction: Up, lamp: ButtonState::Off },
                Notification::LampChanged { zone: 'B', floor: 3, direction: Down, lamp: ButtonState::Off },
            ]
        );
        assert!(lamps.pending(Up).is_empty());
        assert!(!lamps.is_on(3, Down));
    }
}
