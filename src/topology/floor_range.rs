/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Serialize;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::{Direction, DispatchError, Floor};

/**
 * Inclusive range of floors served by a zone.
 *
 * Floor 0 never exists: stepping down from 1 lands on -1 and stepping up from -1 lands on 1.
 */
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloorRange {
    pub min: Floor,
    pub max: Floor,
}

impl FloorRange {
    pub fn new(min: Floor, max: Floor) -> Result<FloorRange, DispatchError> {
        if min > max || min == 0 || max == 0 {
            return Err(DispatchError::InvalidConfig(format!(
                "[{}, {}] is not a valid floor range",
                min, max
            )));
        }
        Ok(FloorRange { min, max })
    }

    pub fn contains(&self, floor: Floor) -> bool {
        floor != 0 && self.min <= floor && floor <= self.max
    }

    pub fn check(&self, floor: Floor) -> Result<(), DispatchError> {
        if self.contains(floor) {
            Ok(())
        } else {
            Err(DispatchError::FloorOutOfRange {
                floor,
                min: self.min,
                max: self.max,
            })
        }
    }

    /// Next floor in `direction`, or `None` at the edge of the range.
    pub fn step(&self, floor: Floor, direction: Direction) -> Option<Floor> {
        let next = match direction {
            Direction::Up if floor == -1 => 1,
            Direction::Up => floor + 1,
            Direction::Down if floor == 1 => -1,
            Direction::Down => floor - 1,
        };
        if self.contains(next) {
            Some(next)
        } else {
            None
        }
    }

    pub fn floors(&self) -> impl Iterator<Item = Floor> {
        (self.min..=self.max).filter(|floor| *floor != 0)
    }

    pub fn len(&self) -> usize {
        self.floors().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod floor_range_tests {
    use super::FloorRange;
    use crate::shared::Direction::{Down, Up};
    use crate::shared::DispatchError;

    #[test]
    fn test_step_skips_floor_zero() {
        let range = FloorRange::new(-3, 5).unwrap();

        assert_eq!(range.step(-1, Up), Some(1));
        assert_eq!(range.step(1, Down), Some(-1));
        assert_eq!(range.step(5, Up), None);
        assert_eq!(range.step(-3, Down), None);
    }

    #[test]
    fn test_floors_and_bounds() {
        let range = FloorRange::new(-2, 3).unwrap();

        assert_eq!(range.floors().collect::<Vec<_>>(), vec![-2, -1, 1, 2, 3]);
        assert_eq!(range.len(), 5);
        assert!(!range.contains(0));
        assert_eq!(
            range.check(4),
            Err(DispatchError::FloorOutOfRange { floor: 4, min: -2, max: 3 })
        );
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(FloorRange::new(5, 1).is_err());
        assert!(FloorRange::new(0, 4).is_err());
    }
}
