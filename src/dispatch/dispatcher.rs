/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::debug;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::{CarState, CarStatus, Direction, DispatchError, Floor, ZoneId};

/// Which candidate list the chosen car came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Moving in the requested direction and not yet past the floor.
    SameDirection,
    Idle,
    /// Moving but past the floor or heading the other way. Picks the call up after its current run.
    OtherDirection,
}

/**
 * Picks the car that answers a hall call at `floor` going `direction`.
 *
 * Cars on their way towards the floor in the requested direction win, then idle cars, then everything
 * else still running. Within a tier the nearest car wins and ties go to the first one in `cars`.
 * Stalled cars are never picked.
 *
 * Returns the index of the chosen car in `cars` together with the tier it came from.
 */
pub fn find_car(
    zone: ZoneId,
    floor: Floor,
    direction: Direction,
    cars: &[CarStatus],
) -> Result<(usize, Tier), DispatchError> {
    let mut same_direction = Vec::new();
    let mut idle = Vec::new();
    let mut other_direction = Vec::new();

    for (index, car) in cars.iter().enumerate() {
        if car.is_stalled() {
            continue;
        }
        let on_the_way = match (car.state, direction) {
            (CarState::MovingUp, Direction::Up) => car.floor <= floor,
            (CarState::MovingDown, Direction::Down) => car.floor >= floor,
            _ => false,
        };

        if on_the_way {
            same_direction.push(index);
        } else if car.state == CarState::Idle {
            idle.push(index);
        } else {
            other_direction.push(index);
        }
    }

    let tiers = [
        (Tier::SameDirection, same_direction),
        (Tier::Idle, idle),
        (Tier::OtherDirection, other_direction),
    ];
    for (tier, candidates) in tiers {
        if let Some(index) = nearest(floor, &candidates, cars) {
            debug!(
                "Zone {} call ({}, {}) goes to car {} ({:?})",
                zone, floor, direction, cars[index].id, tier
            );
            return Ok((index, tier));
        }
    }

    Err(DispatchError::NoCarsAvailable { zone })
}

/// First candidate with the smallest distance to `floor`.
fn nearest(floor: Floor, candidates: &[usize], cars: &[CarStatus]) -> Option<usize> {
    candidates
        .iter()
        .copied()
        .min_by_key(|index| (cars[*index].floor - floor).abs())
}
