/* 3rd party libraries */
use anyhow::{anyhow, bail, Context};
use clap::{Arg, Command};
use crossbeam_channel as cbc;
use log::{debug, error, info, warn};
use std::io::{self, BufRead};
use std::path::Path;
use std::thread::Builder;

/* Custom libraries */
use zone_dispatch::car::{AlwaysClear, SafetySensor, SimulatedLoadCell, SimulatedObstruction};
use zone_dispatch::config;
use zone_dispatch::shared::{CarId, Direction, Floor, Notification};
use zone_dispatch::topology::Building;
use zone_dispatch::unwrap_or_exit;

/// One line typed on stdin.
#[derive(Debug, PartialEq)]
enum Input {
    Hall(Floor, Direction),
    Cab(CarId, Floor),
    Cancel(CarId, Floor),
    Status,
    Quit,
}

/* Main */
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = Command::new("zone_dispatch")
        .about("Dispatches hall calls to elevator cars across building zones")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .takes_value(true)
                .default_value("config.toml")
                .help("Path to the TOML configuration"),
        )
        .arg(
            Arg::new("simulate-sensors")
                .long("simulate-sensors")
                .help("Use randomised weight and obstruction sensors"),
        )
        .get_matches();

    // Load the configuration
    let config_path = matches.value_of("config").unwrap_or("config.toml");
    let config = unwrap_or_exit!(config::load_config(Path::new(config_path))
        .with_context(|| format!("could not load {}", config_path)));

    // Sensors for every car
    let simulate = matches.is_present("simulate-sensors");
    let max_payload_kg = config.car.max_payload_kg;
    let sensors = move |_car: CarId| -> (Box<dyn SafetySensor>, Box<dyn SafetySensor>) {
        if simulate {
            (
                Box::new(SimulatedLoadCell::new(max_payload_kg)),
                Box::new(SimulatedObstruction::new()),
            )
        } else {
            (Box::new(AlwaysClear), Box::new(AlwaysClear))
        }
    };

    // Start the notification logger
    let (notification_tx, notification_rx) = cbc::unbounded::<Notification>();
    let notification_thread = Builder::new().name("notifications".into());
    let _notification_logger =
        unwrap_or_exit!(notification_thread.spawn(move || log_notifications(notification_rx)));

    // Build the zones, which starts every car
    let building = unwrap_or_exit!(Building::new(
        &config.building,
        &config.car,
        &sensors,
        notification_tx
    ));

    info!("Ready. Commands: hall <floor> <up|down>, cab <zone> <car> <floor>, cancel <zone> <car> <floor>, status, quit");
    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Could not read stdin: {}", e);
                break;
            }
        };

        match parse_input(&line) {
            Ok(Some(Input::Quit)) => break,
            Ok(Some(input)) => {
                if let Err(e) = execute(&building, input) {
                    warn!("{:#}", e);
                }
            }
            Ok(None) => {}
            Err(e) => warn!("{:#}", e),
        }
    }

    for (car, result) in building.shutdown() {
        if let Err(e) = result {
            error!("Car {} ended with: {}", car, e);
        }
    }
}

fn execute(building: &Building, input: Input) -> anyhow::Result<()> {
    match input {
        Input::Hall(floor, direction) => {
            let car = building.request_elevator(floor, direction)?;
            info!("Car {} is coming to floor {}", car, floor);
        }
        Input::Cab(car, floor) => building.request_floor(car, floor)?,
        Input::Cancel(car, floor) => building.cancel_stop(car, floor)?,
        Input::Status => println!("{}", serde_json::to_string_pretty(&building.statuses())?),
        Input::Quit => {}
    }
    Ok(())
}

fn parse_input(line: &str) -> anyhow::Result<Option<Input>> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let input = match words.as_slice() {
        [] => return Ok(None),
        ["hall", floor, direction] => Input::Hall(parse_floor(floor)?, parse_direction(direction)?),
        ["cab", zone, car, floor] => Input::Cab(parse_car(zone, car)?, parse_floor(floor)?),
        ["cancel", zone, car, floor] => Input::Cancel(parse_car(zone, car)?, parse_floor(floor)?),
        ["status"] => Input::Status,
        ["quit"] | ["exit"] => Input::Quit,
        _ => bail!("unknown command: {}", line.trim()),
    };
    Ok(Some(input))
}

fn parse_floor(word: &str) -> anyhow::Result<Floor> {
    word.parse::<Floor>()
        .with_context(|| format!("{} is not a floor", word))
}

fn parse_direction(word: &str) -> anyhow::Result<Direction> {
    match word {
        "up" => Ok(Direction::Up),
        "down" => Ok(Direction::Down),
        _ => Err(anyhow!("direction must be up or down, got {}", word)),
    }
}

fn parse_car(zone: &str, number: &str) -> anyhow::Result<CarId> {
    let mut letters = zone.chars();
    let zone = match (letters.next(), letters.next()) {
        (Some(letter), None) => letter.to_ascii_uppercase(),
        _ => bail!("{} is not a zone letter", zone),
    };
    let number = number
        .parse::<u32>()
        .with_context(|| format!("{} is not a car number", number))?;
    Ok(CarId::new(zone, number))
}

fn log_notifications(notification_rx: cbc::Receiver<Notification>) {
    for notification in notification_rx.iter() {
        match notification {
            Notification::FloorChanged { car, floor } => {
                debug!("Displays of car {} show floor {}", car, floor)
            }
            Notification::DoorOpened { car, floor } => {
                debug!("Car {} doors are open at floor {}", car, floor)
            }
            Notification::DoorClosed { car, floor } => {
                debug!("Car {} doors are closed at floor {}", car, floor)
            }
            Notification::LampChanged { zone, floor, direction, lamp } => {
                debug!("Zone {} {} lamp at floor {}: {:?}", zone, direction, floor, lamp)
            }
            Notification::CabinButtonChanged { car, floor, lamp } => {
                debug!("Car {} button {}: {:?}", car, floor, lamp)
            }
            Notification::CarStalled { car, floor, error } => {
                error!("Car {} is stalled at floor {}: {}", car, floor, error)
            }
        }
    }
}

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod main_tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(
            parse_input("hall -2 up").unwrap(),
            Some(Input::Hall(-2, Direction::Up))
        );
        assert_eq!(
            parse_input("cab b 3 14").unwrap(),
            Some(Input::Cab(CarId::new('B', 3), 14))
        );
        assert_eq!(
            parse_input("cancel A 1 5").unwrap(),
            Some(Input::Cancel(CarId::new('A', 1), 5))
        );
        assert_eq!(parse_input("   ").unwrap(), None);
        assert_eq!(parse_input("quit").unwrap(), Some(Input::Quit));
        assert!(parse_input("hall 3 sideways").is_err());
        assert!(parse_input("cab AB 1 3").is_err());
        assert!(parse_input("fly 3").is_err());
    }
}
