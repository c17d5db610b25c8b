//! Dispatch and motion control for a multi-car, multi-zone elevator installation.
//!
//! A [`zone::Zone`] owns a bank of cars and the hall-call lamps of its floors. Hall calls are
//! dispatched to one car by [`dispatch::find_car`]; each [`car::Car`] runs its own motion loop on a
//! thread and is reached through a [`car::CarHandle`]. [`topology::Building`] splits a building's
//! floors into zones.

pub mod call_buttons;
pub mod car;
pub mod config;
pub mod dispatch;
pub mod shared;
pub mod topology;
pub mod zone;
