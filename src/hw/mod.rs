//! Hardware access layer
//!
//! Wraps the external sensor tool, the board CPLD status files, the PSU
//! identification register and the hwmon threshold files behind traits so
//! the monitor can run against in-memory fakes.

pub mod board;
pub mod command;
pub mod sensors;
pub mod traits;

pub use board::SysfsBoard;
pub use sensors::LmSensors;
pub use traits::{BoardIo, SensorSource};
