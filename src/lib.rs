//! powermon - BMC hardware alarm monitor
//!
//! This library polls power supplies, voltage regulators and temperature
//! probes through lm-sensors, classifies every reading against its alarm
//! bounds and reports transitions to the system log.
//!
//! # Modules
//!
//! - [`alerts`]: Display names, events and notification channels
//! - [`cli`]: Command-line interface definitions
//! - [`commands`]: Command handlers
//! - [`config`]: Configuration system
//! - [`domain`]: Alarm records, devices and the report grammar
//! - [`error`]: Error types
//! - [`hw`]: Sensor tool and board I/O abstraction
//! - [`services`]: Registry, threshold resolver and poll loop

pub mod alerts;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod hw;
pub mod services;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::{AppError, Result};
