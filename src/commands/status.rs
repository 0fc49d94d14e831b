//! Status command implementation
//!
//! Polls every device once, without writing thresholds or logging alarm
//! events, and prints the resulting state. Alternatively shows a snapshot
//! saved by a running monitor.

use crate::alerts::{AlarmReporter, NotificationManager};
use crate::cli::args::{OutputFormat, StatusArgs};
use crate::cli::output::print_output;
use crate::config::Config;
use crate::error::{AppError, ConfigError, Result};
use crate::hw::{BoardIo, SensorSource};
use crate::services::{Monitor, MonitorConfig, Registry, StateSnapshot, ThresholdResolver};

use std::path::Path;

/// Execute the status command
pub fn run_status(args: &StatusArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let mut snapshot = match &args.state {
        Some(path) => load_state(path)?,
        None => {
            let (sensors, board) = super::hardware(config);
            poll_once(config, sensors, board)?
        }
    };

    if args.failing {
        retain_failing(&mut snapshot);
    }

    print_output(&snapshot, format)?;
    Ok(())
}

/// One silent, dry-run poll cycle
pub fn poll_once<S: SensorSource, B: BoardIo>(
    config: &Config,
    sensors: S,
    board: B,
) -> Result<StateSnapshot> {
    let registry = Registry::from_config(config)?;
    if registry.is_empty() {
        return Err(AppError::NoDevices);
    }

    let mut monitor = Monitor::new(
        MonitorConfig {
            single_use: true,
            state_file: None,
            ..MonitorConfig::from(config)
        },
        registry,
        ThresholdResolver::new(config.input_voltage.clone(), true),
        AlarmReporter::new(NotificationManager::new(), config.general.history_size),
        sensors,
        board,
    );

    monitor.initialize();
    monitor.run_cycle();
    Ok(monitor.snapshot())
}

fn load_state(path: &Path) -> Result<StateSnapshot> {
    let text = std::fs::read_to_string(path)
        .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;
    let snapshot: StateSnapshot = serde_json::from_str(&text).map_err(ConfigError::from)?;
    Ok(snapshot)
}

fn retain_failing(snapshot: &mut StateSnapshot) {
    for device in &mut snapshot.devices {
        device.records.retain(|r| r.failing);
    }
    snapshot.devices.retain(|d| !d.records.is_empty());
}
