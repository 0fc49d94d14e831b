//! Poll loop
//!
//! Single-threaded scheduler: every cycle visits each device in registry
//! order and each record in declared order, read → update → classify →
//! report. A failing device never aborts the cycle.

use super::registry::Registry;
use super::resolver::ThresholdResolver;
use super::snapshot::StateSnapshot;
use crate::alerts::{names, AlarmEvent, AlarmReporter, AlertSeverity, EventKind, NotificationManager};
use crate::config::Config;
use crate::domain::{report, DeviceState, InputType, Monitored, MonitoredDevice, PowerSupply};
use crate::error::{AppError, Result};
use crate::hw::{BoardIo, SensorSource};

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Configuration for the monitor
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Interval between poll cycles
    pub interval: Duration,
    /// Whether to exit after one cycle
    pub single_use: bool,
    /// JSON snapshot written after every cycle
    pub state_file: Option<PathBuf>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(600),
            single_use: false,
            state_file: None,
        }
    }
}

impl From<&Config> for MonitorConfig {
    fn from(config: &Config) -> Self {
        Self {
            interval: config.general.interval(),
            single_use: config.general.single_use,
            state_file: config.general.state_file.clone(),
        }
    }
}

/// What happened to one device during a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Polled,
    /// PSU absent or without output power
    Skipped,
    /// Sensor tool returned nothing
    Unreachable,
}

/// Counters for one poll cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub cycle: u64,
    pub polled: usize,
    pub skipped: usize,
    pub unreachable: usize,
    /// Events emitted during the cycle
    pub events: usize,
    /// Records with an open alarm after the cycle
    pub failing: usize,
}

/// Alarm monitor over a sensor source and board
pub struct Monitor<S, B> {
    config: MonitorConfig,
    registry: Registry,
    resolver: ThresholdResolver,
    reporter: AlarmReporter,
    sensors: S,
    board: B,
    cycles: u64,
}

impl<S: SensorSource, B: BoardIo> Monitor<S, B> {
    pub fn new(
        config: MonitorConfig,
        registry: Registry,
        resolver: ThresholdResolver,
        reporter: AlarmReporter,
        sensors: S,
        board: B,
    ) -> Self {
        Self {
            config,
            registry,
            resolver,
            reporter,
            sensors,
            board,
            cycles: 0,
        }
    }

    /// Build a monitor for the board described by `config`
    pub fn from_config(config: &Config, sensors: S, board: B) -> Result<Self> {
        let registry = Registry::from_config(config)?;
        if registry.is_empty() {
            return Err(AppError::NoDevices);
        }

        let notifications = if config.general.syslog {
            NotificationManager::system()
        } else {
            NotificationManager::default()
        };

        Ok(Self::new(
            MonitorConfig::from(config),
            registry,
            ThresholdResolver::new(config.input_voltage.clone(), config.general.dry_run),
            AlarmReporter::new(notifications, config.general.history_size),
            sensors,
            board,
        ))
    }

    /// Read every device once and resolve its thresholds.
    ///
    /// Returns the number of devices that are ready. The rest are retried on
    /// every following cycle.
    pub fn initialize(&mut self) -> usize {
        let Self {
            ref mut registry,
            ref resolver,
            ref mut reporter,
            ref sensors,
            ref board,
            ..
        } = *self;

        let mut ready = 0;
        for device in registry.devices_mut() {
            if let Some(psu) = device.as_power_supply_mut() {
                if refresh_psu_status(board, psu, reporter).is_none() || !psu.is_pollable() {
                    continue;
                }
                resolver.detect_input_type(board, psu, reporter);
            }
            if !device.is_pollable() {
                continue;
            }

            let chip = device.chip_mut();
            match sensors.read(chip.name()) {
                Some(report) => {
                    resolver.resolve(chip, &report);
                    ready += 1;
                }
                None => log::warn!("{} init failed, will retry", chip.name()),
            }
        }

        log::info!("Initialized {}/{} devices", ready, registry.len());
        ready
    }

    /// Run one poll cycle over every device
    pub fn run_cycle(&mut self) -> CycleSummary {
        self.cycles += 1;
        let mut summary = CycleSummary {
            cycle: self.cycles,
            ..CycleSummary::default()
        };

        let Self {
            ref mut registry,
            ref resolver,
            ref mut reporter,
            ref sensors,
            ref board,
            ..
        } = *self;

        for device in registry.devices_mut() {
            let (outcome, events) = poll_device(device, resolver, reporter, sensors, board);
            summary.events += events;
            match outcome {
                Outcome::Polled => summary.polled += 1,
                Outcome::Skipped => summary.skipped += 1,
                Outcome::Unreachable => summary.unreachable += 1,
            }
        }

        summary.failing = self
            .registry
            .devices()
            .iter()
            .flat_map(|d| d.chip().records())
            .filter(|r| r.is_failing())
            .count();

        log::debug!(
            "Cycle {}: {} polled, {} skipped, {} unreachable, {} failing",
            summary.cycle,
            summary.polled,
            summary.skipped,
            summary.unreachable,
            summary.failing
        );
        summary
    }

    /// Run the poll loop until the process is stopped (or once in
    /// single-use mode)
    pub fn run(&mut self) -> Result<()> {
        self.initialize();

        loop {
            self.run_cycle();

            if let Some(path) = self.config.state_file.clone() {
                if let Err(e) = self.write_state(&path) {
                    log::warn!("Failed to write state file {}: {}", path.display(), e);
                }
            }

            if self.config.single_use {
                log::info!("Single-use mode: exiting after one cycle");
                break;
            }

            std::thread::sleep(self.config.interval);
        }

        Ok(())
    }

    /// Current state for the query interface
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            cycle: self.cycles,
            timestamp: SystemTime::now(),
            devices: self.registry.snapshot(),
            events: self.reporter.history().cloned().collect(),
        }
    }

    /// Write the current snapshot as JSON
    pub fn write_state(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.snapshot())
            .map_err(crate::error::ConfigError::from)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn reporter(&self) -> &AlarmReporter {
        &self.reporter
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }
}

/// Poll one device; returns the outcome and the number of events emitted
fn poll_device<S: SensorSource, B: BoardIo>(
    device: &mut MonitoredDevice,
    resolver: &ThresholdResolver,
    reporter: &mut AlarmReporter,
    sensors: &S,
    board: &B,
) -> (Outcome, usize) {
    let mut events = 0;
    let mut changed_input: Option<InputType> = None;

    if let Some(psu) = device.as_power_supply_mut() {
        let Some(status_events) = refresh_psu_status(board, psu, reporter) else {
            return (Outcome::Skipped, events);
        };
        events += status_events;
        if !psu.is_pollable() {
            log::debug!("{}: not present or not powered, skipping", psu.label());
            return (Outcome::Skipped, events);
        }
        changed_input = resolver.detect_input_type(board, psu, reporter);
        events += usize::from(changed_input.is_some());
    }

    let Some(report) = sensors.read(device.chip().name()) else {
        log::debug!("{}: unreachable this cycle", device.chip().name());
        if let (Some(input_type), Some(psu)) = (changed_input, device.as_power_supply_mut()) {
            resolver.apply_table_bounds(psu, input_type);
        }
        return (Outcome::Unreachable, events);
    };

    if changed_input.is_some() || device.chip().state() == DeviceState::Uninitialized {
        resolver.resolve(device.chip_mut(), &report);
    }

    let view: &MonitoredDevice = device;
    let display_names: Vec<String> = view
        .chip()
        .records()
        .iter()
        .map(|record| names::display_name(view, record.name()))
        .collect();

    for (record, name) in device.chip_mut().records_mut().iter_mut().zip(display_names) {
        record.update_value(report::match_line(&report, record.name()).unwrap_or(""));
        let classification = record.classify();
        if reporter.report(&name, record, classification).is_some() {
            events += 1;
        }
    }

    (Outcome::Polled, events)
}

/// Refresh the CPLD status bits of a PSU and report transitions.
///
/// Returns the number of events emitted, or `None` when the bits cannot be
/// read; the PSU must then be skipped for the cycle.
fn refresh_psu_status<B: BoardIo>(
    board: &B,
    psu: &mut PowerSupply,
    reporter: &mut AlarmReporter,
) -> Option<usize> {
    let current = match board.psu_status(psu.cpld_index()) {
        Ok(status) => status,
        Err(e) => {
            log::warn!("{}: status read failed, skipping: {}", psu.label(), e);
            return None;
        }
    };
    let previous = psu.status();
    psu.set_status(current);

    let label = psu.label().to_string();
    let mut events = Vec::new();

    if current.present != previous.present {
        let state = if current.present { "present" } else { "absent" };
        events.push(AlarmEvent::new(
            AlertSeverity::Info,
            EventKind::PsuStatus,
            label.as_str(),
            format!("{} is {}", label, state),
        ));
    }

    let bits = [
        (previous.power_good, current.power_good, "Output Voltage"),
        (previous.ac_ok, current.ac_ok, "Input Voltage"),
    ];
    for (was, is, quantity) in bits {
        if was == is {
            continue;
        }
        let (severity, state) = if is {
            (AlertSeverity::Warning, "NORMAL")
        } else {
            (AlertSeverity::Critical, "ABNORMAL")
        };
        events.push(AlarmEvent::new(
            severity,
            EventKind::PsuStatus,
            label.as_str(),
            format!("{} {} status is {}", label, quantity, state),
        ));
    }

    let count = events.len();
    for event in events {
        reporter.emit(event);
    }
    Some(count)
}
