//! Configuration system
//!
//! Handles TOML config file parsing and CLI argument merging. The defaults
//! describe the reference switch board: four PSUs, twenty voltage
//! regulators and eleven temperature probes.

pub mod builder;
pub mod file;

pub use builder::ConfigBuilder;
pub use file::ConfigFile;

use crate::alerts::DEFAULT_HISTORY_SIZE;
use crate::domain::{ChipAddress, InputType};
use crate::error::ConfigError;
use crate::hw::board::{DEFAULT_CPLD_ROOT, DEFAULT_HWMON_ROOT, DEFAULT_I2CGET_BIN};
use crate::hw::sensors::DEFAULT_SENSORS_BIN;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,
    /// Tool and sysfs locations
    pub paths: PathsConfig,
    /// PSU input-type detection and input-voltage thresholds
    pub input_voltage: InputVoltageConfig,
    /// Power supplies, in poll order
    #[serde(rename = "psu")]
    pub psus: Vec<PsuConfig>,
    /// Voltage regulators, in poll order
    #[serde(rename = "regulator")]
    pub regulators: Vec<ChipConfig>,
    /// Temperature probes, in poll order
    #[serde(rename = "temperature")]
    pub temperatures: Vec<ChipConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            paths: PathsConfig::default(),
            input_voltage: InputVoltageConfig::default(),
            psus: default_psus(),
            regulators: default_regulators(),
            temperatures: default_temperatures(),
        }
    }
}

impl Config {
    /// Check values that cannot be expressed by the TOML types alone
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.general.interval_seconds == 0 {
            return Err(invalid("general.interval_seconds", "must be at least 1"));
        }
        if self.general.read_timeout_ms == 0 {
            return Err(invalid("general.read_timeout_ms", "must be at least 1"));
        }
        if self.input_voltage.debounce == 0 {
            return Err(invalid("input_voltage.debounce", "must be at least 1"));
        }
        self.input_voltage.ac.validate("input_voltage.ac")?;
        self.input_voltage.dc.validate("input_voltage.dc")?;

        let mut seen = HashSet::new();
        let chips = self
            .psus
            .iter()
            .map(|p| p.chip.as_str())
            .chain(self.regulators.iter().map(|r| r.chip.as_str()))
            .chain(self.temperatures.iter().map(|t| t.chip.as_str()));

        for chip in chips {
            chip.parse::<ChipAddress>()
                .map_err(|e| invalid("chip", &e.to_string()))?;
            if !seen.insert(chip) {
                return Err(invalid("chip", &format!("'{}' is listed twice", chip)));
            }
        }

        for psu in &self.psus {
            if psu.label.trim().is_empty() {
                return Err(invalid("psu.label", &format!("empty label for {}", psu.chip)));
            }
        }

        Ok(())
    }

    /// Number of configured devices
    pub fn device_count(&self) -> usize {
        self.psus.len() + self.regulators.len() + self.temperatures.len()
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,
    /// Log firmware threshold writes instead of performing them
    pub dry_run: bool,
    /// Poll interval in seconds
    pub interval_seconds: u64,
    /// Deadline for each external command in milliseconds
    pub read_timeout_ms: u64,
    /// Run a single poll cycle and exit
    pub single_use: bool,
    /// JSON snapshot written after every cycle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,
    /// Number of events kept in memory
    pub history_size: usize,
    /// Also send alarm events to the local syslog daemon
    pub syslog: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            dry_run: false,
            interval_seconds: 600,
            read_timeout_ms: 3000,
            single_use: false,
            state_file: None,
            history_size: DEFAULT_HISTORY_SIZE,
            syslog: true,
        }
    }
}

impl GeneralConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Tool and sysfs locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub sensors_bin: PathBuf,
    pub i2cget_bin: PathBuf,
    /// Directory holding the CPLD `psu_<n>_*` status files
    pub cpld_root: PathBuf,
    /// Directory holding `<bus>-00<addr>` i2c device nodes
    pub hwmon_root: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            sensors_bin: PathBuf::from(DEFAULT_SENSORS_BIN),
            i2cget_bin: PathBuf::from(DEFAULT_I2CGET_BIN),
            cpld_root: PathBuf::from(DEFAULT_CPLD_ROOT),
            hwmon_root: PathBuf::from(DEFAULT_HWMON_ROOT),
        }
    }
}

/// Firmware threshold pair in milli-units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdPair {
    pub min: i64,
    pub max: i64,
}

impl ThresholdPair {
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    fn validate(&self, key: &str) -> Result<(), ConfigError> {
        if self.min >= self.max {
            return Err(invalid(
                key,
                &format!("min {} must be below max {}", self.min, self.max),
            ));
        }
        Ok(())
    }
}

/// PSU input-type detection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputVoltageConfig {
    /// Identification register read with `i2cget`
    pub register: u8,
    /// Consecutive observations required before a new type is applied
    pub debounce: u32,
    pub min_channel: String,
    pub max_channel: String,
    /// Thresholds for AC input, also used when the type is unknown
    pub ac: ThresholdPair,
    /// Thresholds for DC input
    pub dc: ThresholdPair,
}

impl Default for InputVoltageConfig {
    fn default() -> Self {
        Self {
            register: 0xd8,
            debounce: 1,
            min_channel: "in1_min".to_string(),
            max_channel: "in1_max".to_string(),
            ac: ThresholdPair::new(90_000, 264_000),
            dc: ThresholdPair::new(200_000, 280_000),
        }
    }
}

impl InputVoltageConfig {
    /// Threshold pair written for an input type
    pub fn pair(&self, input_type: InputType) -> ThresholdPair {
        match input_type {
            InputType::Dc => self.dc,
            InputType::Ac | InputType::Unknown => self.ac,
        }
    }
}

/// One power supply slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PsuConfig {
    /// Sensor chip name, e.g. `dps1100-i2c-27-58`
    pub chip: String,
    /// Slot label used in messages, e.g. `PSU1`
    pub label: String,
    /// Index of the CPLD `psu_<n>_*` files
    pub cpld_index: u8,
}

/// A regulator or temperature probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipConfig {
    pub chip: String,
    /// Overrides the built-in name tables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl ChipConfig {
    fn named(chip: &str) -> Self {
        Self {
            chip: chip.to_string(),
            display_name: None,
        }
    }
}

const PSU_BUSES: [u32; 4] = [27, 26, 25, 24];

const REGULATOR_CHIPS: [&str; 20] = [
    "ir3584-i2c-4-15",
    "ir3584-i2c-4-16",
    "ir38062-i2c-4-42",
    "ir3584-i2c-16-70",
    "ir38062-i2c-16-49",
    "ir38060-i2c-17-45",
    "ir38062-i2c-17-49",
    "ir3584-i2c-19-30",
    "ir3584-i2c-19-50",
    "ir3584-i2c-19-70",
    "ir3584-i2c-20-50",
    "ir3584-i2c-20-70",
    "ir38060-i2c-20-45",
    "ir3584-i2c-21-30",
    "ir3584-i2c-21-50",
    "ir3584-i2c-21-70",
    "ir3584-i2c-22-50",
    "ir3584-i2c-22-70",
    "ir38060-i2c-22-45",
    "ir38060-i2c-23-45",
];

const TEMPERATURE_CHIPS: [&str; 11] = [
    "tmp75-i2c-7-4d",
    "tmp75-i2c-7-4e",
    "tmp75-i2c-7-4f",
    "tmp75-i2c-31-48",
    "tmp75-i2c-31-49",
    "tmp75-i2c-39-48",
    "tmp75-i2c-39-49",
    "tmp75-i2c-42-48",
    "tmp75-i2c-42-49",
    "tmp75-i2c-43-48",
    "tmp75-i2c-43-49",
];

/// PSU1 sits on bus 27 and is wired to the highest CPLD index
fn default_psus() -> Vec<PsuConfig> {
    PSU_BUSES
        .iter()
        .enumerate()
        .map(|(i, bus)| PsuConfig {
            chip: format!("dps1100-i2c-{}-58", bus),
            label: format!("PSU{}", i + 1),
            cpld_index: (PSU_BUSES.len() - i) as u8,
        })
        .collect()
}

fn default_regulators() -> Vec<ChipConfig> {
    REGULATOR_CHIPS.iter().copied().map(ChipConfig::named).collect()
}

fn default_temperatures() -> Vec<ChipConfig> {
    TEMPERATURE_CHIPS.iter().copied().map(ChipConfig::named).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.interval_seconds, 600);
        assert_eq!(config.general.read_timeout(), Duration::from_secs(3));
        assert_eq!(config.psus.len(), 4);
        assert_eq!(config.regulators.len(), 20);
        assert_eq!(config.temperatures.len(), 11);
        assert_eq!(config.device_count(), 35);
        config.validate().unwrap();
    }

    #[test]
    fn test_syslog_can_be_disabled() {
        assert!(Config::default().general.syslog);

        let config: Config = toml::from_str("[general]\nsyslog = false").unwrap();
        assert!(!config.general.syslog);
        assert_eq!(config.general.interval_seconds, 600);
    }

    #[test]
    fn test_default_psu_layout() {
        let config = Config::default();
        assert_eq!(
            config.psus[0],
            PsuConfig {
                chip: "dps1100-i2c-27-58".to_string(),
                label: "PSU1".to_string(),
                cpld_index: 4,
            }
        );
        assert_eq!(config.psus[3].chip, "dps1100-i2c-24-58");
        assert_eq!(config.psus[3].cpld_index, 1);
    }

    #[test]
    fn test_input_voltage_tables() {
        let iv = InputVoltageConfig::default();
        assert_eq!(iv.pair(InputType::Ac), ThresholdPair::new(90_000, 264_000));
        assert_eq!(iv.pair(InputType::Dc), ThresholdPair::new(200_000, 280_000));
        assert_eq!(iv.pair(InputType::Unknown), iv.ac);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [general]
            interval_seconds = 30

            [[psu]]
            chip = "dps1100-i2c-27-58"
            label = "PSU1"
            cpld_index = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.general.interval_seconds, 30);
        assert_eq!(config.general.read_timeout_ms, 3000);
        assert_eq!(config.psus.len(), 1);
        assert_eq!(config.regulators.len(), 20);
        assert_eq!(config.input_voltage.register, 0xd8);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.general.interval_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.input_voltage.dc = ThresholdPair::new(280_000, 200_000);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.regulators.push(ChipConfig::named("ir3584"));
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.temperatures.push(ChipConfig::named("tmp75-i2c-7-4d"));
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.input_voltage.debounce = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = Config::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.psus, config.psus);
        assert_eq!(parsed.regulators.len(), 20);
    }
}
