//! Monitored device types
//!
//! Devices are identified by their lm-sensors chip name
//! (`<driver>-i2c-<bus>-<addr>`) and own their alarm records in a fixed
//! order so every poll visits them the same way.

use super::alarm::{AlarmRecord, ThresholdStyle};
use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// PSU measurements, in poll order
pub const PSU_RECORDS: [(&str, ThresholdStyle); 6] = [
    ("vin", ThresholdStyle::Bounds),
    ("vout1", ThresholdStyle::Bounds),
    ("pin", ThresholdStyle::Power),
    ("pout1", ThresholdStyle::Power),
    ("iin", ThresholdStyle::Bounds),
    ("iout1", ThresholdStyle::Bounds),
];

/// Voltage regulator measurements, in poll order
pub const REGULATOR_RECORDS: [(&str, ThresholdStyle); 2] = [
    ("Voltage", ThresholdStyle::Bounds),
    ("Current", ThresholdStyle::Bounds),
];

/// Temperature probe measurements
pub const PROBE_RECORDS: [(&str, ThresholdStyle); 1] = [("temp", ThresholdStyle::Temperature)];

/// Name of the PSU input-voltage record
pub const INPUT_VOLTAGE_RECORD: &str = "vin";

/// I2C location of a sensor chip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChipAddress {
    pub bus: u32,
    pub address: u8,
}

impl ChipAddress {
    pub const fn new(bus: u32, address: u8) -> Self {
        Self { bus, address }
    }
}

impl fmt::Display for ChipAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:04x}", self.bus, self.address)
    }
}

impl FromStr for ChipAddress {
    type Err = DomainError;

    /// Parse the address part of a chip name, e.g. `dps1100-i2c-27-58`
    fn from_str(chip: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::InvalidChipName(chip.to_string());

        let (_, location) = chip.split_once("-i2c-").ok_or_else(invalid)?;
        let (bus, address) = location.split_once('-').ok_or_else(invalid)?;

        let bus = bus.parse().map_err(|_| invalid())?;
        let address = u8::from_str_radix(address, 16).map_err(|_| invalid())?;

        Ok(Self { bus, address })
    }
}

/// Device class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    PowerSupply,
    VoltageRegulator,
    TemperatureProbe,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PowerSupply => write!(f, "PSU"),
            Self::VoltageRegulator => write!(f, "Regulator"),
            Self::TemperatureProbe => write!(f, "Temperature"),
        }
    }
}

/// Initialization state of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    /// Thresholds not read yet
    #[default]
    Uninitialized,
    /// Thresholds resolved from a successful read
    Ready,
}

/// Electrical input of a power supply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    Unknown,
    Ac,
    Dc,
}

impl InputType {
    /// Decode the PSU identification register
    pub fn from_register(value: u8) -> Self {
        match value {
            0x00 => Self::Ac,
            0x01 => Self::Dc,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "UNKNOWN"),
            Self::Ac => write!(f, "AC"),
            Self::Dc => write!(f, "DC"),
        }
    }
}

/// PSU status bits exposed by the board CPLD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PsuStatus {
    pub present: bool,
    pub power_good: bool,
    pub ac_ok: bool,
}

/// State shared by every device: identity and alarm records
#[derive(Debug, Clone, PartialEq)]
pub struct SensorChip {
    name: String,
    address: ChipAddress,
    display_name: Option<String>,
    state: DeviceState,
    records: Vec<AlarmRecord>,
}

impl SensorChip {
    /// Create a chip with one record per `(name, style)` entry
    pub fn new(name: &str, records: &[(&str, ThresholdStyle)]) -> Result<Self, DomainError> {
        let address = name.parse()?;
        Ok(Self {
            name: name.to_string(),
            address,
            display_name: None,
            state: DeviceState::Uninitialized,
            records: records
                .iter()
                .map(|(record, style)| AlarmRecord::new(*record, *style))
                .collect(),
        })
    }

    /// Builder: set a display name overriding the built-in tables
    pub fn with_display_name(mut self, display_name: Option<String>) -> Self {
        self.display_name = display_name;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> ChipAddress {
        self.address
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    pub fn mark_ready(&mut self) {
        self.state = DeviceState::Ready;
    }

    pub fn records(&self) -> &[AlarmRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [AlarmRecord] {
        &mut self.records
    }

    /// Find a record by measurement name
    pub fn record_mut(&mut self, name: &str) -> Option<&mut AlarmRecord> {
        self.records.iter_mut().find(|r| r.name() == name)
    }
}

/// Behavior common to every monitored device
pub trait Monitored {
    /// Device class
    fn kind(&self) -> DeviceKind;

    /// Identity and records
    fn chip(&self) -> &SensorChip;

    /// Mutable identity and records
    fn chip_mut(&mut self) -> &mut SensorChip;

    /// Whether the device should be read this cycle
    fn is_pollable(&self) -> bool {
        true
    }
}

/// Power supply unit with status gating and input-type detection
#[derive(Debug, Clone, PartialEq)]
pub struct PowerSupply {
    chip: SensorChip,
    label: String,
    cpld_index: u8,
    status: PsuStatus,
    input_type: Option<InputType>,
    pending_input: Option<(InputType, u32)>,
}

impl PowerSupply {
    /// Create a PSU from its chip name, slot label (`PSU1`) and CPLD index
    pub fn new(chip: &str, label: impl Into<String>, cpld_index: u8) -> Result<Self, DomainError> {
        Ok(Self {
            chip: SensorChip::new(chip, &PSU_RECORDS)?,
            label: label.into(),
            cpld_index,
            status: PsuStatus::default(),
            input_type: None,
            pending_input: None,
        })
    }

    /// Slot label used in log messages
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Index of the `psu_<n>_*` CPLD status files
    pub fn cpld_index(&self) -> u8 {
        self.cpld_index
    }

    pub fn status(&self) -> PsuStatus {
        self.status
    }

    pub fn set_status(&mut self, status: PsuStatus) {
        self.status = status;
    }

    /// Currently applied input type, `None` before the first detection
    pub fn input_type(&self) -> Option<InputType> {
        self.input_type
    }

    /// Count an observation of `observed` and tell whether it should now be
    /// applied.
    ///
    /// The first detection always applies. Afterwards a differing type must
    /// be observed `required` consecutive times.
    pub fn confirm_input_type(&mut self, observed: InputType, required: u32) -> bool {
        if self.input_type == Some(observed) {
            self.pending_input = None;
            return false;
        }
        if self.input_type.is_none() {
            return true;
        }

        let count = match self.pending_input {
            Some((pending, count)) if pending == observed => count + 1,
            _ => 1,
        };

        if count >= required.max(1) {
            true
        } else {
            self.pending_input = Some((observed, count));
            false
        }
    }

    /// Apply a detected input type, returning the previous one
    pub fn apply_input_type(&mut self, input_type: InputType) -> Option<InputType> {
        self.pending_input = None;
        self.input_type.replace(input_type)
    }
}

impl Monitored for PowerSupply {
    fn kind(&self) -> DeviceKind {
        DeviceKind::PowerSupply
    }

    fn chip(&self) -> &SensorChip {
        &self.chip
    }

    fn chip_mut(&mut self) -> &mut SensorChip {
        &mut self.chip
    }

    fn is_pollable(&self) -> bool {
        self.status.present && self.status.power_good
    }
}

/// Voltage regulator (VR controller) reporting voltage and current
#[derive(Debug, Clone, PartialEq)]
pub struct VoltageRegulator {
    chip: SensorChip,
}

impl VoltageRegulator {
    pub fn new(chip: &str, display_name: Option<String>) -> Result<Self, DomainError> {
        Ok(Self {
            chip: SensorChip::new(chip, &REGULATOR_RECORDS)?.with_display_name(display_name),
        })
    }
}

impl Monitored for VoltageRegulator {
    fn kind(&self) -> DeviceKind {
        DeviceKind::VoltageRegulator
    }

    fn chip(&self) -> &SensorChip {
        &self.chip
    }

    fn chip_mut(&mut self) -> &mut SensorChip {
        &mut self.chip
    }
}

/// Board temperature sensor
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureProbe {
    chip: SensorChip,
}

impl TemperatureProbe {
    pub fn new(chip: &str, display_name: Option<String>) -> Result<Self, DomainError> {
        Ok(Self {
            chip: SensorChip::new(chip, &PROBE_RECORDS)?.with_display_name(display_name),
        })
    }
}

impl Monitored for TemperatureProbe {
    fn kind(&self) -> DeviceKind {
        DeviceKind::TemperatureProbe
    }

    fn chip(&self) -> &SensorChip {
        &self.chip
    }

    fn chip_mut(&mut self) -> &mut SensorChip {
        &mut self.chip
    }
}

/// Any monitored device
#[derive(Debug, Clone, PartialEq)]
pub enum MonitoredDevice {
    PowerSupply(PowerSupply),
    VoltageRegulator(VoltageRegulator),
    TemperatureProbe(TemperatureProbe),
}

impl MonitoredDevice {
    /// Power supply view, if this device is one
    pub fn as_power_supply(&self) -> Option<&PowerSupply> {
        match self {
            Self::PowerSupply(psu) => Some(psu),
            _ => None,
        }
    }

    pub fn as_power_supply_mut(&mut self) -> Option<&mut PowerSupply> {
        match self {
            Self::PowerSupply(psu) => Some(psu),
            _ => None,
        }
    }

    fn inner(&self) -> &dyn Monitored {
        match self {
            Self::PowerSupply(d) => d,
            Self::VoltageRegulator(d) => d,
            Self::TemperatureProbe(d) => d,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Monitored {
        match self {
            Self::PowerSupply(d) => d,
            Self::VoltageRegulator(d) => d,
            Self::TemperatureProbe(d) => d,
        }
    }
}

impl Monitored for MonitoredDevice {
    fn kind(&self) -> DeviceKind {
        self.inner().kind()
    }

    fn chip(&self) -> &SensorChip {
        self.inner().chip()
    }

    fn chip_mut(&mut self) -> &mut SensorChip {
        self.inner_mut().chip_mut()
    }

    fn is_pollable(&self) -> bool {
        self.inner().is_pollable()
    }
}

impl From<PowerSupply> for MonitoredDevice {
    fn from(psu: PowerSupply) -> Self {
        Self::PowerSupply(psu)
    }
}

impl From<VoltageRegulator> for MonitoredDevice {
    fn from(vr: VoltageRegulator) -> Self {
        Self::VoltageRegulator(vr)
    }
}

impl From<TemperatureProbe> for MonitoredDevice {
    fn from(probe: TemperatureProbe) -> Self {
        Self::TemperatureProbe(probe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chip_address_parse() {
        let addr: ChipAddress = "dps1100-i2c-27-58".parse().unwrap();
        assert_eq!(addr, ChipAddress::new(27, 0x58));

        let addr: ChipAddress = "tmp75-i2c-7-4d".parse().unwrap();
        assert_eq!(addr, ChipAddress::new(7, 0x4d));
        assert_eq!(addr.to_string(), "7-004d");
    }

    #[test]
    fn test_chip_address_invalid() {
        assert!("dps1100".parse::<ChipAddress>().is_err());
        assert!("dps1100-i2c-27".parse::<ChipAddress>().is_err());
        assert!("dps1100-i2c-x-58".parse::<ChipAddress>().is_err());
        assert!("dps1100-i2c-27-zz".parse::<ChipAddress>().is_err());
    }

    #[test]
    fn test_input_type_from_register() {
        assert_eq!(InputType::from_register(0x00), InputType::Ac);
        assert_eq!(InputType::from_register(0x01), InputType::Dc);
        assert_eq!(InputType::from_register(0x02), InputType::Unknown);
        assert_eq!(InputType::from_register(0xff), InputType::Unknown);
    }

    #[test]
    fn test_psu_records_in_order() {
        let psu = PowerSupply::new("dps1100-i2c-27-58", "PSU1", 4).unwrap();
        let names: Vec<&str> = psu.chip().records().iter().map(|r| r.name()).collect();
        assert_eq!(names, ["vin", "vout1", "pin", "pout1", "iin", "iout1"]);
        assert_eq!(psu.chip().state(), DeviceState::Uninitialized);
    }

    #[test]
    fn test_psu_pollable_requires_presence_and_power() {
        let mut psu = PowerSupply::new("dps1100-i2c-27-58", "PSU1", 4).unwrap();
        assert!(!psu.is_pollable());

        psu.set_status(PsuStatus {
            present: true,
            power_good: false,
            ac_ok: true,
        });
        assert!(!psu.is_pollable());

        psu.set_status(PsuStatus {
            present: true,
            power_good: true,
            ac_ok: false,
        });
        assert!(psu.is_pollable());
    }

    #[test]
    fn test_input_type_first_detection_applies() {
        let mut psu = PowerSupply::new("dps1100-i2c-27-58", "PSU1", 4).unwrap();
        assert!(psu.confirm_input_type(InputType::Ac, 3));
        assert_eq!(psu.apply_input_type(InputType::Ac), None);
        assert!(!psu.confirm_input_type(InputType::Ac, 3));
    }

    #[test]
    fn test_input_type_debounce() {
        let mut psu = PowerSupply::new("dps1100-i2c-27-58", "PSU1", 4).unwrap();
        psu.apply_input_type(InputType::Ac);

        assert!(!psu.confirm_input_type(InputType::Dc, 3));
        assert!(!psu.confirm_input_type(InputType::Dc, 3));
        // A flicker back to the applied type resets the count
        assert!(!psu.confirm_input_type(InputType::Ac, 3));
        assert!(!psu.confirm_input_type(InputType::Dc, 3));
        assert!(!psu.confirm_input_type(InputType::Dc, 3));
        assert!(psu.confirm_input_type(InputType::Dc, 3));
        assert_eq!(psu.apply_input_type(InputType::Dc), Some(InputType::Ac));
    }

    #[test]
    fn test_input_type_without_debounce() {
        let mut psu = PowerSupply::new("dps1100-i2c-27-58", "PSU1", 4).unwrap();
        psu.apply_input_type(InputType::Ac);
        assert!(psu.confirm_input_type(InputType::Dc, 1));
    }

    #[test]
    fn test_monitored_device_dispatch() {
        let device: MonitoredDevice = VoltageRegulator::new("ir3584-i2c-4-15", None).unwrap().into();
        assert_eq!(device.kind(), DeviceKind::VoltageRegulator);
        assert_eq!(device.chip().records().len(), 2);
        assert!(device.is_pollable());
        assert!(device.as_power_supply().is_none());

        let device: MonitoredDevice = TemperatureProbe::new("tmp75-i2c-7-4d", None).unwrap().into();
        assert_eq!(device.kind(), DeviceKind::TemperatureProbe);
        assert_eq!(device.chip().records()[0].name(), "temp");
    }
}
