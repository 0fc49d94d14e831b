//! Mock implementations for testing
//!
//! Provides in-memory sensor reports and board I/O for unit testing without
//! real hardware.

use crate::domain::{ChipAddress, PsuStatus};
use crate::error::HwError;
use crate::hw::{BoardIo, SensorSource};

use std::collections::HashMap;
use std::sync::Mutex;

/// PSU status with every bit healthy
pub const PSU_OK: PsuStatus = PsuStatus {
    present: true,
    power_good: true,
    ac_ok: true,
};

/// Build a PSU report in the sensor tool's layout
pub fn psu_report(chip: &str, vin: f64, vin_min: f64, vin_max: f64) -> String {
    format!(
        "{chip}
Adapter: i2c-27
vin:         +{vin:.2} V  (crit min = +{vin_min:.2} V, crit max = +{vin_max:.2} V)
vout1:        +12.03 V  (crit min = +10.80 V, crit max = +13.20 V)
pin:         138.00 W  (max =   1.10 kW)
pout1:       120.00 W  (max =   1.00 kW)
iin:           +0.62 A  (max =  +7.00 A)
iout1:        +10.00 A  (max = +91.67 A)
"
    )
}

/// Build a voltage regulator report
pub fn regulator_report(chip: &str, voltage: f64, current: f64) -> String {
    format!(
        "{chip}
Adapter: i2c-4
Voltage:      +{voltage:.2} V  (crit min = +1.60 V, crit max = +2.00 V)
Current:      +{current:.2} A  (crit min = +0.00 A, crit max = +100.00 A)
"
    )
}

/// Build a temperature probe report
pub fn probe_report(chip: &str, temp: f64, high: f64, hyst: f64) -> String {
    format!(
        "{chip}
Adapter: i2c-7
temp1:        +{temp:.1}°C  (high = +{high:.1}°C, hyst = +{hyst:.1}°C)
"
    )
}

/// Mock sensor tool keyed by chip name
#[derive(Debug, Default)]
pub struct MockSensors {
    reports: Mutex<HashMap<String, String>>,
    reads: Mutex<Vec<String>>,
}

impl MockSensors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: serve `report` for `chip`
    pub fn with_report(self, chip: &str, report: impl Into<String>) -> Self {
        self.set_report(chip, report);
        self
    }

    /// Replace the report served for `chip`
    pub fn set_report(&self, chip: &str, report: impl Into<String>) {
        self.reports
            .lock()
            .unwrap()
            .insert(chip.to_string(), report.into());
    }

    /// Make `chip` unreachable
    pub fn remove_report(&self, chip: &str) {
        self.reports.lock().unwrap().remove(chip);
    }

    /// Number of reads issued for `chip`
    pub fn read_count(&self, chip: &str) -> usize {
        self.reads.lock().unwrap().iter().filter(|c| *c == chip).count()
    }
}

impl SensorSource for MockSensors {
    fn read(&self, chip: &str) -> Option<String> {
        self.reads.lock().unwrap().push(chip.to_string());
        self.reports.lock().unwrap().get(chip).cloned()
    }
}

/// A recorded firmware threshold write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdWrite {
    pub address: ChipAddress,
    pub channel: String,
    pub value: i64,
}

/// Mock board with settable PSU bits and registers
#[derive(Debug, Default)]
pub struct MockBoard {
    statuses: Mutex<HashMap<u8, PsuStatus>>,
    registers: Mutex<HashMap<(ChipAddress, u8), u8>>,
    writes: Mutex<Vec<ThresholdWrite>>,
}

impl MockBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the status bits of PSU `index`
    pub fn with_psu(self, index: u8, status: PsuStatus) -> Self {
        self.set_psu_status(index, status);
        self
    }

    pub fn set_psu_status(&self, index: u8, status: PsuStatus) {
        self.statuses.lock().unwrap().insert(index, status);
    }

    /// Make the status files of PSU `index` unreadable
    pub fn clear_psu_status(&self, index: u8) {
        self.statuses.lock().unwrap().remove(&index);
    }

    /// Set the value returned for `register` of the device at `address`
    pub fn set_register(&self, address: ChipAddress, register: u8, value: u8) {
        self.registers
            .lock()
            .unwrap()
            .insert((address, register), value);
    }

    /// Make a register read fail
    pub fn clear_register(&self, address: ChipAddress, register: u8) {
        self.registers.lock().unwrap().remove(&(address, register));
    }

    /// Writes issued so far, in order
    pub fn writes(&self) -> Vec<ThresholdWrite> {
        self.writes.lock().unwrap().clone()
    }

    pub fn clear_writes(&self) {
        self.writes.lock().unwrap().clear();
    }
}

impl BoardIo for MockBoard {
    fn psu_status(&self, index: u8) -> Result<PsuStatus, HwError> {
        self.statuses
            .lock()
            .unwrap()
            .get(&index)
            .copied()
            .ok_or_else(|| HwError::NotFound(format!("psu_{}_present", index)))
    }

    fn read_register(&self, address: ChipAddress, register: u8) -> Result<u8, HwError> {
        self.registers
            .lock()
            .unwrap()
            .get(&(address, register))
            .copied()
            .ok_or_else(|| HwError::CommandFailed {
                command: format!("i2cget {} 0x{:02x}", address, register),
                stderr: "Read failed".to_string(),
            })
    }

    fn write_threshold(
        &self,
        address: ChipAddress,
        channel: &str,
        value: i64,
    ) -> Result<(), HwError> {
        self.writes.lock().unwrap().push(ThresholdWrite {
            address,
            channel: channel.to_string(),
            value,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::report;

    #[test]
    fn test_mock_sensors_serves_reports() {
        let sensors = MockSensors::new().with_report("tmp75-i2c-7-4d", "temp1: +30.0°C");
        assert_eq!(sensors.read("tmp75-i2c-7-4d").as_deref(), Some("temp1: +30.0°C"));

        sensors.remove_report("tmp75-i2c-7-4d");
        assert!(sensors.read("tmp75-i2c-7-4d").is_none());
        assert_eq!(sensors.read_count("tmp75-i2c-7-4d"), 2);
    }

    #[test]
    fn test_mock_board_records_writes() {
        let board = MockBoard::new();
        let address = ChipAddress::new(27, 0x58);
        board.write_threshold(address, "in1_min", 90_000).unwrap();

        assert_eq!(
            board.writes(),
            vec![ThresholdWrite {
                address,
                channel: "in1_min".to_string(),
                value: 90_000
            }]
        );
    }

    #[test]
    fn test_mock_board_unset_values_fail() {
        let board = MockBoard::new();
        assert!(board.psu_status(1).is_err());
        assert!(board.read_register(ChipAddress::new(27, 0x58), 0xd8).is_err());

        board.set_register(ChipAddress::new(27, 0x58), 0xd8, 0x01);
        assert_eq!(board.read_register(ChipAddress::new(27, 0x58), 0xd8).unwrap(), 1);
    }

    #[test]
    fn test_fixture_reports_parse() {
        let report = psu_report("dps1100-i2c-27-58", 230.0, 90.0, 264.0);
        let line = report::match_line(&report, "vin").unwrap();
        assert_eq!(report::bounds(line).len(), 2);

        let report = probe_report("tmp75-i2c-7-4d", 31.0, 80.0, 75.0);
        assert!(report::match_line(&report, "temp").is_some());
    }
}
