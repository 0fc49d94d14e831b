//! Sysfs and i2c-tools backed board access
//!
//! PSU status bits come from the CPLD driver (`psu_<n>_present`,
//! `psu_<n>_status`, `psu_<n>_ac_status`), the identification register is
//! read with `i2cget`, and firmware thresholds are written to the PMBus
//! driver's hwmon channels.

use super::command::run_with_timeout;
use super::traits::BoardIo;
use crate::domain::{ChipAddress, PsuStatus};
use crate::error::HwError;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CPLD_ROOT: &str = "/sys/bus/i2c/devices/i2c-0/0-000d";
pub const DEFAULT_HWMON_ROOT: &str = "/sys/bus/i2c/devices";
pub const DEFAULT_I2CGET_BIN: &str = "/usr/sbin/i2cget";

/// Board access through sysfs and `i2cget`
#[derive(Debug, Clone)]
pub struct SysfsBoard {
    cpld_root: PathBuf,
    hwmon_root: PathBuf,
    i2cget: PathBuf,
    timeout: Duration,
}

impl SysfsBoard {
    pub fn new(
        cpld_root: impl Into<PathBuf>,
        hwmon_root: impl Into<PathBuf>,
        i2cget: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            cpld_root: cpld_root.into(),
            hwmon_root: hwmon_root.into(),
            i2cget: i2cget.into(),
            timeout,
        }
    }

    fn read_cpld(&self, index: u8, field: &str) -> Result<u8, HwError> {
        let path = self.cpld_root.join(format!("psu_{}_{}", index, field));
        let text = fs::read_to_string(&path)
            .map_err(|_| HwError::NotFound(path.display().to_string()))?;
        parse_register(&text)
    }

    /// `<hwmon_root>/<bus>-00<addr>/hwmon/hwmon<N>`
    fn hwmon_dir(&self, address: ChipAddress) -> Result<PathBuf, HwError> {
        let parent = self.hwmon_root.join(address.to_string()).join("hwmon");
        let not_found = || HwError::NotFound(parent.display().to_string());

        let entries = fs::read_dir(&parent).map_err(|_| not_found())?;
        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| is_hwmon_dir(path))
            .collect();
        dirs.sort();

        dirs.into_iter().next().ok_or_else(not_found)
    }
}

impl Default for SysfsBoard {
    fn default() -> Self {
        Self::new(
            DEFAULT_CPLD_ROOT,
            DEFAULT_HWMON_ROOT,
            DEFAULT_I2CGET_BIN,
            Duration::from_secs(3),
        )
    }
}

impl BoardIo for SysfsBoard {
    fn psu_status(&self, index: u8) -> Result<PsuStatus, HwError> {
        // The present bit is active low
        Ok(PsuStatus {
            present: self.read_cpld(index, "present")? == 0x0,
            power_good: self.read_cpld(index, "status")? == 0x1,
            ac_ok: self.read_cpld(index, "ac_status")? == 0x1,
        })
    }

    fn read_register(&self, address: ChipAddress, register: u8) -> Result<u8, HwError> {
        let bus = address.bus.to_string();
        let chip = format!("0x{:02x}", address.address);
        let reg = format!("0x{:02x}", register);

        let i2cget = self.i2cget.to_string_lossy();
        let out = run_with_timeout(&i2cget, &["-f", "-y", &bus, &chip, &reg], self.timeout)?;
        parse_register(&out)
    }

    fn write_threshold(
        &self,
        address: ChipAddress,
        channel: &str,
        value: i64,
    ) -> Result<(), HwError> {
        let path = self.hwmon_dir(address)?.join(channel);
        log::debug!("Writing {} to {}", value, path.display());

        fs::write(&path, value.to_string()).map_err(|source| HwError::Write {
            path: path.display().to_string(),
            source,
        })
    }
}

fn is_hwmon_dir(path: &Path) -> bool {
    path.is_dir()
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("hwmon"))
}

/// Parse a register dump such as `0x1` or `0x00`
pub fn parse_register(text: &str) -> Result<u8, HwError> {
    let text = text.trim();
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);

    u8::from_str_radix(digits, 16).map_err(|_| HwError::Parse(format!("register value '{}'", text)))
}
