//! lm-sensors backed sensor source

use super::command::run_with_timeout;
use super::traits::SensorSource;
use crate::error::HwError;
use std::path::PathBuf;
use std::time::Duration;

/// Default location of the sensor tool on the BMC image
pub const DEFAULT_SENSORS_BIN: &str = "/usr/bin/sensors";

/// Runs `sensors <chip>` for each read
#[derive(Debug, Clone)]
pub struct LmSensors {
    binary: PathBuf,
    timeout: Duration,
}

impl LmSensors {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn binary(&self) -> &std::path::Path {
        &self.binary
    }
}

impl Default for LmSensors {
    fn default() -> Self {
        Self::new(DEFAULT_SENSORS_BIN, Duration::from_secs(3))
    }
}

impl SensorSource for LmSensors {
    fn read(&self, chip: &str) -> Option<String> {
        let binary = self.binary.to_string_lossy();
        match run_with_timeout(&binary, &[chip], self.timeout) {
            Ok(report) if report.is_empty() => {
                log::debug!("{}: empty sensor report", chip);
                None
            }
            Ok(report) => Some(report),
            Err(e @ HwError::Timeout { .. }) => {
                log::warn!("{}: {}", chip, e);
                None
            }
            Err(e) => {
                log::debug!("{}: {}", chip, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_returns_report() {
        let sensors = LmSensors::new("echo", Duration::from_secs(5));
        assert_eq!(sensors.read("dps1100-i2c-27-58").as_deref(), Some("dps1100-i2c-27-58"));
    }

    #[test]
    fn test_missing_tool_is_unreachable() {
        let sensors = LmSensors::new("/nonexistent/sensors", Duration::from_secs(1));
        assert!(sensors.read("dps1100-i2c-27-58").is_none());
    }

    #[test]
    fn test_failing_tool_is_unreachable() {
        let sensors = LmSensors::new("false", Duration::from_secs(5));
        assert!(sensors.read("dps1100-i2c-27-58").is_none());
    }

    #[test]
    fn test_default_binary() {
        assert_eq!(LmSensors::default().binary(), std::path::Path::new("/usr/bin/sensors"));
    }
}
