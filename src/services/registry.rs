//! Device registry
//!
//! Owns every monitored device in poll order: power supplies first, then
//! voltage regulators, then temperature probes.

use super::snapshot::DeviceSnapshot;
use crate::config::Config;
use crate::domain::{Monitored, MonitoredDevice, PowerSupply, TemperatureProbe, VoltageRegulator};
use crate::error::DomainError;

/// Ordered collection of monitored devices
#[derive(Debug, Clone, Default)]
pub struct Registry {
    devices: Vec<MonitoredDevice>,
}

impl Registry {
    pub fn new(devices: Vec<MonitoredDevice>) -> Self {
        Self { devices }
    }

    /// Build the registry described by a configuration
    pub fn from_config(config: &Config) -> Result<Self, DomainError> {
        let mut devices = Vec::with_capacity(config.device_count());

        for psu in &config.psus {
            devices.push(PowerSupply::new(&psu.chip, psu.label.clone(), psu.cpld_index)?.into());
        }
        for vr in &config.regulators {
            devices.push(VoltageRegulator::new(&vr.chip, vr.display_name.clone())?.into());
        }
        for probe in &config.temperatures {
            devices.push(TemperatureProbe::new(&probe.chip, probe.display_name.clone())?.into());
        }

        Ok(Self { devices })
    }

    pub fn devices(&self) -> &[MonitoredDevice] {
        &self.devices
    }

    pub fn devices_mut(&mut self) -> &mut [MonitoredDevice] {
        &mut self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Find a device by chip name
    pub fn find(&self, chip: &str) -> Option<&MonitoredDevice> {
        self.devices.iter().find(|d| d.chip().name() == chip)
    }

    /// Snapshot of every device, in poll order
    pub fn snapshot(&self) -> Vec<DeviceSnapshot> {
        self.devices.iter().map(DeviceSnapshot::from_device).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChipConfig;
    use crate::domain::DeviceKind;

    #[test]
    fn test_from_default_config() {
        let registry = Registry::from_config(&Config::default()).unwrap();
        assert_eq!(registry.len(), 35);

        let kinds: Vec<DeviceKind> = registry.devices().iter().map(|d| d.kind()).collect();
        assert!(kinds[..4].iter().all(|k| *k == DeviceKind::PowerSupply));
        assert!(kinds[4..24].iter().all(|k| *k == DeviceKind::VoltageRegulator));
        assert!(kinds[24..].iter().all(|k| *k == DeviceKind::TemperatureProbe));
    }

    #[test]
    fn test_find_by_chip() {
        let registry = Registry::from_config(&Config::default()).unwrap();
        let psu = registry.find("dps1100-i2c-26-58").unwrap();
        assert_eq!(psu.as_power_supply().unwrap().label(), "PSU2");
        assert!(registry.find("dps1100-i2c-99-58").is_none());
    }

    #[test]
    fn test_invalid_chip_rejected() {
        let mut config = Config::default();
        config.temperatures = vec![ChipConfig {
            chip: "tmp75".to_string(),
            display_name: None,
        }];
        assert!(matches!(
            Registry::from_config(&config),
            Err(DomainError::InvalidChipName(_))
        ));
    }

    #[test]
    fn test_snapshot_preserves_order() {
        let registry = Registry::from_config(&Config::default()).unwrap();
        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), registry.len());
        assert_eq!(snapshot[0].chip, "dps1100-i2c-27-58");
        assert_eq!(snapshot[34].chip, "tmp75-i2c-43-49");
    }
}
