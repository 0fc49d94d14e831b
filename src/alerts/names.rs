//! Human-readable names for alarm messages

use crate::domain::{Monitored, MonitoredDevice};

/// PSU measurement names
const PSU_QUANTITIES: [(&str, &str); 6] = [
    ("vin", "Input Voltage"),
    ("vout1", "Output Voltage"),
    ("pin", "Input Power"),
    ("pout1", "Output Power"),
    ("iin", "Input Current"),
    ("iout1", "Output Current"),
];

/// Regulator chip → (rail, description)
const REGULATOR_RAILS: [(&str, &str, &str); 20] = [
    ("ir3584-i2c-4-15", "CPU_CORE VCCIN_1.82V", "CPU core 1.82V"),
    ("ir3584-i2c-4-16", "CPU_VCC/VCCIO_1.05V", "CPU 1.05V voltage"),
    ("ir38062-i2c-4-42", "Baseboard_Standby_3.3V Voltage", "Baseboard standby 3.3V"),
    ("ir3584-i2c-16-70", "Switch_TRVDD_0.8V Voltage", "Switch TRVDD 0.8V"),
    ("ir38062-i2c-16-49", "Switch_TVDD_1.2V", "Switch TVDD 1.2V"),
    ("ir38060-i2c-17-45", "Switch_FPGA_1.0V Voltage", "Switch FPGA 1.0V"),
    ("ir38062-i2c-17-49", "Switch_PVDD_0.8V Voltage", "Switch PVDD 0.8V"),
    ("ir3584-i2c-19-30", "TOP_LC_port&CPLD_Supply_3.3V", "TOP Linecard 3.3V"),
    ("ir3584-i2c-19-50", "TOP_LC_VDD_A_0.8", "TOP Linecard left DVDD 0.8V"),
    ("ir3584-i2c-19-70", "TOP_LC_DVDDM_A_0.8V", "TOP Linecard left DVDDM 0.8V"),
    ("ir3584-i2c-20-50", "TOP_LC_VDD_B_0.8V", "TOP Linecard right DVDD 0.8V"),
    ("ir3584-i2c-20-70", "TOP_LC_DVDDM_B_0.8V", "TOP Linecard right DVDDM 0.8V"),
    ("ir38060-i2c-20-45", "TOP_LC_VDDIO_1.8V Voltage", "TOP Linecard I/O 1.8V"),
    ("ir3584-i2c-21-30", "BOTTOM_LC_port&CPLD_Supply_3.3V", "BOTTOM Linecard 3.3V"),
    ("ir3584-i2c-21-50", "BOTTOM_LC_VDD_A_0.8V", "BOTTOM Linecard left DVDD 0.8V"),
    ("ir3584-i2c-21-70", "BOTTOM_LC_DVDDM_A_0.8V", "BOTTOM Linecard left DVDDM 0.8V"),
    ("ir3584-i2c-22-50", "BOTTOM_LC_VDD_B_0.8V", "BOTTOM Linecard right DVDD 0.8V"),
    ("ir3584-i2c-22-70", "BOTTOM_LC_DVDDM_A_0.8V", "BOTTOM Linecard right DVDDM 0.8V"),
    ("ir38060-i2c-22-45", "BOTTOM_LC_VDDIO_1.8V", "BOTTOM Linecard I/O 1.8V"),
    ("ir38060-i2c-23-45", "Switch_Standby_3.3V", "Switch standby 3.3V"),
];

/// Display name of a PSU measurement, e.g. `Input Voltage`
pub fn psu_quantity(record: &str) -> Option<&'static str> {
    PSU_QUANTITIES
        .iter()
        .find(|(name, _)| *name == record)
        .map(|(_, quantity)| *quantity)
}

/// Built-in rail label of a regulator chip, e.g.
/// `CPU_CORE VCCIN_1.82V(CPU core 1.82V`
pub fn regulator_rail(chip: &str) -> Option<String> {
    REGULATOR_RAILS
        .iter()
        .find(|(name, _, _)| *name == chip)
        .map(|(_, rail, description)| format!("{}({}", rail, description))
}

/// Label of a whole device, used by status listings
pub fn device_label(device: &MonitoredDevice) -> String {
    if let Some(psu) = device.as_power_supply() {
        return psu.label().to_string();
    }

    let chip = device.chip();
    if let Some(name) = chip.display_name() {
        return name.to_string();
    }
    match device {
        MonitoredDevice::VoltageRegulator(_) => regulator_rail(chip.name())
            .map(|rail| format!("{})", rail))
            .unwrap_or_else(|| chip.name().to_string()),
        _ => chip.name().to_string(),
    }
}

/// Name of one measurement as it appears in alarm messages.
///
/// PSUs use their slot label and the quantity table. Regulators use the
/// configured display name or the built-in rail table. Anything else falls
/// back to `<chip> <record>`.
pub fn display_name(device: &MonitoredDevice, record: &str) -> String {
    let chip = device.chip();

    match device {
        MonitoredDevice::PowerSupply(psu) => match psu_quantity(record) {
            Some(quantity) => format!("{} {}", psu.label(), quantity),
            None => format!("{} {}", psu.label(), record),
        },
        MonitoredDevice::VoltageRegulator(_) => {
            let record = record.to_lowercase();
            if let Some(name) = chip.display_name() {
                format!("{} {}", name, record)
            } else if let Some(rail) = regulator_rail(chip.name()) {
                format!("{} {})", rail, record)
            } else {
                format!("{} {}", chip.name(), record)
            }
        }
        MonitoredDevice::TemperatureProbe(_) => match chip.display_name() {
            Some(name) => name.to_string(),
            None => format!("{} {}", chip.name(), record),
        },
    }
}
