//! Output formatting utilities
//!
//! Provides table and JSON output formatting for CLI commands.

use crate::cli::args::OutputFormat;
use crate::config::{Config, ConfigFile};
use crate::domain::{DeviceKind, Monitored, MonitoredDevice};
use crate::services::{DeviceSnapshot, RecordSnapshot, StateSnapshot};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;

/// Format and print output based on the selected format
pub fn print_output<T: Serialize + TableDisplay>(data: &T, format: OutputFormat) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match format {
        OutputFormat::Table => {
            writeln!(handle, "{}", data.to_table())?;
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(data).map_err(io::Error::other)?;
            writeln!(handle, "{}", json)?;
        }
        OutputFormat::Compact => {
            writeln!(handle, "{}", data.to_compact())?;
        }
    }

    Ok(())
}

/// Trait for types that can be displayed as a table
pub trait TableDisplay {
    /// Format as a table string
    fn to_table(&self) -> String;

    /// Format as a compact single line
    fn to_compact(&self) -> String {
        self.to_table().replace('\n', " | ")
    }
}

/// Configured device entry for display
#[derive(Debug, Clone, Serialize)]
pub struct DeviceEntry {
    pub kind: DeviceKind,
    pub chip: String,
    pub label: String,
    pub bus: u32,
    pub address: String,
    pub records: Vec<String>,
}

impl From<&MonitoredDevice> for DeviceEntry {
    fn from(device: &MonitoredDevice) -> Self {
        let chip = device.chip();
        Self {
            kind: device.kind(),
            chip: chip.name().to_string(),
            label: crate::alerts::names::device_label(device),
            bus: chip.address().bus,
            address: format!("0x{:02x}", chip.address().address),
            records: chip.records().iter().map(|r| r.name().to_string()).collect(),
        }
    }
}

/// Device list for display
#[derive(Debug, Clone, Serialize)]
pub struct DeviceList {
    pub devices: Vec<DeviceEntry>,
}

impl TableDisplay for DeviceList {
    fn to_table(&self) -> String {
        let mut output = format!("Devices: {}\n\n", self.devices.len());
        output.push_str(&format!(
            "{:<12} {:<20} {:>4} {:>5}  {}\n",
            "KIND", "CHIP", "BUS", "ADDR", "LABEL"
        ));

        for device in &self.devices {
            output.push_str(&format!(
                "{:<12} {:<20} {:>4} {:>5}  {}\n",
                device.kind.to_string(),
                device.chip,
                device.bus,
                device.address,
                device.label
            ));
        }

        output
    }

    fn to_compact(&self) -> String {
        self.devices
            .iter()
            .map(|d| d.chip.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn record_line(record: &RecordSnapshot) -> String {
    let status = match (record.failing, record.classification) {
        (true, _) => "FAILED".to_string(),
        (false, Some(c)) => c.to_string(),
        (false, None) => "-".to_string(),
    };
    format!(
        "  {:<8} {:>12}  {:>12} ~ {:<12} {}",
        record.name,
        record.value.to_string(),
        record.min.to_string(),
        record.max.to_string(),
        status
    )
}

fn device_header(device: &DeviceSnapshot) -> String {
    let mut header = format!("{} ({}) [{:?}", device.label, device.chip, device.state);
    if let Some(psu) = &device.psu {
        let input = psu
            .input_type
            .map_or_else(|| "undetected".to_string(), |t| t.to_string());
        header.push_str(&format!(
            ", present: {}, power: {}, input: {}",
            psu.status.present, psu.status.power_good, input
        ));
    }
    header.push(']');
    header
}

impl TableDisplay for StateSnapshot {
    fn to_table(&self) -> String {
        let mut output = format!(
            "Cycle {}, {} devices, {} failing\n",
            self.cycle,
            self.devices.len(),
            self.failing_count()
        );

        for device in &self.devices {
            output.push('\n');
            output.push_str(&device_header(device));
            output.push('\n');
            for record in &device.records {
                output.push_str(&record_line(record));
                output.push('\n');
            }
        }

        output
    }

    fn to_compact(&self) -> String {
        let failing: Vec<&str> = self
            .devices
            .iter()
            .flat_map(|d| d.failing())
            .map(|r| r.display_name.as_str())
            .collect();

        if failing.is_empty() {
            format!("cycle {}: all OK", self.cycle)
        } else {
            format!("cycle {}: FAILED {}", self.cycle, failing.join(", "))
        }
    }
}

/// Configuration search paths
#[derive(Debug, Clone, Serialize)]
pub struct ConfigPaths {
    pub paths: Vec<ConfigPathEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigPathEntry {
    pub path: PathBuf,
    pub exists: bool,
}

impl TableDisplay for ConfigPaths {
    fn to_table(&self) -> String {
        self.paths
            .iter()
            .map(|p| {
                let marker = if p.exists { "*" } else { " " };
                format!("{} {}", marker, p.path.display())
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl TableDisplay for Config {
    fn to_table(&self) -> String {
        ConfigFile::to_toml(self).unwrap_or_else(|e| format!("# {}", e))
    }

    fn to_compact(&self) -> String {
        format!(
            "{} PSUs, {} regulators, {} probes, every {}s",
            self.psus.len(),
            self.regulators.len(),
            self.temperatures.len(),
            self.general.interval_seconds
        )
    }
}
