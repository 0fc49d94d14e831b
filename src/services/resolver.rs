//! Threshold resolution
//!
//! Initial alarm bounds come from the limits the sensor tool advertises.
//! PSUs additionally have their input-voltage firmware thresholds rewritten
//! whenever the detected input type (AC/DC) changes.

use crate::alerts::{AlarmEvent, AlarmReporter, AlertSeverity, EventKind};
use crate::config::InputVoltageConfig;
use crate::domain::device::INPUT_VOLTAGE_RECORD;
use crate::domain::{
    report, AlarmRecord, ChipAddress, InputType, Monitored, PowerSupply, SensorChip, Threshold,
    ThresholdStyle,
};
use crate::hw::BoardIo;

/// Firmware thresholds are milli-units, reports are base units
const FIRMWARE_SCALE: f64 = 1000.0;

/// Derives alarm bounds and PSU input-voltage thresholds
#[derive(Debug, Clone)]
pub struct ThresholdResolver {
    input_voltage: InputVoltageConfig,
    dry_run: bool,
}

impl ThresholdResolver {
    pub fn new(input_voltage: InputVoltageConfig, dry_run: bool) -> Self {
        Self {
            input_voltage,
            dry_run,
        }
    }

    /// Recompute every record's bounds from a report and mark the chip
    /// ready.
    ///
    /// A record whose line is missing goes back to unresolved.
    pub fn resolve(&self, chip: &mut SensorChip, report: &str) {
        let chip_name = chip.name().to_string();

        for record in chip.records_mut() {
            match report::match_line(report, record.name()) {
                Some(line) => record.resolve_from_line(line),
                None => {
                    log::debug!("{}: no '{}' line in report", chip_name, record.name());
                    record.resolve_from_line("");
                }
            }
            log_bounds(&chip_name, record);
        }

        chip.mark_ready();
    }

    /// Read the identification register of a PSU and apply a changed input
    /// type.
    ///
    /// On a change the transition is reported and the input-voltage
    /// thresholds for the new type are written, min first. Returns the
    /// newly applied type; the caller must then recompute the PSU's bounds.
    pub fn detect_input_type<B: BoardIo>(
        &self,
        board: &B,
        psu: &mut PowerSupply,
        reporter: &mut AlarmReporter,
    ) -> Option<InputType> {
        let address = psu.chip().address();

        let observed = match board.read_register(address, self.input_voltage.register) {
            Ok(value) => InputType::from_register(value),
            Err(e) => {
                log::debug!("{}: input type read failed: {}", psu.label(), e);
                InputType::Unknown
            }
        };

        if !psu.confirm_input_type(observed, self.input_voltage.debounce) {
            return None;
        }

        let previous = psu.apply_input_type(observed);
        log::debug!(
            "{}: input type {:?} -> {}",
            psu.label(),
            previous,
            observed
        );

        let severity = match observed {
            InputType::Unknown => AlertSeverity::Error,
            InputType::Ac | InputType::Dc => AlertSeverity::Warning,
        };
        reporter.emit(AlarmEvent::new(
            severity,
            EventKind::InputType,
            psu.label(),
            format!("{} input type is {}", psu.label(), observed),
        ));

        self.write_input_thresholds(board, address, observed);
        Some(observed)
    }

    /// Fallback when the PSU cannot be re-read after an input-type change:
    /// the input-voltage record takes the written pair in report units.
    pub fn apply_table_bounds(&self, psu: &mut PowerSupply, input_type: InputType) {
        let pair = self.input_voltage.pair(input_type);
        let label = psu.label().to_string();

        if let Some(record) = psu.chip_mut().record_mut(INPUT_VOLTAGE_RECORD) {
            record.set_threshold(
                Threshold::Value(pair.min as f64 / FIRMWARE_SCALE),
                Threshold::Value(pair.max as f64 / FIRMWARE_SCALE),
            );
            log::info!("{}: {} bounds taken from the {} table", label, record.name(), input_type);
        }
    }

    fn write_input_thresholds<B: BoardIo>(
        &self,
        board: &B,
        address: ChipAddress,
        input_type: InputType,
    ) {
        let pair = self.input_voltage.pair(input_type);
        let writes = [
            (self.input_voltage.min_channel.as_str(), pair.min),
            (self.input_voltage.max_channel.as_str(), pair.max),
        ];

        for (channel, value) in writes {
            if self.dry_run {
                log::info!("DRY RUN: Would set {} of {} to {}", channel, address, value);
                continue;
            }
            match board.write_threshold(address, channel, value) {
                Ok(()) => log::debug!("Set {} of {} to {}", channel, address, value),
                Err(e) => log::warn!("Failed to set {} of {}: {}", channel, address, e),
            }
        }
    }
}

fn log_bounds(chip: &str, record: &AlarmRecord) {
    match record.style() {
        ThresholdStyle::Bounds => log::info!(
            "{} {}: (min: {}, max: {})",
            chip,
            record.name(),
            record.min(),
            record.max()
        ),
        ThresholdStyle::Power => {
            log::info!("{} {}: (max: {})", chip, record.name(), record.max())
        }
        ThresholdStyle::Temperature => log::info!(
            "{} {}: (max: {}, hyst: {})",
            chip,
            record.name(),
            record.max(),
            record.max_hyst()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::NotificationManager;
    use crate::mock::{self, MockBoard, ThresholdWrite};

    const PSU_CHIP: &str = "dps1100-i2c-27-58";
    const PSU_ADDR: ChipAddress = ChipAddress::new(27, 0x58);

    fn resolver(dry_run: bool) -> ThresholdResolver {
        ThresholdResolver::new(InputVoltageConfig::default(), dry_run)
    }

    fn reporter() -> AlarmReporter {
        AlarmReporter::new(NotificationManager::new(), 10)
    }

    fn psu() -> PowerSupply {
        PowerSupply::new(PSU_CHIP, "PSU1", 4).unwrap()
    }

    fn write(channel: &str, value: i64) -> ThresholdWrite {
        ThresholdWrite {
            address: PSU_ADDR,
            channel: channel.to_string(),
            value,
        }
    }

    #[test]
    fn test_resolve_psu_report() {
        let mut psu = psu();
        let report = mock::psu_report(PSU_CHIP, 230.0, 90.0, 264.0);
        resolver(false).resolve(psu.chip_mut(), &report);

        let chip = psu.chip();
        assert_eq!(chip.state(), crate::domain::DeviceState::Ready);
        let records = chip.records();
        assert_eq!(records[0].min(), Threshold::Value(90.0));
        assert_eq!(records[0].max(), Threshold::Value(264.0));
        // pin: power style, kilo normalized, min disabled
        assert_eq!(records[2].min(), Threshold::Disabled);
        assert!((records[2].max().value().unwrap() - 1100.0).abs() < 1e-9);
        // iin: single upper bound
        assert_eq!(records[4].min(), Threshold::Disabled);
        assert_eq!(records[4].max(), Threshold::Value(7.0));
    }

    #[test]
    fn test_resolve_missing_line_is_unresolved() {
        let mut psu = psu();
        resolver(false).resolve(psu.chip_mut(), "dps1100-i2c-27-58\nvin: +230.00 V\n");
        let records = psu.chip().records();
        assert_eq!(records[0].min(), Threshold::Unresolved);
        assert_eq!(records[1].max(), Threshold::Unresolved);
    }

    #[test]
    fn test_first_detection_writes_ac_table() {
        let board = MockBoard::new();
        board.set_register(PSU_ADDR, 0xd8, 0x00);
        let mut psu = psu();
        let mut reporter = reporter();

        let applied = resolver(false).detect_input_type(&board, &mut psu, &mut reporter);
        assert_eq!(applied, Some(InputType::Ac));
        assert_eq!(
            board.writes(),
            vec![write("in1_min", 90_000), write("in1_max", 264_000)]
        );

        let event = reporter.history().last().unwrap();
        assert_eq!(event.message, "PSU1 input type is AC");
        assert_eq!(event.severity, AlertSeverity::Warning);
    }

    #[test]
    fn test_unchanged_type_is_silent() {
        let board = MockBoard::new();
        board.set_register(PSU_ADDR, 0xd8, 0x01);
        let mut psu = psu();
        let mut reporter = reporter();
        let resolver = resolver(false);

        resolver.detect_input_type(&board, &mut psu, &mut reporter);
        board.clear_writes();

        assert_eq!(resolver.detect_input_type(&board, &mut psu, &mut reporter), None);
        assert!(board.writes().is_empty());
        assert_eq!(reporter.history_len(), 1);
    }

    #[test]
    fn test_ac_to_dc_writes_dc_table_once() {
        let board = MockBoard::new();
        board.set_register(PSU_ADDR, 0xd8, 0x00);
        let mut psu = psu();
        let mut reporter = reporter();
        let resolver = resolver(false);
        resolver.detect_input_type(&board, &mut psu, &mut reporter);
        board.clear_writes();

        board.set_register(PSU_ADDR, 0xd8, 0x01);
        assert_eq!(
            resolver.detect_input_type(&board, &mut psu, &mut reporter),
            Some(InputType::Dc)
        );
        assert_eq!(
            board.writes(),
            vec![write("in1_min", 200_000), write("in1_max", 280_000)]
        );

        let warnings = reporter
            .history()
            .filter(|e| e.severity == AlertSeverity::Warning && e.message.contains("DC"))
            .count();
        assert_eq!(warnings, 1);
    }

    #[test]
    fn test_unknown_type_uses_ac_table_and_errors() {
        let board = MockBoard::new();
        board.set_register(PSU_ADDR, 0xd8, 0x07);
        let mut psu = psu();
        let mut reporter = reporter();

        let applied = resolver(false).detect_input_type(&board, &mut psu, &mut reporter);
        assert_eq!(applied, Some(InputType::Unknown));
        assert_eq!(
            board.writes(),
            vec![write("in1_min", 90_000), write("in1_max", 264_000)]
        );
        let event = reporter.history().last().unwrap();
        assert_eq!(event.severity, AlertSeverity::Error);
        assert_eq!(event.message, "PSU1 input type is UNKNOWN");
    }

    #[test]
    fn test_failed_register_read_is_unknown() {
        let board = MockBoard::new();
        let mut psu = psu();
        let applied = resolver(false).detect_input_type(&board, &mut psu, &mut reporter());
        assert_eq!(applied, Some(InputType::Unknown));
    }

    #[test]
    fn test_register_lost_mid_run_falls_back_to_unknown() {
        let board = MockBoard::new();
        board.set_register(PSU_ADDR, 0xd8, 0x01);
        let mut psu = psu();
        let mut reporter = reporter();
        let resolver = resolver(false);
        resolver.detect_input_type(&board, &mut psu, &mut reporter);
        board.clear_writes();

        board.clear_register(PSU_ADDR, 0xd8);
        assert_eq!(
            resolver.detect_input_type(&board, &mut psu, &mut reporter),
            Some(InputType::Unknown)
        );
        assert_eq!(
            board.writes(),
            vec![write("in1_min", 90_000), write("in1_max", 264_000)]
        );
    }

    #[test]
    fn test_dry_run_skips_writes() {
        let board = MockBoard::new();
        board.set_register(PSU_ADDR, 0xd8, 0x01);
        let mut psu = psu();

        let applied = resolver(true).detect_input_type(&board, &mut psu, &mut reporter());
        assert_eq!(applied, Some(InputType::Dc));
        assert!(board.writes().is_empty());
    }

    #[test]
    fn test_debounce_delays_change() {
        let board = MockBoard::new();
        board.set_register(PSU_ADDR, 0xd8, 0x00);
        let mut psu = psu();
        let mut reporter = reporter();
        let mut config = InputVoltageConfig::default();
        config.debounce = 2;
        let resolver = ThresholdResolver::new(config, false);

        resolver.detect_input_type(&board, &mut psu, &mut reporter);
        board.set_register(PSU_ADDR, 0xd8, 0x01);
        assert_eq!(resolver.detect_input_type(&board, &mut psu, &mut reporter), None);
        assert_eq!(
            resolver.detect_input_type(&board, &mut psu, &mut reporter),
            Some(InputType::Dc)
        );
    }

    #[test]
    fn test_table_bounds_fallback() {
        let mut psu = psu();
        resolver(false).apply_table_bounds(&mut psu, InputType::Dc);
        let vin = &psu.chip().records()[0];
        assert_eq!(vin.min(), Threshold::Value(200.0));
        assert_eq!(vin.max(), Threshold::Value(280.0));
    }
}
