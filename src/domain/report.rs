//! Sensor report grammar
//!
//! Parses the text printed by `sensors <chip>`:
//!
//! ```text
//! dps1100-i2c-27-58
//! Adapter: i2c-27
//! vin:         +230.00 V  (crit min =  +90.00 V, crit max = +264.00 V)
//! pin:         138.00 W  (max =   1.10 kW)
//! temp1:        +31.0°C  (high = +80.0°C, hyst = +75.0°C)
//! ```
//!
//! Only three things are needed: selecting a line by label, the value token
//! after `:`, and the bound tokens after each `=`.

/// Marker printed by the sensor tool when a channel cannot be read
pub const NOT_AVAILABLE: &str = "N/A";

/// A single advertised limit from a report line
#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    /// Annotation key, e.g. `crit min`, `max`, `hyst`
    pub key: String,
    /// Limit normalized to the base unit
    pub value: f64,
}

impl Bound {
    /// Whether the key names a lower limit
    pub fn is_lower(&self) -> bool {
        let key = self.key.to_ascii_lowercase();
        key.contains("min") || key.contains("low")
    }
}

/// Result of extracting the value token of a line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueToken {
    /// Numeric value normalized to the base unit
    Number(f64),
    /// The tool reported `N/A`
    NotAvailable,
    /// No token, or a token that is not a number
    Malformed,
}

/// Select the first line whose label contains `label`.
///
/// The label is the text before the first `:`. Lines without a `:` (the chip
/// header) never match.
pub fn match_line<'a>(report: &'a str, label: &str) -> Option<&'a str> {
    report.lines().find(|line| {
        line.split_once(':')
            .map(|(name, _)| name.contains(label))
            .unwrap_or(false)
    })
}

/// Extract the measured value from a report line.
pub fn value_token(line: &str) -> ValueToken {
    let Some((_, rest)) = line.split_once(':') else {
        return ValueToken::Malformed;
    };

    let mut tokens = rest.split_whitespace();
    let Some(number) = tokens.next() else {
        return ValueToken::Malformed;
    };

    if number == NOT_AVAILABLE {
        return ValueToken::NotAvailable;
    }

    match parse_quantity(number, tokens.next()) {
        Some(value) => ValueToken::Number(value),
        None => ValueToken::Malformed,
    }
}

/// Extract every `key = value` limit annotation from a report line, in order.
pub fn bounds(line: &str) -> Vec<Bound> {
    let parts: Vec<&str> = line.split('=').collect();
    let mut bounds = Vec::new();

    for pair in parts.windows(2) {
        let key = pair[0]
            .rsplit(|c: char| c == '(' || c == ',')
            .next()
            .unwrap_or("")
            .trim();

        let mut tokens = pair[1]
            .split_whitespace()
            .map(|t| t.trim_end_matches([',', ')']));

        let Some(number) = tokens.next() else {
            continue;
        };

        if let Some(value) = parse_quantity(number, tokens.next()) {
            bounds.push(Bound {
                key: key.to_string(),
                value,
            });
        }
    }

    bounds
}

/// Parse a number token with either an attached (`+31.0°C`) or a separate
/// (`1.10 kW`) unit, scaling SI prefixes to the base unit.
fn parse_quantity(token: &str, next: Option<&str>) -> Option<f64> {
    let token = token.trim_start_matches('+');
    let split = token
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .unwrap_or(token.len());
    let (number, attached) = token.split_at(split);

    let value: f64 = number.parse().ok()?;
    let unit = if attached.is_empty() {
        next.unwrap_or("")
    } else {
        attached
    };

    Some(value * unit_scale(unit))
}

fn unit_scale(unit: &str) -> f64 {
    match unit.trim_end_matches([',', ')']) {
        "kW" | "kV" | "kA" => 1000.0,
        "mW" | "mV" | "mA" => 0.001,
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PSU_REPORT: &str = "dps1100-i2c-27-58
Adapter: i2c-27
vin:         +230.00 V  (crit min =  +90.00 V, crit max = +264.00 V)
vout1:        +12.03 V  (crit min = +10.80 V, crit max = +13.20 V)
pin:         138.00 W  (max =   1.10 kW)
pout1:       120.00 W  (max =   1.00 kW)
iin:           +0.62 A  (max =  +7.00 A)
iout1:        +10.00 A  (max = +91.67 A)
";

    #[test]
    fn test_match_line_by_label() {
        let line = match_line(PSU_REPORT, "vout1").unwrap();
        assert!(line.starts_with("vout1:"));
    }

    #[test]
    fn test_match_line_ignores_header() {
        // The chip header carries no label delimiter
        assert!(match_line(PSU_REPORT, "dps1100").is_none());
        assert!(match_line(PSU_REPORT, "fan1").is_none());
    }

    #[test]
    fn test_match_line_first_match_wins() {
        let report = "temp1: +30.0°C\ntemp2: +40.0°C\n";
        assert_eq!(match_line(report, "temp"), Some("temp1: +30.0°C"));
    }

    #[test]
    fn test_value_token_strips_sign() {
        let line = match_line(PSU_REPORT, "vin").unwrap();
        assert_eq!(value_token(line), ValueToken::Number(230.0));
    }

    #[test]
    fn test_value_token_attached_unit() {
        assert_eq!(
            value_token("temp1:        +31.5°C  (high = +80.0°C)"),
            ValueToken::Number(31.5)
        );
    }

    #[test]
    fn test_value_token_not_available() {
        assert_eq!(value_token("iin:  N/A  (max = +7.00 A)"), ValueToken::NotAvailable);
    }

    #[test]
    fn test_value_token_malformed() {
        assert_eq!(value_token("no delimiter here"), ValueToken::Malformed);
        assert_eq!(value_token("vin:"), ValueToken::Malformed);
        assert_eq!(value_token("vin: ALARM"), ValueToken::Malformed);
    }

    #[test]
    fn test_value_token_kilo_normalized() {
        match value_token("pin:  1.05 kW  (max = 1.10 kW)") {
            ValueToken::Number(v) => assert!((v - 1050.0).abs() < 1e-9),
            other => panic!("Expected number, got {:?}", other),
        }
    }

    #[test]
    fn test_bounds_min_and_max() {
        let line = match_line(PSU_REPORT, "vin").unwrap();
        let bounds = bounds(line);
        assert_eq!(bounds.len(), 2);
        assert_eq!(bounds[0].key, "crit min");
        assert_eq!(bounds[0].value, 90.0);
        assert!(bounds[0].is_lower());
        assert_eq!(bounds[1].key, "crit max");
        assert_eq!(bounds[1].value, 264.0);
        assert!(!bounds[1].is_lower());
    }

    #[test]
    fn test_bounds_kilo_power() {
        let line = match_line(PSU_REPORT, "pin").unwrap();
        let bounds = bounds(line);
        assert_eq!(bounds.len(), 1);
        assert!((bounds[0].value - 1100.0).abs() < 1e-9);
    }

    #[test]
    fn test_bounds_temperature_with_hysteresis() {
        let bounds = bounds("temp1:        +31.0°C  (high = +80.0°C, hyst = +75.0°C)");
        assert_eq!(bounds.len(), 2);
        assert_eq!(bounds[0].key, "high");
        assert_eq!(bounds[0].value, 80.0);
        assert_eq!(bounds[1].key, "hyst");
        assert_eq!(bounds[1].value, 75.0);
    }

    #[test]
    fn test_bounds_none() {
        assert!(bounds("vin: +230.00 V").is_empty());
        assert!(bounds("").is_empty());
    }
}
