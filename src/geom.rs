//! # Geometry Types
//!
//! Length values and 2D offsets used throughout the pipeline. Lengths accept
//! a numeric literal with an optional absolute SVG unit suffix and resolve to
//! user units (pixels).

use crate::error::EtiquetaError;

/// User units per unit, from <http://www.w3.org/TR/SVG/coords.html#Units>.
const UNITS_TO_PX: &[(&str, f64)] = &[
    ("pt", 1.25),
    ("pc", 15.0),
    ("mm", 3.543307),
    ("cm", 35.43307),
    ("in", 90.0),
];

/// A 2D offset in user units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Parse a length like `12`, `8.5in` or `10 mm` into user units.
///
/// A bare number is already in user units. Unknown unit suffixes are a
/// configuration error, not a silent fallthrough.
pub fn parse_length(input: &str) -> Result<f64, EtiquetaError> {
    let s = input.trim();
    let number_end = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .unwrap_or(s.len());
    let (number, unit) = s.split_at(number_end);
    let value: f64 = number
        .parse()
        .map_err(|_| EtiquetaError::Config(format!("cannot parse length '{input}'")))?;

    let unit = unit.trim();
    if unit.is_empty() {
        return Ok(value);
    }
    match UNITS_TO_PX.iter().find(|(name, _)| *name == unit) {
        Some((_, factor)) => Ok(value * factor),
        None => Err(EtiquetaError::Config(format!(
            "unknown unit '{unit}' in length '{input}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bare_number_is_user_units() {
        assert_eq!(parse_length("12").unwrap(), 12.0);
        assert_eq!(parse_length("0.5").unwrap(), 0.5);
        assert_eq!(parse_length("-3").unwrap(), -3.0);
    }

    #[test]
    fn test_unit_suffixes() {
        assert_eq!(parse_length("2pt").unwrap(), 2.5);
        assert_eq!(parse_length("1pc").unwrap(), 15.0);
        assert_eq!(parse_length("10mm").unwrap(), 35.43307);
        assert_eq!(parse_length("1cm").unwrap(), 35.43307);
        assert_eq!(parse_length("1in").unwrap(), 90.0);
    }

    #[test]
    fn test_whitespace_between_number_and_unit() {
        assert_eq!(parse_length(" 8.5 in ").unwrap(), 8.5 * 90.0);
    }

    #[test]
    fn test_bad_lengths() {
        assert!(parse_length("abc").is_err());
        assert!(parse_length("10furlongs").is_err());
        assert!(parse_length("").is_err());
    }
}
