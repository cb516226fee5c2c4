//! Two-decimal position values.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A position coordinate with two-decimal semantics.
///
/// Stored as integer hundredths so a value survives any number of
/// save/load cycles unchanged. Serialized as a plain JSON number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coord(i64);

impl Coord {
    pub const ZERO: Coord = Coord(0);

    /// Create from a count of hundredths (`12050` is `120.50`).
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Self(hundredths)
    }

    /// Round a float to the nearest hundredth. Non-finite input yields zero.
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            Self((value * 100.0).round() as i64)
        } else {
            Self::ZERO
        }
    }

    #[inline]
    pub fn hundredths(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl FromStr for Coord {
    type Err = std::num::ParseFloatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<f64>().map(Self::from_f64)
    }
}

impl From<f64> for Coord {
    fn from(value: f64) -> Self {
        Self::from_f64(value)
    }
}

impl Serialize for Coord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

impl<'de> Deserialize<'de> for Coord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CoordVisitor)
    }
}

struct CoordVisitor;

impl Visitor<'_> for CoordVisitor {
    type Value = Coord;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal number")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Coord, E> {
        Ok(Coord::from_f64(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Coord, E> {
        Ok(Coord::from_hundredths(v.saturating_mul(100)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Coord, E> {
        let v = i64::try_from(v).unwrap_or(i64::MAX);
        Ok(Coord::from_hundredths(v.saturating_mul(100)))
    }

    // Older hand-edited files sometimes quote numbers.
    fn visit_str<E: de::Error>(self, v: &str) -> Result<Coord, E> {
        v.parse().map_err(E::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_pads_two_decimals() {
        assert_eq!(Coord::from_f64(120.5).to_string(), "120.50");
        assert_eq!(Coord::from_f64(-0.07).to_string(), "-0.07");
        assert_eq!(Coord::ZERO.to_string(), "0.00");
    }

    #[test]
    fn test_rounds_to_hundredths() {
        assert_eq!(Coord::from_f64(0.29).hundredths(), 29);
        assert_eq!(Coord::from_f64(1.005_1).hundredths(), 101);
        assert_eq!(Coord::from_f64(f64::NAN), Coord::ZERO);
    }

    #[test]
    fn test_deserialize_accepts_ints_floats_and_strings() {
        let values: Vec<Coord> = serde_json::from_str(r#"[12, 120.5, "3.14"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Coord::from_hundredths(1200),
                Coord::from_hundredths(12050),
                Coord::from_hundredths(314)
            ]
        );
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&Coord::from_hundredths(12050)).unwrap();
        assert_eq!(json, "120.5");
    }
}
