//! Wire values exchanged with the HAP server.
//!
//! Every value carries its format tag. The bridge never converts between
//! formats implicitly: a `Float` sent to a `uint8` characteristic is rejected,
//! not truncated.

use serde::Serialize;
use std::fmt;
use strum::{Display, EnumString};

/// HAP characteristic data format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    Bool,
    Uint8,
    Float,
    String,
}

/// A formatted value as seen by the HAP server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WireValue {
    Bool(bool),
    Uint8(u8),
    Float(f32),
    String(String),
}

impl WireValue {
    /// The runtime format tag of this value.
    pub fn format(&self) -> WireFormat {
        match self {
            Self::Bool(_) => WireFormat::Bool,
            Self::Uint8(_) => WireFormat::Uint8,
            Self::Float(_) => WireFormat::Float,
            Self::String(_) => WireFormat::String,
        }
    }

    /// Numeric view used for bounds checks. Booleans and strings have none.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Uint8(v) => Some(f64::from(*v)),
            Self::Float(v) => Some(f64::from(*v)),
            Self::Bool(_) | Self::String(_) => None,
        }
    }
}

impl fmt::Display for WireValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Uint8(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{:.1}", v),
            Self::String(s) => write!(f, "\"{}\"", s),
        }
    }
}

impl From<bool> for WireValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<u8> for WireValue {
    fn from(value: u8) -> Self {
        Self::Uint8(value)
    }
}

impl From<f32> for WireValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for WireValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_format_tags() {
        assert_eq!(WireValue::Bool(true).format(), WireFormat::Bool);
        assert_eq!(WireValue::Uint8(1).format(), WireFormat::Uint8);
        assert_eq!(WireValue::Float(1.0).format(), WireFormat::Float);
        assert_eq!(WireValue::from("Pool").format(), WireFormat::String);
    }

    #[test]
    fn test_format_names_match_hap() {
        assert_eq!(WireFormat::Uint8.to_string(), "uint8");
        assert_eq!(WireFormat::from_str("float").unwrap(), WireFormat::Float);
        assert_eq!(
            serde_json::to_string(&WireFormat::Bool).unwrap(),
            "\"bool\""
        );
    }

    #[test]
    fn test_numeric_view() {
        assert_eq!(WireValue::Bool(true).as_number(), None);
        assert_eq!(WireValue::Uint8(7).as_number(), Some(7.0));
    }

    #[test]
    fn test_serializes_untagged() {
        assert_eq!(serde_json::to_string(&WireValue::Float(25.0)).unwrap(), "25.0");
        assert_eq!(serde_json::to_string(&WireValue::Bool(false)).unwrap(), "false");
    }
}
