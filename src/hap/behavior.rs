//! Per-category conversion between domain values and wire values.
//!
//! Three kinds of attribute exist on the pool accessory and each converts in
//! a fixed way. Keeping them as a closed enum makes the conversion table
//! exhaustive at compile time.

use super::value::{WireFormat, WireValue};
use crate::controller::DomainValue;

/// Conversion behavior of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeBehavior {
    /// Relay state exposed as a `bool` characteristic.
    Switch,
    /// Whole degrees exposed as a `float` characteristic.
    ///
    /// Reads cast the integer to float, writes round to the nearest integer
    /// (half away from zero).
    BoundedFloat,
    /// Off/heat flag exposed as a `uint8` enumeration (0 = off, 1 = heat).
    EnumeratedMode,
}

impl AttributeBehavior {
    /// Wire format this behavior accepts and produces.
    pub const fn format(self) -> WireFormat {
        match self {
            Self::Switch => WireFormat::Bool,
            Self::BoundedFloat => WireFormat::Float,
            Self::EnumeratedMode => WireFormat::Uint8,
        }
    }

    /// Convert a wire value to the domain. `None` when the format does not match.
    pub fn coerce(self, wire: &WireValue) -> Option<DomainValue> {
        match (self, wire) {
            (Self::Switch, WireValue::Bool(on)) => Some(DomainValue::Flag(*on)),
            (Self::BoundedFloat, WireValue::Float(v)) => {
                Some(DomainValue::Degrees(round_to_degrees(*v)))
            }
            (Self::EnumeratedMode, WireValue::Uint8(v)) => Some(DomainValue::Flag(*v != 0)),
            _ => None,
        }
    }

    /// Convert a domain value to the wire. `None` when the kinds do not match.
    pub fn to_wire(self, domain: DomainValue) -> Option<WireValue> {
        match (self, domain) {
            (Self::Switch, DomainValue::Flag(on)) => Some(WireValue::Bool(on)),
            (Self::BoundedFloat, DomainValue::Degrees(d)) => Some(WireValue::Float(d as f32)),
            (Self::EnumeratedMode, DomainValue::Flag(heat)) => {
                Some(WireValue::Uint8(u8::from(heat)))
            }
            _ => None,
        }
    }
}

/// Round a wire temperature to whole degrees.
///
/// Half-way values round away from zero, like C `round()`. Values beyond the
/// `i32` range saturate and NaN maps to 0; bounds checks reject both before a
/// write reaches the controller.
pub fn round_to_degrees(value: f32) -> i32 {
    value.round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding_is_half_away_from_zero() {
        assert_eq!(round_to_degrees(25.4), 25);
        assert_eq!(round_to_degrees(25.5), 26);
        assert_eq!(round_to_degrees(26.5), 27);
        assert_eq!(round_to_degrees(-0.5), -1);
        assert_eq!(round_to_degrees(39.49), 39);
    }

    #[test]
    fn test_switch_conversion() {
        let b = AttributeBehavior::Switch;
        assert_eq!(b.coerce(&WireValue::Bool(true)), Some(DomainValue::Flag(true)));
        assert_eq!(b.to_wire(DomainValue::Flag(false)), Some(WireValue::Bool(false)));
        assert_eq!(b.coerce(&WireValue::Uint8(1)), None);
    }

    #[test]
    fn test_bounded_float_conversion() {
        let b = AttributeBehavior::BoundedFloat;
        assert_eq!(b.coerce(&WireValue::Float(25.4)), Some(DomainValue::Degrees(25)));
        assert_eq!(b.to_wire(DomainValue::Degrees(25)), Some(WireValue::Float(25.0)));
        assert_eq!(b.to_wire(DomainValue::Flag(true)), None);
    }

    #[test]
    fn test_enumerated_mode_conversion() {
        let b = AttributeBehavior::EnumeratedMode;
        assert_eq!(b.coerce(&WireValue::Uint8(0)), Some(DomainValue::Flag(false)));
        assert_eq!(b.coerce(&WireValue::Uint8(1)), Some(DomainValue::Flag(true)));
        assert_eq!(b.to_wire(DomainValue::Flag(true)), Some(WireValue::Uint8(1)));
        assert_eq!(b.coerce(&WireValue::Bool(true)), None);
        assert_eq!(b.coerce(&WireValue::Float(1.0)), None);
    }
}
