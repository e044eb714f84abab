//! Inbound format validation and outbound formatting.
//!
//! The format tag of an inbound value must equal the attribute's declared
//! format exactly. Bounds are not checked here; see [`Bounds::check`](super::attribute::Bounds::check).

use super::attribute::Attribute;
use super::value::WireValue;
use crate::controller::DomainValue;
use crate::error::{BridgeError, Result};
use log::warn;

/// Check `wire`'s format against `attribute` and convert it to a domain value.
///
/// A mismatch is logged once and returned as [`BridgeError::RejectedFormat`].
/// Nothing is clamped.
pub fn validate_and_coerce(attribute: &Attribute, wire: &WireValue) -> Result<DomainValue> {
    let expected = attribute.format();
    let received = wire.format();

    match attribute.behavior().coerce(wire) {
        Some(domain) if expected == received => Ok(domain),
        _ => {
            warn!(
                "[HAP] Invalid {} value format: {} (expected {})",
                attribute.name(),
                received,
                expected
            );
            Err(BridgeError::RejectedFormat {
                attribute: attribute.name(),
                expected,
                received,
            })
        }
    }
}

/// Format a domain value for `attribute`'s outbound read path.
pub fn to_wire(attribute: &Attribute, domain: DomainValue) -> Result<WireValue> {
    attribute
        .behavior()
        .to_wire(domain)
        .ok_or_else(|| BridgeError::ActuationFailure {
            attribute: attribute.name(),
            reason: format!("controller reported {} in the wrong kind", domain),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Quantity;
    use crate::hap::registry::Registry;
    use crate::hap::value::WireFormat;
    use strum::IntoEnumIterator;

    #[test]
    fn test_every_attribute_rejects_foreign_formats() {
        let registry = Registry::new();
        let samples = [
            WireValue::Bool(true),
            WireValue::Uint8(1),
            WireValue::Float(1.0),
            WireValue::from("1"),
        ];

        for quantity in Quantity::iter() {
            let attr = registry.get(quantity);
            for sample in samples.iter().filter(|s| s.format() != attr.format()) {
                let err = validate_and_coerce(attr, sample).unwrap_err();
                assert!(
                    matches!(err, BridgeError::RejectedFormat { received, .. } if received == sample.format()),
                    "{} accepted {:?}",
                    attr.name(),
                    sample
                );
                assert_eq!(attr.value(), *attr.default_value());
            }
        }
    }

    #[test]
    fn test_target_temperature_round_trip() {
        let registry = Registry::new();
        let attr = registry.get(Quantity::TargetTemperature);

        let domain = validate_and_coerce(attr, &WireValue::Float(25.4)).unwrap();
        assert_eq!(domain, DomainValue::Degrees(25));
        assert_eq!(to_wire(attr, domain).unwrap(), WireValue::Float(25.0));
    }

    #[test]
    fn test_does_not_enforce_bounds() {
        let registry = Registry::new();
        let attr = registry.get(Quantity::TargetTemperature);
        assert_eq!(
            validate_and_coerce(attr, &WireValue::Float(45.0)).unwrap(),
            DomainValue::Degrees(45)
        );
    }

    #[test]
    fn test_rejection_message_names_attribute_and_format() {
        let registry = Registry::new();
        let attr = registry.get(Quantity::TargetHeatingMode);
        let err = validate_and_coerce(attr, &WireValue::Float(1.0)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid target_heating_state value format: float (expected uint8)"
        );
        assert!(matches!(
            err,
            BridgeError::RejectedFormat {
                expected: WireFormat::Uint8,
                ..
            }
        ));
    }

    #[test]
    fn test_to_wire_rejects_wrong_kind() {
        let registry = Registry::new();
        let attr = registry.get(Quantity::Power);
        assert!(to_wire(attr, DomainValue::Degrees(3)).is_err());
    }
}
