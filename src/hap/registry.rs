//! Attribute registry.
//!
//! Owns one [`Attribute`] per controller quantity, declared once at startup.
//! The registry is shared by `Arc` between the sync engine (which writes the
//! caches) and the accessory builder (which lays the attributes out in
//! services).

use super::attribute::{Attribute, Bounds};
use super::behavior::AttributeBehavior;
use super::types::CharacteristicType;
use super::value::WireValue;
use crate::controller::Quantity;
use strum::IntoEnumIterator;

/// Setpoint range accepted by the heater.
pub const TARGET_TEMPERATURE_BOUNDS: Bounds = Bounds::Range {
    min: 10.0,
    max: 40.0,
    step: 1.0,
};

/// Range reported for the water temperature sensor.
pub const CURRENT_TEMPERATURE_BOUNDS: Bounds = Bounds::Range {
    min: 0.0,
    max: 100.0,
    step: 1.0,
};

/// Off (0) and heat (1). The cooling and auto states of the HAP enumeration
/// are not offered by the heater.
pub const HEATING_MODE_VALUES: &[u8] = &[0, 1];

/// Declaration table for every exposed attribute.
fn declare(quantity: Quantity) -> Attribute {
    match quantity {
        Quantity::Power => Attribute::new(
            "power_state",
            quantity,
            CharacteristicType::On,
            AttributeBehavior::Switch,
            Bounds::Unbounded,
            WireValue::Bool(false),
        ),
        Quantity::Pump => Attribute::new(
            "pump_state",
            quantity,
            CharacteristicType::On,
            AttributeBehavior::Switch,
            Bounds::Unbounded,
            WireValue::Bool(false),
        ),
        Quantity::CurrentHeatingMode => Attribute::new(
            "current_heating_state",
            quantity,
            CharacteristicType::CurrentHeatingCoolingState,
            AttributeBehavior::EnumeratedMode,
            Bounds::ValidValues(HEATING_MODE_VALUES),
            WireValue::Uint8(0),
        ),
        Quantity::TargetHeatingMode => Attribute::new(
            "target_heating_state",
            quantity,
            CharacteristicType::TargetHeatingCoolingState,
            AttributeBehavior::EnumeratedMode,
            Bounds::ValidValues(HEATING_MODE_VALUES),
            WireValue::Uint8(0),
        ),
        Quantity::CurrentTemperature => Attribute::new(
            "current_temperature",
            quantity,
            CharacteristicType::CurrentTemperature,
            AttributeBehavior::BoundedFloat,
            CURRENT_TEMPERATURE_BOUNDS,
            WireValue::Float(19.0),
        ),
        Quantity::TargetTemperature => Attribute::new(
            "target_temperature",
            quantity,
            CharacteristicType::TargetTemperature,
            AttributeBehavior::BoundedFloat,
            TARGET_TEMPERATURE_BOUNDS,
            WireValue::Float(31.0),
        ),
    }
}

/// All attributes of the pool accessory, indexed by [`Quantity`].
pub struct Registry {
    attributes: Vec<Attribute>,
}

impl Registry {
    /// Declare every attribute with its default value.
    pub fn new() -> Self {
        Self {
            attributes: Quantity::iter().map(declare).collect(),
        }
    }

    /// The attribute for `quantity`.
    pub fn get(&self, quantity: Quantity) -> &Attribute {
        &self.attributes[quantity.index()]
    }

    /// Attributes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
