//! Controller adapter boundary.
//!
//! The pool controller owns the physical relays, the heater and the
//! temperature sensor. The bridge only talks to it through [`ControllerAdapter`]:
//! pull accessors for every quantity, push mutators for the writable ones, and
//! a pusher callback the controller calls whenever one of its quantities
//! changes on its own.

pub mod simulated;

pub use simulated::{SimulatedController, run_simulation};

use crate::error::{BridgeError, Result};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use strum::{Display, EnumCount, EnumIter, IntoStaticStr};

/// A quantity owned by the pool controller.
///
/// Each quantity maps to exactly one exposed attribute.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumCount, IntoStaticStr, Serialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    /// Main power relay
    Power,
    /// Circulation pump relay
    Pump,
    /// Whether the heater is currently running (driven by the controller)
    CurrentHeatingMode,
    /// Whether heating is requested
    TargetHeatingMode,
    /// Measured water temperature in °C (driven by the sensor)
    CurrentTemperature,
    /// Heating setpoint in °C
    TargetTemperature,
}

impl Quantity {
    /// Whether the bridge may push this quantity to the controller.
    pub const fn is_writable(self) -> bool {
        matches!(
            self,
            Self::Power | Self::Pump | Self::TargetHeatingMode | Self::TargetTemperature
        )
    }

    /// Position in registry order.
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Controller-native value of a quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DomainValue {
    /// Relay state or heating mode (false = off, true = on/heat)
    Flag(bool),
    /// Whole degrees Celsius
    Degrees(i32),
}

impl fmt::Display for DomainValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(b) => write!(f, "{}", u8::from(*b)),
            Self::Degrees(d) => write!(f, "{}", d),
        }
    }
}

/// Callback the controller invokes when a quantity changed on its side.
pub type EventPusher = Arc<dyn Fn(Quantity) + Send + Sync>;

/// Point-in-time view of every controller quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ControllerSnapshot {
    pub power: bool,
    pub pump: bool,
    pub current_heating_mode: bool,
    pub target_heating_mode: bool,
    pub current_temperature: i32,
    pub target_temperature: i32,
}

/// Narrow interface to the physical pool controller.
///
/// Getters return the last authoritative value synchronously. Setters cause
/// physical actuation and perform no validation; the bridge validates first.
/// A setter that could not actuate returns [`BridgeError::ActuationFailure`].
///
/// # Events
/// The bridge registers a pusher via [`set_event_pusher`](Self::set_event_pusher)
/// during startup. Call it with the changed quantity whenever the controller
/// state changes, including as confirmation after a setter ran.
pub trait ControllerAdapter: Send + Sync + 'static {
    fn get_power(&self) -> bool;
    fn set_power(&self, on: bool) -> Result<()>;

    fn get_pump(&self) -> bool;
    fn set_pump(&self, on: bool) -> Result<()>;

    fn get_current_heating_mode(&self) -> bool;

    fn get_target_heating_mode(&self) -> bool;
    fn set_target_heating_mode(&self, heat: bool) -> Result<()>;

    fn get_current_temperature(&self) -> i32;

    fn get_target_temperature(&self) -> i32;
    fn set_target_temperature(&self, celsius: i32) -> Result<()>;

    /// Register the callback used to report controller-originated changes.
    fn set_event_pusher(&self, pusher: EventPusher);

    /// Pull the current value of `quantity`.
    fn read(&self, quantity: Quantity) -> DomainValue {
        match quantity {
            Quantity::Power => DomainValue::Flag(self.get_power()),
            Quantity::Pump => DomainValue::Flag(self.get_pump()),
            Quantity::CurrentHeatingMode => DomainValue::Flag(self.get_current_heating_mode()),
            Quantity::TargetHeatingMode => DomainValue::Flag(self.get_target_heating_mode()),
            Quantity::CurrentTemperature => DomainValue::Degrees(self.get_current_temperature()),
            Quantity::TargetTemperature => DomainValue::Degrees(self.get_target_temperature()),
        }
    }

    /// Push `value` to `quantity`'s mutator.
    fn write(&self, quantity: Quantity, value: DomainValue) -> Result<()> {
        let name: &'static str = quantity.into();
        match (quantity, value) {
            (Quantity::Power, DomainValue::Flag(on)) => self.set_power(on),
            (Quantity::Pump, DomainValue::Flag(on)) => self.set_pump(on),
            (Quantity::TargetHeatingMode, DomainValue::Flag(heat)) => {
                self.set_target_heating_mode(heat)
            }
            (Quantity::TargetTemperature, DomainValue::Degrees(c)) => {
                self.set_target_temperature(c)
            }
            (Quantity::CurrentHeatingMode | Quantity::CurrentTemperature, _) => {
                Err(BridgeError::ReadOnly(name))
            }
            (_, value) => Err(BridgeError::ActuationFailure {
                attribute: name,
                reason: format!("value {} has the wrong kind", value),
            }),
        }
    }

    /// Read every quantity.
    fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            power: self.get_power(),
            pump: self.get_pump(),
            current_heating_mode: self.get_current_heating_mode(),
            target_heating_mode: self.get_target_heating_mode(),
            current_temperature: self.get_current_temperature(),
            target_temperature: self.get_target_temperature(),
        }
    }
}
