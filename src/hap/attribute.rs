//! Typed attribute state for HAP characteristics.
//!
//! An [`Attribute`] holds its declaration (name, characteristic type, format,
//! bounds) plus the cached last-known value. The cache can be read from any
//! thread; only the sync engine writes it.
//!
//! Controller observations are ordered by a per-attribute ticket taken before
//! the controller is asked. A store carrying an older ticket than the one the
//! slot already holds is stale and is discarded, so the cache never moves
//! back to a value the controller has since replaced.

use super::behavior::AttributeBehavior;
use super::types::CharacteristicType;
use super::value::{WireFormat, WireValue};
use crate::controller::Quantity;
use crate::error::{BridgeError, Result};
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Value constraints declared for an attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bounds {
    /// Any value of the declared format
    Unbounded,
    /// Inclusive numeric range with a display step
    Range { min: f32, max: f32, step: f32 },
    /// Enumerated `uint8` values
    ValidValues(&'static [u8]),
}

impl Bounds {
    /// Reject `value` if it violates these bounds.
    ///
    /// Values are checked as received, before any rounding. NaN never passes a
    /// range. Non-numeric values are not subject to numeric bounds.
    pub fn check(&self, attribute: &'static str, value: &WireValue) -> Result<()> {
        let out_of_bounds = || BridgeError::OutOfBounds {
            attribute,
            value: value.to_string(),
        };

        match self {
            Self::Unbounded => Ok(()),
            Self::Range { min, max, .. } => match value.as_number() {
                Some(n) if n.is_nan() || n < f64::from(*min) || n > f64::from(*max) => {
                    Err(out_of_bounds())
                }
                _ => Ok(()),
            },
            Self::ValidValues(valid) => match value {
                WireValue::Uint8(v) if !valid.contains(v) => Err(out_of_bounds()),
                _ => Ok(()),
            },
        }
    }
}

struct Slot {
    value: WireValue,
    version: u32,
    /// Ticket of the observation the value came from
    ticket: u64,
}

/// A single typed, remotely visible value.
pub struct Attribute {
    name: &'static str,
    quantity: Quantity,
    characteristic_type: CharacteristicType,
    behavior: AttributeBehavior,
    bounds: Bounds,
    default: WireValue,
    slot: RwLock<Slot>,
    /// Last ticket handed out
    tickets: AtomicU64,
    /// Serializes inbound writes on this attribute
    write_guard: Mutex<()>,
}

impl Attribute {
    /// Declare an attribute. `default` must match the behavior's format and bounds.
    pub fn new(
        name: &'static str,
        quantity: Quantity,
        characteristic_type: CharacteristicType,
        behavior: AttributeBehavior,
        bounds: Bounds,
        default: WireValue,
    ) -> Self {
        debug_assert_eq!(default.format(), behavior.format());
        debug_assert!(bounds.check(name, &default).is_ok());
        Self {
            name,
            quantity,
            characteristic_type,
            behavior,
            bounds,
            default: default.clone(),
            slot: RwLock::new(Slot {
                value: default,
                version: 0,
                ticket: 0,
            }),
            tickets: AtomicU64::new(0),
            write_guard: Mutex::new(()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn characteristic_type(&self) -> CharacteristicType {
        self.characteristic_type
    }

    pub fn behavior(&self) -> AttributeBehavior {
        self.behavior
    }

    pub fn format(&self) -> WireFormat {
        self.behavior.format()
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn default_value(&self) -> &WireValue {
        &self.default
    }

    /// Whether the attribute has a setter (pushes to the controller).
    pub fn is_writable(&self) -> bool {
        self.quantity.is_writable()
    }

    /// Consistent snapshot of the cached value.
    pub fn value(&self) -> WireValue {
        self.slot.read().value.clone()
    }

    /// Incremented each time the cached value changes.
    pub fn version(&self) -> u32 {
        self.slot.read().version
    }

    /// Claim a ticket for an observation of the controller that is about to happen.
    pub(crate) fn ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Store `value` observed under `ticket`.
    ///
    /// Returns false without touching the cache when a newer observation has
    /// already been stored.
    pub(crate) fn store_observed(&self, ticket: u64, value: WireValue) -> bool {
        let mut slot = self.slot.write();
        Self::apply(&mut slot, ticket, value)
    }

    /// Pull a fresh value, store it and notify.
    ///
    /// `pull` runs without any lock held. Store and `notify` run under the
    /// slot's write lock, so notifications leave in the order the cache was
    /// written. A stale pull (overtaken by a newer observation) notifies the
    /// newer cached value instead. A pulled value outside the declared bounds
    /// is not stored and `notify` is not called.
    pub(crate) fn refresh<P, N>(&self, pull: P, notify: N) -> Result<WireValue>
    where
        P: FnOnce() -> Result<WireValue>,
        N: FnOnce(&WireValue),
    {
        let ticket = self.ticket();
        let value = pull()?;
        self.bounds.check(self.name, &value)?;

        let mut slot = self.slot.write();
        Self::apply(&mut slot, ticket, value);
        notify(&slot.value);
        Ok(slot.value.clone())
    }

    /// Acquire the write guard, giving up after `timeout`.
    pub(crate) fn lock_for_write(&self, timeout: Duration) -> Option<MutexGuard<'_, ()>> {
        self.write_guard.try_lock_for(timeout)
    }

    fn apply(slot: &mut Slot, ticket: u64, value: WireValue) -> bool {
        if ticket < slot.ticket {
            return false;
        }
        slot.ticket = ticket;
        if slot.value != value {
            slot.value = value;
            slot.version = slot.version.wrapping_add(1);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target_temperature() -> Attribute {
        Attribute::new(
            "target_temperature",
            Quantity::TargetTemperature,
            CharacteristicType::TargetTemperature,
            AttributeBehavior::BoundedFloat,
            Bounds::Range {
                min: 10.0,
                max: 40.0,
                step: 1.0,
            },
            WireValue::Float(31.0),
        )
    }

    #[test]
    fn test_initial_state() {
        let attr = target_temperature();
        assert_eq!(attr.value(), WireValue::Float(31.0));
        assert_eq!(attr.version(), 0);
        assert_eq!(attr.format(), WireFormat::Float);
        assert!(attr.is_writable());
    }

    #[test]
    fn test_store_increments_version_on_change() {
        let attr = target_temperature();
        assert!(attr.store_observed(attr.ticket(), WireValue::Float(25.0)));
        assert_eq!(attr.version(), 1);

        // Same value doesn't increment
        assert!(attr.store_observed(attr.ticket(), WireValue::Float(25.0)));
        assert_eq!(attr.version(), 1);

        assert!(attr.store_observed(attr.ticket(), WireValue::Float(26.0)));
        assert_eq!(attr.version(), 2);
    }

    #[test]
    fn test_stale_observation_is_discarded() {
        let attr = target_temperature();
        let older = attr.ticket();
        let newer = attr.ticket();

        assert!(attr.store_observed(newer, WireValue::Float(25.0)));
        assert!(!attr.store_observed(older, WireValue::Float(20.0)));
        assert_eq!(attr.value(), WireValue::Float(25.0));
        assert_eq!(attr.version(), 1);
    }

    #[test]
    fn test_refresh_overtaken_by_newer_observation() {
        let attr = target_temperature();
        let mut seen = None;

        // The slot stays readable and writable while the controller is pulled
        let value = attr
            .refresh(
                || {
                    assert_eq!(attr.value(), WireValue::Float(31.0));
                    attr.store_observed(attr.ticket(), WireValue::Float(30.0));
                    Ok(WireValue::Float(20.0))
                },
                |v| seen = Some(v.clone()),
            )
            .unwrap();

        assert_eq!(value, WireValue::Float(30.0));
        assert_eq!(seen, Some(WireValue::Float(30.0)));
        assert_eq!(attr.value(), WireValue::Float(30.0));
    }

    #[test]
    fn test_range_bounds() {
        let bounds = Bounds::Range {
            min: 10.0,
            max: 40.0,
            step: 1.0,
        };
        assert!(bounds.check("t", &WireValue::Float(10.0)).is_ok());
        assert!(bounds.check("t", &WireValue::Float(40.0)).is_ok());
        assert!(bounds.check("t", &WireValue::Float(45.0)).is_err());
        assert!(bounds.check("t", &WireValue::Float(9.9)).is_err());
        assert!(bounds.check("t", &WireValue::Float(40.4)).is_err());
        assert!(bounds.check("t", &WireValue::Float(f32::NAN)).is_err());
    }

    #[test]
    fn test_valid_values_bounds() {
        let bounds = Bounds::ValidValues(&[0, 1]);
        assert!(bounds.check("m", &WireValue::Uint8(1)).is_ok());
        let err = bounds.check("m", &WireValue::Uint8(3)).unwrap_err();
        assert_eq!(err.to_string(), "m value 3 is out of bounds");
    }

    #[test]
    fn test_refresh_notifies_with_stored_value() {
        let attr = target_temperature();
        let mut seen = None;
        let value = attr
            .refresh(|| Ok(WireValue::Float(28.0)), |v| seen = Some(v.clone()))
            .unwrap();
        assert_eq!(value, WireValue::Float(28.0));
        assert_eq!(seen, Some(WireValue::Float(28.0)));
        assert_eq!(attr.value(), WireValue::Float(28.0));
    }

    #[test]
    fn test_refresh_rejects_out_of_bounds_pull() {
        let attr = target_temperature();
        let mut notified = false;
        let result = attr.refresh(|| Ok(WireValue::Float(55.0)), |_| notified = true);
        assert!(matches!(result, Err(BridgeError::OutOfBounds { .. })));
        assert!(!notified);
        assert_eq!(attr.value(), WireValue::Float(31.0));
    }

    #[test]
    fn test_write_guard_is_exclusive() {
        let attr = target_temperature();
        let guard = attr.lock_for_write(Duration::from_millis(10));
        assert!(guard.is_some());
        assert!(attr.lock_for_write(Duration::from_millis(10)).is_none());
        drop(guard);
        assert!(attr.lock_for_write(Duration::from_millis(10)).is_some());
    }
}
