//! Per-attribute getter/setter handed to the HAP server.

use super::engine::SyncEngine;
use crate::controller::{DomainValue, Quantity};
use crate::error::Result;
use crate::hap::attribute::Attribute;
use crate::hap::value::WireValue;
use std::fmt;
use std::sync::Arc;

/// Getter/setter pair for one attribute.
///
/// The HAP server calls `get()` when a client reads the characteristic and
/// `set()` when a client writes it. `set()` returns nothing: a rejected write
/// is logged and otherwise treated as a no-op by the server.
#[derive(Clone)]
pub struct AttributeHandle {
    engine: Arc<SyncEngine>,
    quantity: Quantity,
}

impl AttributeHandle {
    pub fn new(engine: Arc<SyncEngine>, quantity: Quantity) -> Self {
        Self { engine, quantity }
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn attribute(&self) -> &Attribute {
        self.engine.registry().get(self.quantity)
    }

    /// Current cached value.
    pub fn get(&self) -> WireValue {
        self.engine.read(self.quantity)
    }

    /// Write from the HAP server. Failures are only logged.
    pub fn set(&self, value: WireValue) {
        let _ = self.engine.write(self.quantity, value);
    }

    /// Write and report the outcome.
    pub fn try_set(&self, value: WireValue) -> Result<DomainValue> {
        self.engine.write(self.quantity, value)
    }
}

impl fmt::Debug for AttributeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeHandle")
            .field("attribute", &self.attribute().name())
            .finish()
    }
}
