//! Synchronization engine between the pool controller and the HAP attributes.
//!
//! State flow:
//! - Outbound: controller event → `get_X()` → cache → notification
//! - Inbound: HAP write → format check → bounds check → `set_X()` → cache
//!
//! The engine is the only writer of attribute caches. Inbound writes do not
//! notify on their own; the controller's confirming event does. A controller
//! getter that raises an event for its own quantity while being pulled is not
//! followed back into the engine.

use super::handle::AttributeHandle;
use crate::controller::{ControllerAdapter, DomainValue, Quantity};
use crate::error::{BridgeError, Result};
use crate::hap::attribute::Attribute;
use crate::hap::notifier::{Notification, NotificationSink};
use crate::hap::registry::Registry;
use crate::hap::validation::{to_wire, validate_and_coerce};
use crate::hap::value::WireValue;
use log::{debug, error, info, warn};
use std::cell::Cell;
use std::sync::Arc;
use std::time::Duration;

/// How long an inbound write waits for a concurrent write on the same attribute.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(250);

thread_local! {
    /// Bit per quantity whose getter is running on this thread
    static PULLING: Cell<u32> = const { Cell::new(0) };
}

/// Marks a quantity as being pulled on the current thread until dropped.
struct PullGuard {
    bit: u32,
}

impl PullGuard {
    fn enter(quantity: Quantity) -> Option<Self> {
        let bit = 1 << quantity.index();
        PULLING.with(|pulling| {
            let current = pulling.get();
            if current & bit != 0 {
                return None;
            }
            pulling.set(current | bit);
            Some(Self { bit })
        })
    }

    fn is_pulling(quantity: Quantity) -> bool {
        PULLING.with(|pulling| pulling.get() & (1 << quantity.index()) != 0)
    }
}

impl Drop for PullGuard {
    fn drop(&mut self) {
        PULLING.with(|pulling| pulling.set(pulling.get() & !self.bit));
    }
}

/// Bidirectional state bridge.
///
/// # Example
/// ```ignore
/// let (notifier, mut events) = ChannelNotifier::channel();
/// let engine = SyncEngine::new(Arc::new(Registry::new()), controller, Arc::new(notifier));
/// engine.prime();
///
/// // HAP server write path
/// engine.write(Quantity::TargetTemperature, WireValue::Float(28.0))?;
/// ```
pub struct SyncEngine {
    registry: Arc<Registry>,
    controller: Arc<dyn ControllerAdapter>,
    sink: Arc<dyn NotificationSink>,
    write_timeout: Duration,
}

impl SyncEngine {
    /// Create an engine and register it as the controller's event pusher.
    pub fn new(
        registry: Arc<Registry>,
        controller: Arc<dyn ControllerAdapter>,
        sink: Arc<dyn NotificationSink>,
    ) -> Arc<Self> {
        Self::with_write_timeout(registry, controller, sink, DEFAULT_WRITE_TIMEOUT)
    }

    /// Like [`new`](Self::new) with a custom bound on inbound write contention.
    pub fn with_write_timeout(
        registry: Arc<Registry>,
        controller: Arc<dyn ControllerAdapter>,
        sink: Arc<dyn NotificationSink>,
        write_timeout: Duration,
    ) -> Arc<Self> {
        let engine = Arc::new(Self {
            registry,
            controller: controller.clone(),
            sink,
            write_timeout,
        });

        // Wire up the pusher so the controller can push state changes to HAP
        let engine_weak = Arc::downgrade(&engine);
        controller.set_event_pusher(Arc::new(move |quantity| {
            if let Some(engine) = engine_weak.upgrade() {
                engine.on_controller_event(quantity);
            }
        }));

        engine
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn controller(&self) -> &Arc<dyn ControllerAdapter> {
        &self.controller
    }

    /// Protocol-facing handle for `quantity`'s attribute.
    pub fn handle(self: &Arc<Self>, quantity: Quantity) -> AttributeHandle {
        AttributeHandle::new(self.clone(), quantity)
    }

    /// Load every cache from the controller without notifying.
    ///
    /// Called once at startup, before the HAP server accepts subscriptions.
    pub fn prime(&self) {
        for attr in self.registry.iter() {
            if let Err(e) = attr.refresh(|| self.pull(attr), |_| {}) {
                warn!("[HAP] Keeping default {} = {}: {}", attr.name(), attr.value(), e);
            }
        }
    }

    /// Outbound path: the controller reported a change of `quantity`.
    ///
    /// Always emits one notification, even if the value is unchanged. A value
    /// the attribute cannot hold is dropped with a warning.
    pub fn on_controller_event(&self, quantity: Quantity) {
        let attr = self.registry.get(quantity);
        if PullGuard::is_pulling(quantity) {
            debug!("[HAP] Ignoring {} event raised by its own getter", attr.name());
            return;
        }

        let result = attr.refresh(
            || self.pull(attr),
            |value| {
                debug!("[HAP] Notify {} = {}", attr.name(), value);
                self.sink.notify(Notification {
                    quantity,
                    characteristic_type: attr.characteristic_type(),
                    value: value.clone(),
                });
            },
        );

        if let Err(e) = result {
            warn!("[HAP] Ignoring {} change: {}", attr.name(), e);
        }
    }

    /// Inbound path: the HAP server wrote `value` to `quantity`'s attribute.
    ///
    /// On success the controller has been told and the cache holds the
    /// accepted value, or a newer value the controller reported meanwhile.
    /// On failure neither was touched.
    pub fn write(&self, quantity: Quantity, value: WireValue) -> Result<DomainValue> {
        let attr = self.registry.get(quantity);
        let result = self.apply_write(attr, &value);

        match &result {
            Ok(domain) => info!("[HAP] {}_set({})", attr.name(), domain),
            // Already reported by the validation layer
            Err(BridgeError::RejectedFormat { .. }) => {}
            Err(e) if e.is_rejection() => {
                warn!("[HAP] Rejected {} write of {}: {}", attr.name(), value, e)
            }
            Err(e) => error!("[Controller] {}", e),
        }

        result
    }

    /// Getter path: consistent snapshot of the cached value.
    pub fn read(&self, quantity: Quantity) -> WireValue {
        let attr = self.registry.get(quantity);
        let value = attr.value();
        debug!("[HAP] {}_get({})", attr.name(), value);
        value
    }

    /// Identify request from the HAP client. No state changes.
    pub fn identify(&self) {
        info!("[HAP] Accessory identify");
    }

    fn apply_write(&self, attr: &Attribute, value: &WireValue) -> Result<DomainValue> {
        if !attr.is_writable() {
            return Err(BridgeError::ReadOnly(attr.name()));
        }

        let _guard = attr
            .lock_for_write(self.write_timeout)
            .ok_or(BridgeError::AttributeBusy(attr.name()))?;

        let domain = validate_and_coerce(attr, value)?;
        attr.bounds().check(attr.name(), value)?;
        let accepted = to_wire(attr, domain)?;

        // Events raised after the mutator ran carry newer tickets and win
        let ticket = attr.ticket();
        self.controller.write(attr.quantity(), domain)?;
        if !attr.store_observed(ticket, accepted) {
            debug!(
                "[HAP] {} superseded by controller event, keeping {}",
                attr.name(),
                attr.value()
            );
        }
        Ok(domain)
    }

    fn pull(&self, attr: &Attribute) -> Result<WireValue> {
        let quantity = attr.quantity();
        let _guard = PullGuard::enter(quantity).ok_or(BridgeError::AttributeBusy(attr.name()))?;
        to_wire(attr, self.controller.read(quantity))
    }
}
