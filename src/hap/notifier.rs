//! Change notifications towards the HAP server.
//!
//! When a cached attribute value changes on the controller side, the HAP
//! server must push an event to every subscribed client. The sync engine hands
//! each change to a [`NotificationSink`]; the server side drains it.

use super::types::CharacteristicType;
use super::value::WireValue;
use crate::controller::Quantity;
use log::debug;
use serde::Serialize;
use tokio::sync::mpsc;

/// One attribute change, in the order the cache was written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    /// Attribute handle
    pub quantity: Quantity,
    pub characteristic_type: CharacteristicType,
    pub value: WireValue,
}

/// Receiver of attribute change notifications.
///
/// Implementations must not block: `notify` is called while the attribute's
/// cache slot is locked.
pub trait NotificationSink: Send + Sync + 'static {
    fn notify(&self, notification: Notification);
}

impl<F> NotificationSink for F
where
    F: Fn(Notification) + Send + Sync + 'static,
{
    fn notify(&self, notification: Notification) {
        self(notification)
    }
}

/// Sink backed by an unbounded tokio channel.
///
/// Sending never blocks. If the receiving side has gone away the
/// notification is dropped and logged at debug level.
///
/// # Example
/// ```ignore
/// let (notifier, mut rx) = ChannelNotifier::channel();
/// let engine = SyncEngine::new(registry, controller, Arc::new(notifier));
/// while let Some(n) = rx.recv().await {
///     server.send_event(n);
/// }
/// ```
#[derive(Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new(sender: mpsc::UnboundedSender<Notification>) -> Self {
        Self { sender }
    }

    /// Create a notifier together with its receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl NotificationSink for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        if let Err(e) = self.sender.send(notification) {
            debug!("[HAP] Dropping notification for {}: receiver closed", e.0.quantity);
        }
    }
}
