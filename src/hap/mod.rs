//! HAP-facing side of the bridge: typed attributes, validation, notifications
//! and the accessory tree served to HomeKit.

pub mod accessory;
pub mod attribute;
pub mod behavior;
pub mod database;
pub mod notifier;
pub mod registry;
pub mod types;
pub mod validation;
pub mod value;

pub use accessory::{Accessory, Characteristic, Service};
pub use attribute::{Attribute, Bounds};
pub use behavior::AttributeBehavior;
pub use database::AttributeDatabase;
pub use notifier::{ChannelNotifier, Notification, NotificationSink};
pub use registry::Registry;
pub use types::{AccessoryCategory, CharacteristicType, Perm, ServiceType};
pub use value::{WireFormat, WireValue};
