//! Accessory topology for the HAP server.
//!
//! The accessory tree is built once at startup from the registry and the
//! accessory configuration, then handed to the HAP server. The tree itself
//! never changes afterwards; attribute values keep changing through the sync
//! engine.
//!
//! Layout (aid 1, category Thermostat):
//! - AccessoryInformation: name, manufacturer, serial, model, firmware, identify
//! - Thermostat (primary): name, current/target temperature, current/target
//!   heating state, display units
//! - Switch: name, power
//! - Switch: name, pump

use super::attribute::Bounds;
use super::types::{AccessoryCategory, CharacteristicType, Perm, ServiceType};
use super::value::{WireFormat, WireValue};
use crate::bridge::{AttributeHandle, SyncEngine};
use crate::config::AccessoryConfig;
use crate::controller::Quantity;
use crate::error::{BridgeError, Result};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// TemperatureDisplayUnits value for Celsius.
const DISPLAY_UNITS_CELSIUS: u8 = 0;

/// Where a characteristic's value comes from.
enum CharacteristicSource {
    /// Fixed at build time (identity strings, names, display units)
    Static(WireValue),
    /// Backed by a registry attribute through the sync engine
    Attribute(AttributeHandle),
    /// Write-only identify action
    Identify,
}

/// A characteristic with its instance id.
pub struct Characteristic {
    iid: u64,
    characteristic_type: CharacteristicType,
    format: WireFormat,
    perms: Vec<Perm>,
    bounds: Bounds,
    source: CharacteristicSource,
}

impl Characteristic {
    pub fn iid(&self) -> u64 {
        self.iid
    }

    pub fn characteristic_type(&self) -> CharacteristicType {
        self.characteristic_type
    }

    pub fn format(&self) -> WireFormat {
        self.format
    }

    pub fn perms(&self) -> &[Perm] {
        &self.perms
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// The quantity behind this characteristic, if it is attribute-backed.
    pub fn quantity(&self) -> Option<Quantity> {
        match &self.source {
            CharacteristicSource::Attribute(handle) => Some(handle.quantity()),
            _ => None,
        }
    }

    /// Current value. `None` for write-only characteristics.
    pub fn value(&self) -> Option<WireValue> {
        match &self.source {
            CharacteristicSource::Static(value) => Some(value.clone()),
            CharacteristicSource::Attribute(handle) => Some(handle.get()),
            CharacteristicSource::Identify => None,
        }
    }

    fn name(&self) -> &'static str {
        match &self.source {
            CharacteristicSource::Attribute(handle) => handle.attribute().name(),
            _ => self.characteristic_type.into(),
        }
    }
}

/// A group of characteristics for one function of the accessory.
pub struct Service {
    iid: u64,
    service_type: ServiceType,
    primary: bool,
    characteristics: Vec<Characteristic>,
}

impl Service {
    pub fn iid(&self) -> u64 {
        self.iid
    }

    pub fn service_type(&self) -> ServiceType {
        self.service_type
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn characteristics(&self) -> &[Characteristic] {
        &self.characteristics
    }

    /// Value of the service's Name characteristic.
    pub fn name(&self) -> Option<String> {
        self.characteristics
            .iter()
            .find(|c| c.characteristic_type == CharacteristicType::Name)
            .and_then(|c| match c.value() {
                Some(WireValue::String(name)) => Some(name),
                _ => None,
            })
    }
}

/// The pool accessory as exposed to HomeKit.
pub struct Accessory {
    aid: u64,
    category: AccessoryCategory,
    services: Vec<Service>,
    engine: Arc<SyncEngine>,
}

impl Accessory {
    /// Accessory id of the pool accessory (a standalone accessory is always 1).
    pub const AID: u64 = 1;

    /// Build the accessory tree.
    pub fn build(config: &AccessoryConfig, engine: &Arc<SyncEngine>) -> Self {
        let mut ids = IidAllocator::default();

        let information = ServiceBuilder::new(&mut ids, ServiceType::AccessoryInformation)
            .with_static(CharacteristicType::Name, config.name.as_str())
            .with_static(CharacteristicType::Manufacturer, config.manufacturer.as_str())
            .with_static(CharacteristicType::SerialNumber, config.serial_number.as_str())
            .with_static(CharacteristicType::Model, config.model.as_str())
            .with_static(
                CharacteristicType::FirmwareRevision,
                config.firmware_revision.as_str(),
            )
            .with_identify()
            .build();

        let thermostat = ServiceBuilder::new(&mut ids, ServiceType::Thermostat)
            .primary()
            .with_static(CharacteristicType::Name, config.heater_name.as_str())
            .with_attribute(engine.handle(Quantity::CurrentTemperature))
            .with_attribute(engine.handle(Quantity::TargetTemperature))
            .with_attribute(engine.handle(Quantity::CurrentHeatingMode))
            .with_attribute(engine.handle(Quantity::TargetHeatingMode))
            .with_static(
                CharacteristicType::TemperatureDisplayUnits,
                DISPLAY_UNITS_CELSIUS,
            )
            .build();

        let power = ServiceBuilder::new(&mut ids, ServiceType::Switch)
            .with_static(CharacteristicType::Name, config.power_switch_name.as_str())
            .with_attribute(engine.handle(Quantity::Power))
            .build();

        let pump = ServiceBuilder::new(&mut ids, ServiceType::Switch)
            .with_static(CharacteristicType::Name, config.pump_switch_name.as_str())
            .with_attribute(engine.handle(Quantity::Pump))
            .build();

        Self {
            aid: Self::AID,
            category: AccessoryCategory::Thermostat,
            services: vec![information, thermostat, power, pump],
            engine: engine.clone(),
        }
    }

    pub fn aid(&self) -> u64 {
        self.aid
    }

    pub fn category(&self) -> AccessoryCategory {
        self.category
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// Every characteristic in iid order.
    pub fn characteristics(&self) -> impl Iterator<Item = &Characteristic> {
        self.services.iter().flat_map(|s| s.characteristics.iter())
    }

    pub fn characteristic(&self, iid: u64) -> Option<&Characteristic> {
        self.characteristics().find(|c| c.iid == iid)
    }

    /// Instance id of the characteristic backed by `quantity`.
    pub fn iid_of(&self, quantity: Quantity) -> Option<u64> {
        self.characteristics()
            .find(|c| c.quantity() == Some(quantity))
            .map(|c| c.iid)
    }

    /// Read by instance id, as the HAP server does for `GET /characteristics`.
    pub fn read(&self, iid: u64) -> Result<WireValue> {
        let characteristic = self
            .characteristic(iid)
            .ok_or(BridgeError::UnknownInstance(iid))?;
        characteristic
            .value()
            .ok_or(BridgeError::WriteOnly(characteristic.name()))
    }

    /// Write by instance id, as the HAP server does for `PUT /characteristics`.
    pub fn write(&self, iid: u64, value: WireValue) -> Result<()> {
        let characteristic = self
            .characteristic(iid)
            .ok_or(BridgeError::UnknownInstance(iid))?;

        match &characteristic.source {
            CharacteristicSource::Attribute(handle) => handle.try_set(value).map(|_| ()),
            CharacteristicSource::Identify => {
                if value.format() != WireFormat::Bool {
                    return Err(BridgeError::RejectedFormat {
                        attribute: characteristic.name(),
                        expected: WireFormat::Bool,
                        received: value.format(),
                    });
                }
                self.identify();
                Ok(())
            }
            CharacteristicSource::Static(_) => Err(BridgeError::ReadOnly(characteristic.name())),
        }
    }

    /// Identify action. Logs only.
    pub fn identify(&self) {
        self.engine.identify();
    }

    /// Hash of the tree's structure (types, iids, formats, permissions).
    ///
    /// Identity strings and values are not part of the hash. The digest is
    /// SHA-256 over a fixed byte layout, so it only changes when the tree
    /// does; a HAP server bumps its configuration number when it changes.
    pub fn schema_hash(&self) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update(self.aid.to_be_bytes());
        hasher.update([self.category.code()]);
        hasher.update((self.services.len() as u32).to_be_bytes());
        for service in &self.services {
            hasher.update(service.iid.to_be_bytes());
            hasher.update(service.service_type.short_code().to_be_bytes());
            hasher.update([u8::from(service.primary)]);
            hasher.update((service.characteristics.len() as u32).to_be_bytes());
            for characteristic in &service.characteristics {
                hasher.update(characteristic.iid.to_be_bytes());
                hasher.update(characteristic.characteristic_type.short_code().to_be_bytes());
                hasher.update(characteristic.format.to_string().as_bytes());
                hasher.update([0]);
                hasher.update([characteristic.perms.len() as u8]);
                for perm in &characteristic.perms {
                    hasher.update([*perm as u8]);
                }
            }
        }

        let digest = hasher.finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(head)
    }
}

/// Sequential instance ids shared by services and characteristics.
#[derive(Default)]
struct IidAllocator {
    last: u64,
}

impl IidAllocator {
    fn next(&mut self) -> u64 {
        self.last += 1;
        self.last
    }
}

struct ServiceBuilder<'a> {
    ids: &'a mut IidAllocator,
    service: Service,
}

impl<'a> ServiceBuilder<'a> {
    fn new(ids: &'a mut IidAllocator, service_type: ServiceType) -> Self {
        let iid = ids.next();
        Self {
            ids,
            service: Service {
                iid,
                service_type,
                primary: false,
                characteristics: Vec::new(),
            },
        }
    }

    fn primary(mut self) -> Self {
        self.service.primary = true;
        self
    }

    fn with_static(self, characteristic_type: CharacteristicType, value: impl Into<WireValue>) -> Self {
        let value = value.into();
        let format = value.format();
        self.push(
            characteristic_type,
            format,
            vec![Perm::PairedRead],
            Bounds::Unbounded,
            CharacteristicSource::Static(value),
        )
    }

    fn with_attribute(self, handle: AttributeHandle) -> Self {
        let attribute = handle.attribute();
        let perms = if attribute.is_writable() {
            vec![Perm::PairedRead, Perm::PairedWrite, Perm::Events]
        } else {
            vec![Perm::PairedRead, Perm::Events]
        };
        let characteristic_type = attribute.characteristic_type();
        let format = attribute.format();
        let bounds = attribute.bounds();
        self.push(
            characteristic_type,
            format,
            perms,
            bounds,
            CharacteristicSource::Attribute(handle),
        )
    }

    fn with_identify(self) -> Self {
        self.push(
            CharacteristicType::Identify,
            WireFormat::Bool,
            vec![Perm::PairedWrite],
            Bounds::Unbounded,
            CharacteristicSource::Identify,
        )
    }

    fn push(
        mut self,
        characteristic_type: CharacteristicType,
        format: WireFormat,
        perms: Vec<Perm>,
        bounds: Bounds,
        source: CharacteristicSource,
    ) -> Self {
        let iid = self.ids.next();
        self.service.characteristics.push(Characteristic {
            iid,
            characteristic_type,
            format,
            perms,
            bounds,
            source,
        });
        self
    }

    fn build(self) -> Service {
        self.service
    }
}
