//! HAP type definitions for the pool accessory.
//!
//! HomeKit identifies services and characteristics by UUIDs derived from the
//! Apple base UUID. Only the short code differs, so the catalogue below stores
//! the short code and expands it on demand.

use serde::Serialize;
use strum::{FromRepr, IntoStaticStr};
use uuid::Uuid;

/// Trailing 8 bytes shared by every Apple-defined HAP type.
const HAP_BASE_UUID_TAIL: [u8; 8] = [0x80, 0x00, 0x00, 0x26, 0xBB, 0x76, 0x52, 0x91];

/// Expand a HAP short type code to `0000XXXX-0000-1000-8000-0026BB765291`.
pub fn hap_uuid(short: u16) -> Uuid {
    Uuid::from_fields(u32::from(short), 0x0000, 0x1000, &HAP_BASE_UUID_TAIL)
}

/// Short form used in the attribute database (upper-case hex, no padding).
fn short_hex(short: u16) -> String {
    format!("{:X}", short)
}

/// HAP service types used by the pool accessory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr)]
#[repr(u16)]
pub enum ServiceType {
    /// Mandatory on every accessory (name, manufacturer, model, serial, firmware, identify)
    AccessoryInformation = 0x3E,
    /// Plain on/off switch
    Switch = 0x49,
    /// Heater/cooler with current and target temperature
    Thermostat = 0x4A,
}

impl ServiceType {
    pub const fn short_code(self) -> u16 {
        self as u16
    }

    pub fn uuid(self) -> Uuid {
        hap_uuid(self.short_code())
    }

    pub fn short_hex(self) -> String {
        short_hex(self.short_code())
    }
}

/// HAP characteristic types used by the pool accessory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, IntoStaticStr, Serialize)]
#[strum(serialize_all = "snake_case")]
#[repr(u16)]
pub enum CharacteristicType {
    CurrentHeatingCoolingState = 0x0F,
    CurrentTemperature = 0x11,
    Identify = 0x14,
    Manufacturer = 0x20,
    Model = 0x21,
    Name = 0x23,
    On = 0x25,
    SerialNumber = 0x30,
    TargetHeatingCoolingState = 0x33,
    TargetTemperature = 0x35,
    TemperatureDisplayUnits = 0x36,
    FirmwareRevision = 0x52,
}

impl CharacteristicType {
    pub const fn short_code(self) -> u16 {
        self as u16
    }

    pub fn uuid(self) -> Uuid {
        hap_uuid(self.short_code())
    }

    pub fn short_hex(self) -> String {
        short_hex(self.short_code())
    }
}

/// Accessory category advertised during pairing.
///
/// Only the categories relevant to this bridge are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr)]
#[repr(u8)]
pub enum AccessoryCategory {
    Other = 1,
    Bridge = 2,
    Switch = 8,
    Thermostat = 9,
}

impl AccessoryCategory {
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Characteristic permissions as they appear in the attribute database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Perm {
    /// Paired read
    #[serde(rename = "pr")]
    PairedRead,
    /// Paired write
    #[serde(rename = "pw")]
    PairedWrite,
    /// Event notifications
    #[serde(rename = "ev")]
    Events,
}
