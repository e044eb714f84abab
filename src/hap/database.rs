//! JSON attribute database, the shape a HAP server returns for `GET /accessories`.

use super::accessory::{Accessory, Characteristic, Service};
use super::attribute::Bounds;
use super::types::Perm;
use super::value::{WireFormat, WireValue};
use crate::error::Result;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct AttributeDatabase {
    pub accessories: Vec<AccessoryEntry>,
}

#[derive(Debug, Serialize)]
pub struct AccessoryEntry {
    pub aid: u64,
    pub services: Vec<ServiceEntry>,
}

#[derive(Debug, Serialize)]
pub struct ServiceEntry {
    pub iid: u64,
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub primary: bool,
    pub characteristics: Vec<CharacteristicEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacteristicEntry {
    pub iid: u64,
    #[serde(rename = "type")]
    pub characteristic_type: String,
    pub format: WireFormat,
    pub perms: Vec<Perm>,
    /// Absent for write-only characteristics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<WireValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_step: Option<f32>,
    #[serde(rename = "valid-values", skip_serializing_if = "Option::is_none")]
    pub valid_values: Option<Vec<u8>>,
}

impl AttributeDatabase {
    /// Capture the accessory tree with its current values.
    pub fn snapshot(accessory: &Accessory) -> Self {
        Self {
            accessories: vec![AccessoryEntry {
                aid: accessory.aid(),
                services: accessory.services().iter().map(ServiceEntry::from).collect(),
            }],
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl From<&Service> for ServiceEntry {
    fn from(service: &Service) -> Self {
        Self {
            iid: service.iid(),
            service_type: service.service_type().short_hex(),
            primary: service.is_primary(),
            characteristics: service
                .characteristics()
                .iter()
                .map(CharacteristicEntry::from)
                .collect(),
        }
    }
}

impl From<&Characteristic> for CharacteristicEntry {
    fn from(characteristic: &Characteristic) -> Self {
        let (min_value, max_value, min_step, valid_values) = match characteristic.bounds() {
            Bounds::Unbounded => (None, None, None, None),
            Bounds::Range { min, max, step } => (Some(min), Some(max), Some(step), None),
            Bounds::ValidValues(valid) => (None, None, None, Some(valid.to_vec())),
        };

        Self {
            iid: characteristic.iid(),
            characteristic_type: characteristic.characteristic_type().short_hex(),
            format: characteristic.format(),
            perms: characteristic.perms().to_vec(),
            value: characteristic.value(),
            min_value,
            max_value,
            min_step,
            valid_values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::SyncEngine;
    use crate::config::Config;
    use crate::controller::SimulatedController;
    use crate::hap::notifier::Notification;
    use crate::hap::registry::Registry;
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn database_json() -> Value {
        let engine = SyncEngine::new(
            Arc::new(Registry::new()),
            Arc::new(SimulatedController::default()),
            Arc::new(|_: Notification| {}),
        );
        engine.prime();
        let accessory = Accessory::build(&Config::default().accessory, &engine);
        let text = AttributeDatabase::snapshot(&accessory).to_json().unwrap();
        serde_json::from_str(&text).unwrap()
    }

    fn characteristic(db: &Value, iid: u64) -> Value {
        db["accessories"][0]["services"]
            .as_array()
            .unwrap()
            .iter()
            .flat_map(|s| s["characteristics"].as_array().unwrap().iter())
            .find(|c| c["iid"] == json!(iid))
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_services_and_primary_flag() {
        let db = database_json();
        assert_eq!(db["accessories"][0]["aid"], json!(1));
        let services = db["accessories"][0]["services"].as_array().unwrap();
        assert_eq!(services.len(), 4);
        assert_eq!(services[0]["type"], json!("3E"));
        assert_eq!(services[1]["type"], json!("4A"));
        assert_eq!(services[1]["primary"], json!(true));
        assert!(services[2].get("primary").is_none());
    }

    #[test]
    fn test_target_temperature_entry() {
        let db = database_json();
        let target = characteristic(&db, 11);
        assert_eq!(
            target,
            json!({
                "iid": 11,
                "type": "35",
                "format": "float",
                "perms": ["pr", "pw", "ev"],
                "value": 31.0,
                "minValue": 10.0,
                "maxValue": 40.0,
                "minStep": 1.0
            })
        );
    }

    #[test]
    fn test_heating_mode_lists_valid_values() {
        let db = database_json();
        let mode = characteristic(&db, 13);
        assert_eq!(mode["type"], json!("33"));
        assert_eq!(mode["format"], json!("uint8"));
        assert_eq!(mode["valid-values"], json!([0, 1]));
    }

    #[test]
    fn test_identify_has_no_value() {
        let db = database_json();
        let identify = characteristic(&db, 7);
        assert_eq!(identify["perms"], json!(["pw"]));
        assert!(identify.get("value").is_none());
    }

    #[test]
    fn test_switch_entries() {
        let db = database_json();
        assert_eq!(characteristic(&db, 16)["value"], json!("Pool Power"));
        let pump = characteristic(&db, 20);
        assert_eq!(pump["type"], json!("25"));
        assert_eq!(pump["value"], json!(false));
    }
}
