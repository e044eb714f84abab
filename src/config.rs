use crate::error::{BridgeError, Result};
use crate::pairing::{SetupCode, SetupId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Split a `.env` line into key and value.
///
/// Returns `None` for blank lines, comments and lines without `=`. Surrounding
/// single or double quotes are stripped from the value; unquoted values may
/// contain spaces.
fn parse_dotenv_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let mut value = value.trim();

    if value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
    {
        value = &value[1..value.len() - 1];
    }

    Some((key, value))
}

/// Load environment variables from a `.env` file in the working directory.
///
/// Variables already present in the environment take precedence.
pub fn load_dotenv() {
    let env_path = Path::new(".env");
    let Ok(content) = fs::read_to_string(env_path) else {
        return;
    };

    for (key, value) in content.lines().filter_map(parse_dotenv_line) {
        if std::env::var(key).is_err() {
            // SAFETY: called from main before the tokio runtime spawns any threads
            unsafe { std::env::set_var(key, value) };
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub accessory: AccessoryConfig,
    pub pairing: PairingConfig,
    pub bridge: BridgeConfig,
}

/// Identity strings of the accessory and the display names of its services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessoryConfig {
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
    pub firmware_revision: String,
    pub heater_name: String,
    pub power_switch_name: String,
    pub pump_switch_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairingConfig {
    /// Setup code in `XXX-XX-XXX` form
    pub setup_code: String,
    /// Four character setup identifier
    pub setup_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Bound on waiting for a concurrent write on the same attribute
    pub write_timeout_ms: u64,
    /// Tick of the simulated controller's thermal model
    pub simulation_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            accessory: AccessoryConfig {
                name: "Pool".to_string(),
                manufacturer: "UM".to_string(),
                model: "SpaController".to_string(),
                serial_number: "SN_0123456".to_string(),
                firmware_revision: "0.0.9".to_string(),
                heater_name: "Pool Heater".to_string(),
                power_switch_name: "Pool Power".to_string(),
                pump_switch_name: "Pool Pump".to_string(),
            },
            pairing: PairingConfig {
                setup_code: "111-11-111".to_string(),
                setup_id: "ABCD".to_string(),
            },
            bridge: BridgeConfig {
                write_timeout_ms: 250,
                simulation_interval_secs: 5,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(name) = std::env::var("POOL_ACCESSORY_NAME") {
            config.accessory.name = name;
        }
        if let Ok(manufacturer) = std::env::var("POOL_MANUFACTURER") {
            config.accessory.manufacturer = manufacturer;
        }
        if let Ok(model) = std::env::var("POOL_MODEL") {
            config.accessory.model = model;
        }
        if let Ok(serial) = std::env::var("POOL_SERIAL_NUMBER") {
            config.accessory.serial_number = serial;
        }
        if let Ok(firmware) = std::env::var("POOL_FIRMWARE_REVISION") {
            config.accessory.firmware_revision = firmware;
        }

        // Pairing
        if let Ok(code) = std::env::var("HAP_SETUP_CODE") {
            config.pairing.setup_code = code;
        }
        if let Ok(id) = std::env::var("HAP_SETUP_ID") {
            config.pairing.setup_id = id;
        }

        // Bridge tuning
        if let Ok(timeout) = std::env::var("BRIDGE_WRITE_TIMEOUT_MS")
            && let Ok(t) = timeout.parse()
        {
            config.bridge.write_timeout_ms = t;
        }
        if let Ok(interval) = std::env::var("BRIDGE_SIMULATION_INTERVAL_SECS")
            && let Ok(i) = interval.parse()
        {
            config.bridge.simulation_interval_secs = i;
        }

        config
    }

    /// Check values the HAP server would refuse.
    pub fn validate(&self) -> Result<()> {
        self.setup_code()?;
        self.setup_id()?;

        if self.accessory.name.trim().is_empty() {
            return Err(BridgeError::InvalidConfig(
                "accessory name must not be empty".to_string(),
            ));
        }
        if self.bridge.simulation_interval_secs == 0 {
            return Err(BridgeError::InvalidConfig(
                "simulation interval must be at least one second".to_string(),
            ));
        }

        Ok(())
    }

    pub fn setup_code(&self) -> Result<SetupCode> {
        self.pairing.setup_code.parse()
    }

    pub fn setup_id(&self) -> Result<SetupId> {
        self.pairing.setup_id.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_accessory_constants() {
        let config = Config::default();
        assert_eq!(config.accessory.name, "Pool");
        assert_eq!(config.accessory.serial_number, "SN_0123456");
        assert_eq!(config.accessory.firmware_revision, "0.0.9");
        assert_eq!(config.pairing.setup_code, "111-11-111");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_setup_code() {
        let mut config = Config::default();
        config.pairing.setup_code = "1111-1111".to_string();
        assert!(matches!(config.validate(), Err(BridgeError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = Config::default();
        config.bridge.simulation_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_dotenv_line() {
        assert_eq!(parse_dotenv_line("HAP_SETUP_ID=XY12"), Some(("HAP_SETUP_ID", "XY12")));
        assert_eq!(
            parse_dotenv_line("POOL_ACCESSORY_NAME = Back Yard Pool "),
            Some(("POOL_ACCESSORY_NAME", "Back Yard Pool"))
        );
        assert_eq!(
            parse_dotenv_line("POOL_MODEL=\"Spa 2\""),
            Some(("POOL_MODEL", "Spa 2"))
        );
        assert_eq!(parse_dotenv_line("# comment"), None);
        assert_eq!(parse_dotenv_line("   "), None);
        assert_eq!(parse_dotenv_line("NO_EQUALS"), None);
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.accessory.model, "SpaController");
        assert_eq!(parsed.bridge.write_timeout_ms, 250);
    }
}
