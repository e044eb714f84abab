//! Pool HomeKit Bridge library.
//!
//! Exposes a pool controller's relays, heater and temperature sensor as typed
//! HomeKit attributes and keeps both sides in sync.

pub mod bridge;
pub mod config;
pub mod controller;
pub mod error;
pub mod hap;
pub mod instance_lock;
pub mod pairing;
