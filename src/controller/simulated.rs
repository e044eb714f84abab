//! In-memory pool controller.
//!
//! Stands in for the hardware module during development and tests. State is
//! held in atomics so it can be read from the HAP request thread while the
//! simulation task mutates it. Every mutator confirms its change through the
//! registered event pusher, the way the real controller reports relay
//! transitions.

use super::{ControllerAdapter, ControllerSnapshot, EventPusher, Quantity};
use crate::error::{BridgeError, Result};
use log::{debug, info};
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};
use tokio::task::JoinHandle;
use tokio::time::{Duration, interval};

/// Temperature the water drifts back to when the heater is idle.
const AMBIENT_TEMPERATURE: i32 = 19;

impl Default for ControllerSnapshot {
    fn default() -> Self {
        Self {
            power: false,
            pump: false,
            current_heating_mode: false,
            target_heating_mode: false,
            current_temperature: AMBIENT_TEMPERATURE,
            target_temperature: 31,
        }
    }
}

/// Simulated pool controller.
///
/// # Example
/// ```ignore
/// let controller = Arc::new(SimulatedController::default());
/// controller.set_event_pusher(Arc::new(|q| println!("{q} changed")));
/// controller.set_power(true)?;      // prints "power changed"
/// controller.sensor_reading(24);    // prints "current_temperature changed"
/// ```
pub struct SimulatedController {
    power: AtomicBool,
    pump: AtomicBool,
    current_heating_mode: AtomicBool,
    target_heating_mode: AtomicBool,
    current_temperature: AtomicI32,
    target_temperature: AtomicI32,
    /// Number of successful mutator calls
    actuations: AtomicU32,
    /// When set, every mutator fails with `ActuationFailure`
    fail_actuation: AtomicBool,
    pusher: RwLock<Option<EventPusher>>,
}

impl SimulatedController {
    /// Create a controller starting from the given state.
    pub fn new(initial: ControllerSnapshot) -> Self {
        Self {
            power: AtomicBool::new(initial.power),
            pump: AtomicBool::new(initial.pump),
            current_heating_mode: AtomicBool::new(initial.current_heating_mode),
            target_heating_mode: AtomicBool::new(initial.target_heating_mode),
            current_temperature: AtomicI32::new(initial.current_temperature),
            target_temperature: AtomicI32::new(initial.target_temperature),
            actuations: AtomicU32::new(0),
            fail_actuation: AtomicBool::new(false),
            pusher: RwLock::new(None),
        }
    }

    /// Number of mutator calls that reached the (simulated) hardware.
    pub fn actuations(&self) -> u32 {
        self.actuations.load(Ordering::SeqCst)
    }

    /// Make subsequent mutator calls fail, as if the relay board stopped answering.
    pub fn set_fail_actuation(&self, fail: bool) {
        self.fail_actuation.store(fail, Ordering::SeqCst);
    }

    /// A new reading from the temperature sensor.
    pub fn sensor_reading(&self, celsius: i32) {
        self.current_temperature.store(celsius, Ordering::SeqCst);
        self.emit(Quantity::CurrentTemperature);
    }

    /// The heater relay switched on or off.
    pub fn heater_running(&self, running: bool) {
        self.current_heating_mode.store(running, Ordering::SeqCst);
        self.emit(Quantity::CurrentHeatingMode);
    }

    /// Advance the thermal model by one tick.
    ///
    /// The heater runs while power is on, heating is requested and the water
    /// is below the setpoint. Each tick moves the water one degree towards the
    /// setpoint (heating) or towards ambient (idle).
    pub fn step(&self) {
        let current = self.current_temperature.load(Ordering::SeqCst);
        let heating = self.power.load(Ordering::SeqCst)
            && self.target_heating_mode.load(Ordering::SeqCst)
            && current < self.target_temperature.load(Ordering::SeqCst);

        if self.current_heating_mode.load(Ordering::SeqCst) != heating {
            self.heater_running(heating);
        }

        if heating {
            self.sensor_reading(current + 1);
        } else if current > AMBIENT_TEMPERATURE {
            self.sensor_reading(current - 1);
        }
    }

    fn actuate(&self, quantity: Quantity) -> Result<()> {
        if self.fail_actuation.load(Ordering::SeqCst) {
            return Err(BridgeError::ActuationFailure {
                attribute: quantity.into(),
                reason: "relay board not responding".to_string(),
            });
        }
        self.actuations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn emit(&self, quantity: Quantity) {
        let pusher = self.pusher.read().clone();
        match pusher {
            Some(pusher) => pusher(quantity),
            None => debug!("[Sim] {} changed, no listener registered", quantity),
        }
    }
}

impl Default for SimulatedController {
    fn default() -> Self {
        Self::new(ControllerSnapshot::default())
    }
}

impl ControllerAdapter for SimulatedController {
    fn get_power(&self) -> bool {
        self.power.load(Ordering::SeqCst)
    }

    fn set_power(&self, on: bool) -> Result<()> {
        self.actuate(Quantity::Power)?;
        self.power.store(on, Ordering::SeqCst);
        self.emit(Quantity::Power);
        Ok(())
    }

    fn get_pump(&self) -> bool {
        self.pump.load(Ordering::SeqCst)
    }

    fn set_pump(&self, on: bool) -> Result<()> {
        self.actuate(Quantity::Pump)?;
        self.pump.store(on, Ordering::SeqCst);
        self.emit(Quantity::Pump);
        Ok(())
    }

    fn get_current_heating_mode(&self) -> bool {
        self.current_heating_mode.load(Ordering::SeqCst)
    }

    fn get_target_heating_mode(&self) -> bool {
        self.target_heating_mode.load(Ordering::SeqCst)
    }

    fn set_target_heating_mode(&self, heat: bool) -> Result<()> {
        self.actuate(Quantity::TargetHeatingMode)?;
        self.target_heating_mode.store(heat, Ordering::SeqCst);
        self.emit(Quantity::TargetHeatingMode);
        Ok(())
    }

    fn get_current_temperature(&self) -> i32 {
        self.current_temperature.load(Ordering::SeqCst)
    }

    fn get_target_temperature(&self) -> i32 {
        self.target_temperature.load(Ordering::SeqCst)
    }

    fn set_target_temperature(&self, celsius: i32) -> Result<()> {
        self.actuate(Quantity::TargetTemperature)?;
        self.target_temperature.store(celsius, Ordering::SeqCst);
        self.emit(Quantity::TargetTemperature);
        Ok(())
    }

    fn set_event_pusher(&self, pusher: EventPusher) {
        *self.pusher.write() = Some(pusher);
    }
}

/// Spawn a task that advances the thermal model every `period`.
///
/// # Returns
///
/// A `JoinHandle` that can be used to abort the simulation task.
pub fn run_simulation(controller: Arc<SimulatedController>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        loop {
            ticker.tick().await;
            controller.step();
            debug!("[Sim] {:?}", controller.snapshot());
            if controller.get_current_heating_mode() {
                info!(
                    "[Sim] Heating: {}°C -> {}°C",
                    controller.get_current_temperature(),
                    controller.get_target_temperature()
                );
            }
        }
    })
}
