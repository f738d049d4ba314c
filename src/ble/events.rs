//! Connection and read handlers the GATT binding calls into.
//!
//! The binding only sees [`PeripheralEvents`]; the adapter behind it holds
//! a [`SharedScheduler`] handle and the value provider. Every handler runs
//! to completion before returning, so its effect on the deadline is
//! visible to the very next `evaluate()`.

use core::cell::RefCell;

use crate::config::DisconnectPolicy;
use crate::power_logic::SharedScheduler;
use crate::sensor::{
    encode_temperature, SensorValueProvider, TemperatureSource, TEMPERATURE_PAYLOAD_SIZE,
};

/// What the BLE task does after a central goes away.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisconnectAction {
    /// Go back to advertising.
    Advertise,
    /// Halt for this many seconds, then restart (radio reset).
    Halt(u32),
}

/// Handlers invoked by the wireless stack binding.
pub trait PeripheralEvents {
    /// A central connected.
    fn on_connect(&self);
    /// The central disconnected.
    fn on_disconnect(&self) -> DisconnectAction;
    /// A central read the temperature characteristic; returns the payload.
    fn on_read_requested(&self) -> [u8; TEMPERATURE_PAYLOAD_SIZE];
}

pub struct PeripheralEventAdapter<'a, Sh, S> {
    scheduler: &'a Sh,
    provider: RefCell<SensorValueProvider<S>>,
}

impl<'a, Sh, S> PeripheralEventAdapter<'a, Sh, S>
where
    Sh: SharedScheduler,
    S: TemperatureSource,
{
    pub fn new(scheduler: &'a Sh, provider: SensorValueProvider<S>) -> Self {
        Self {
            scheduler,
            provider: RefCell::new(provider),
        }
    }

    /// Produce a reading (counts as activity) and return it unencoded.
    pub fn read_value(&self) -> i8 {
        let mut provider = self.provider.borrow_mut();
        self.scheduler.with(|s| provider.produce(s))
    }
}

impl<'a, Sh, S> PeripheralEvents for PeripheralEventAdapter<'a, Sh, S>
where
    Sh: SharedScheduler,
    S: TemperatureSource,
{
    fn on_connect(&self) {
        self.scheduler.with(|s| {
            let timeout = s.config().activity_timeout_secs;
            s.record_activity(timeout);
        });
        info!("BLE: client connected");
    }

    fn on_disconnect(&self) -> DisconnectAction {
        let (policy, reset_secs) = self
            .scheduler
            .with(|s| (s.config().disconnect_policy, s.config().reset_halt_secs));
        info!("BLE: client disconnected ({})", policy);
        match policy {
            DisconnectPolicy::ResumeAdvertising => DisconnectAction::Advertise,
            DisconnectPolicy::ResetRadio => DisconnectAction::Halt(reset_secs),
        }
    }

    fn on_read_requested(&self) -> [u8; TEMPERATURE_PAYLOAD_SIZE] {
        encode_temperature(self.read_value())
    }
}
