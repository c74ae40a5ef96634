//! Pump relay bank driver.
//!
//! Three relay coils, one per circulation pump, each behind an
//! `embedded_hal` output pin.  Relay boards are commonly active-low, so
//! the electrical level is configurable.
//!
//! ## Safety contract
//!
//! Which pumps run is decided by the controller; this driver is a dumb
//! actuator.  It only writes a pin when its requested state changes, so
//! repeated mirroring each tick does not chatter the coils.

use embedded_hal::digital::OutputPin;
use log::error;

use crate::app::ports::RelayPort;
use crate::control::{PUMP_COUNT, PumpIndex};

pub struct RelayBank<P> {
    pins: [P; PUMP_COUNT],
    active_low: bool,
    /// Last level successfully written; `None` until first write.
    applied: [Option<bool>; PUMP_COUNT],
}

impl<P: OutputPin> RelayBank<P> {
    pub fn new(pins: [P; PUMP_COUNT], active_low: bool) -> Self {
        Self {
            pins,
            active_low,
            applied: [None; PUMP_COUNT],
        }
    }

    /// Drive one relay.  Returns `Ok(true)` if the pin was written.
    pub fn set(&mut self, index: PumpIndex, on: bool) -> Result<bool, P::Error> {
        let i = index.get();
        if self.applied[i] == Some(on) {
            return Ok(false);
        }
        let pin = &mut self.pins[i];
        if on != self.active_low {
            pin.set_high()?;
        } else {
            pin.set_low()?;
        }
        self.applied[i] = Some(on);
        Ok(true)
    }

    pub fn is_on(&self, index: PumpIndex) -> bool {
        self.applied[index.get()] == Some(true)
    }

    pub fn release(self) -> [P; PUMP_COUNT] {
        self.pins
    }
}

impl<P: OutputPin> RelayPort for RelayBank<P> {
    fn set_relay(&mut self, index: PumpIndex, on: bool) {
        if let Err(e) = self.set(index, on) {
            error!("Relay for {} failed to switch {}: {:?}", index, if on { "on" } else { "off" }, e);
            // Force a rewrite next time.
            self.applied[index.get()] = None;
        }
    }

    fn all_off(&mut self) {
        for index in PumpIndex::ALL {
            // Unconditional write: the hardware state is unknown here.
            self.applied[index.get()] = None;
            self.set_relay(index, false);
        }
    }
}
