//! Simulation adapters.
//!
//! Stand-ins for the clock, runtime registry, relays and the thermal
//! buffer itself, used by the bench simulator and by tests.  Time only
//! moves when the caller advances it, so a simulated day runs in
//! milliseconds and every run is reproducible.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::debug;

use crate::app::ports::{Clock, RelayPort, RuntimeRegistry, RuntimeSnapshot};
use crate::control::{HvacMode, Millis, PUMP_COUNT, PumpIndex};

// ── Clock ─────────────────────────────────────────────────────

/// Hand-driven monotonic clock.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Millis>,
}

impl ManualClock {
    pub fn new(start: Millis) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn advance(&self, ms: Millis) {
        self.now.set(self.now.get().saturating_add(ms));
    }

    /// Jump to `at`.  Ignored if it would move time backwards.
    pub fn set(&self, at: Millis) {
        if at >= self.now.get() {
            self.now.set(at);
        }
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.get()
    }
}

// ── Runtime registry ──────────────────────────────────────────

/// Runtime bookkeeping shared between the simulated plant and
/// [`SimRegistry`].
#[derive(Debug, Default)]
pub struct RuntimeLedger {
    run_ms: [u64; PUMP_COUNT],
    /// While `false` every fetch reports "unknown".
    pub online: bool,
    /// Last value echoed back per pump.
    pub reported: [Option<u64>; PUMP_COUNT],
}

impl RuntimeLedger {
    pub fn with_runtimes(secs: [u64; PUMP_COUNT]) -> Self {
        Self {
            run_ms: secs.map(|s| s * 1000),
            online: true,
            reported: [None; PUMP_COUNT],
        }
    }

    /// Credit `dt_ms` of runtime to every running pump.
    pub fn accrue(&mut self, running: [bool; PUMP_COUNT], dt_ms: Millis) {
        for (total, on) in self.run_ms.iter_mut().zip(running) {
            if on {
                *total += dt_ms;
            }
        }
    }

    pub fn runtime_secs(&self) -> [u64; PUMP_COUNT] {
        self.run_ms.map(|ms| ms / 1000)
    }
}

/// [`RuntimeRegistry`] backed by a shared [`RuntimeLedger`].
#[derive(Debug, Clone)]
pub struct SimRegistry {
    ledger: Rc<RefCell<RuntimeLedger>>,
}

impl SimRegistry {
    pub fn new(ledger: Rc<RefCell<RuntimeLedger>>) -> Self {
        Self { ledger }
    }
}

impl RuntimeRegistry for SimRegistry {
    fn fetch_all(&mut self) -> RuntimeSnapshot {
        let ledger = self.ledger.borrow();
        if ledger.online {
            ledger.runtime_secs().map(Some)
        } else {
            [None; PUMP_COUNT]
        }
    }

    fn report(&mut self, index: PumpIndex, runtime_secs: u64) {
        self.ledger.borrow_mut().reported[index.get()] = Some(runtime_secs);
    }
}

// ── Relays ────────────────────────────────────────────────────

/// Relay bank that only remembers its outputs.
#[derive(Debug, Default)]
pub struct SimRelays {
    state: [bool; PUMP_COUNT],
    /// Number of on/off edges seen per relay.
    pub switch_count: [u32; PUMP_COUNT],
}

impl SimRelays {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> [bool; PUMP_COUNT] {
        self.state
    }

    pub fn running(&self) -> usize {
        self.state.iter().filter(|on| **on).count()
    }
}

impl RelayPort for SimRelays {
    fn set_relay(&mut self, index: PumpIndex, on: bool) {
        let slot = &mut self.state[index.get()];
        if *slot != on {
            self.switch_count[index.get()] += 1;
            *slot = on;
        }
    }

    fn all_off(&mut self) {
        for index in PumpIndex::ALL {
            self.set_relay(index, false);
        }
    }
}

// ── Thermal buffer ────────────────────────────────────────────

/// First-order model of the buffer tank.
///
/// Each running pump moves `pump_rate_c_per_min` of heat into (heating)
/// or out of (cooling) the buffer; the house draws the buffer towards
/// `load_c` at `loss_per_min` of the difference.
#[derive(Debug, Clone)]
pub struct BufferModel {
    pub temp_c: f32,
    pub load_c: f32,
    pub pump_rate_c_per_min: f32,
    pub loss_per_min: f32,
}

impl BufferModel {
    pub fn new(temp_c: f32, load_c: f32) -> Self {
        Self {
            temp_c,
            load_c,
            pump_rate_c_per_min: 0.12,
            loss_per_min: 0.004,
        }
    }

    pub fn step(&mut self, dt_ms: Millis, running: usize, mode: HvacMode) -> f32 {
        let minutes = dt_ms as f32 / 60_000.0;
        let drive = running as f32 * self.pump_rate_c_per_min;
        let drive = if mode.is_heating() { drive } else { -drive };
        let loss = (self.temp_c - self.load_c) * self.loss_per_min;
        self.temp_c += (drive - loss) * minutes;
        debug!("buffer {:.2}°C ({} pumps, {})", self.temp_c, running, mode);
        self.temp_c
    }
}
