//! Pump controller. Owns the pump table and drives the rotation policy.
//!
//! ```text
//!  tick ──▶ Controller::update ──▶ resync (every 10 min) ──▶ RuntimeRegistry
//!                  │
//!                  └──▶ RotationPolicy::decide ──▶ at most one toggle
//! ```
//!
//! The controller is single-threaded and synchronous.  The only blocking
//! call is the registry fetch, whose timeout belongs to the adapter.

use log::{debug, info};

use super::pump::{PUMP_COUNT, PumpIndex, PumpState};
use super::rotation::{HvacMode, PolicyInput, Rotation, RotationPolicy};
use super::Millis;
use crate::app::ports::{Clock, RuntimeRegistry};
use crate::config::ControlTiming;

pub struct Controller<R, C> {
    pumps: [PumpState; PUMP_COUNT],
    current_buffer_temp: f32,
    target_buffer_temp: f32,
    mode: HvacMode,
    /// Last automatic change of any pump; gates the global cooldown.
    /// Starts at construction time, so nothing changes during the first
    /// interval after boot.
    last_rotation_time: Millis,
    last_runtime_sync_time: Millis,
    timing: ControlTiming,
    policy: RotationPolicy,
    registry: R,
    clock: C,
}

impl<R: RuntimeRegistry, C: Clock> Controller<R, C> {
    /// Build a controller with every pump off and pull the first runtime
    /// snapshot from the registry straight away.
    pub fn new(timing: ControlTiming, registry: R, clock: C) -> Self {
        let now = clock.now_ms();
        let mut controller = Self {
            pumps: [PumpState::default(); PUMP_COUNT],
            current_buffer_temp: 0.0,
            target_buffer_temp: 0.0,
            mode: HvacMode::Heating,
            last_rotation_time: now,
            last_runtime_sync_time: now,
            timing,
            policy: RotationPolicy::new(&timing),
            registry,
            clock,
        };
        controller.resync_runtimes();
        controller
    }

    // ── Tick ──────────────────────────────────────────────────

    /// Run one control step.  Returns the toggle that was applied, if any.
    pub fn update(
        &mut self,
        current_temp: f32,
        target_temp: f32,
        heating: bool,
        hysteresis: f32,
    ) -> Option<Rotation> {
        self.current_buffer_temp = current_temp;
        self.target_buffer_temp = target_temp;
        self.mode = HvacMode::from_heating(heating);

        self.sync_runtimes_if_due();

        // The fetch may have blocked for a while.
        let now = self.clock.now_ms();
        let input = PolicyInput {
            mode: self.mode,
            current_temp,
            target_temp,
            hysteresis,
            now,
            last_rotation_time: self.last_rotation_time,
        };
        let rotation = self.policy.decide(&input, &self.pumps)?;
        self.apply(rotation, now);
        Some(rotation)
    }

    /// Resync from the registry once the sync interval has passed.
    /// Returns `true` if a fetch was attempted.
    pub fn sync_runtimes_if_due(&mut self) -> bool {
        let started = self.clock.now_ms();
        if started.saturating_sub(self.last_runtime_sync_time)
            < self.timing.runtime_sync_interval_ms
        {
            return false;
        }
        self.resync_runtimes();
        self.last_runtime_sync_time = started;
        true
    }

    /// Pull runtimes from the registry, keep the old value wherever the
    /// registry has nothing, then echo every pump's runtime back.
    pub fn resync_runtimes(&mut self) {
        let snapshot = self.registry.fetch_all();
        for (pump, reading) in self.pumps.iter_mut().zip(snapshot) {
            if let Some(runtime) = reading {
                pump.saved_runtime_secs = runtime;
            }
        }
        debug!(
            "Runtime resync: fetched={:?} saved={:?}",
            snapshot,
            self.pumps.map(|p| p.saved_runtime_secs)
        );
        for index in PumpIndex::ALL {
            let runtime = self.pumps[index.get()].saved_runtime_secs;
            self.registry.report(index, runtime);
        }
    }

    fn apply(&mut self, rotation: Rotation, now: Millis) {
        let pump = &mut self.pumps[rotation.index.get()];
        pump.enabled = rotation.enable;
        if rotation.enable {
            pump.last_on_time = Some(now);
        } else {
            pump.last_off_time = Some(now);
        }
        self.last_rotation_time = now;
        info!(
            "{} switched {} ({}, runtime {}s)",
            rotation.index,
            if rotation.enable { "on" } else { "off" },
            self.mode,
            pump.saved_runtime_secs,
        );
    }

    // ── Manual overrides ──────────────────────────────────────

    /// Switch a pump off immediately, ignoring cooldown and dwell.
    ///
    /// Neither the pump's off timestamp nor the global rotation time is
    /// touched, so the override does not start a fresh dwell period.
    pub fn force_pump_off(&mut self, index: usize) {
        if let Some(index) = PumpIndex::new(index) {
            self.pumps[index.get()].enabled = false;
            info!("{} forced off", index);
        }
    }

    /// Switch a pump on immediately, ignoring cooldown and dwell.  Same
    /// timestamp rules as [`force_pump_off`](Self::force_pump_off).
    pub fn force_pump_on(&mut self, index: usize) {
        if let Some(index) = PumpIndex::new(index) {
            self.pumps[index.get()].enabled = true;
            info!("{} forced on", index);
        }
    }

    pub fn shutdown_all_pumps(&mut self) {
        for pump in &mut self.pumps {
            pump.enabled = false;
        }
        info!("All pumps shut down");
    }

    // ── Queries ───────────────────────────────────────────────

    /// `false` for an out-of-range index.
    pub fn pump_status(&self, index: usize) -> bool {
        self.get(index).is_some_and(|p| p.enabled)
    }

    /// `0` for an out-of-range index or a pump never switched on.
    pub fn last_on_time(&self, index: usize) -> Millis {
        self.get(index).and_then(|p| p.last_on_time).unwrap_or(0)
    }

    /// `0` for an out-of-range index or a pump never switched off.
    pub fn last_off_time(&self, index: usize) -> Millis {
        self.get(index).and_then(|p| p.last_off_time).unwrap_or(0)
    }

    /// `0` for an out-of-range index.
    pub fn saved_runtime_secs(&self, index: usize) -> u64 {
        self.get(index).map_or(0, |p| p.saved_runtime_secs)
    }

    pub fn pump(&self, index: PumpIndex) -> &PumpState {
        &self.pumps[index.get()]
    }

    pub fn pumps(&self) -> &[PumpState; PUMP_COUNT] {
        &self.pumps
    }

    pub fn mode(&self) -> HvacMode {
        self.mode
    }

    pub fn current_buffer_temp(&self) -> f32 {
        self.current_buffer_temp
    }

    pub fn target_buffer_temp(&self) -> f32 {
        self.target_buffer_temp
    }

    pub fn last_rotation_time(&self) -> Millis {
        self.last_rotation_time
    }

    pub fn last_runtime_sync_time(&self) -> Millis {
        self.last_runtime_sync_time
    }

    pub fn timing(&self) -> ControlTiming {
        self.timing
    }

    /// Swap in new dwell/cooldown/resync periods.  Pump state is kept.
    pub fn set_timing(&mut self, timing: ControlTiming) {
        self.timing = timing;
        self.policy = RotationPolicy::new(&timing);
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn get(&self, index: usize) -> Option<&PumpState> {
        PumpIndex::new(index).map(|i| &self.pumps[i.get()])
    }
}
