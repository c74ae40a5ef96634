//! Wear-levelling rotation rule.
//!
//! Given the buffer temperature, the setpoint and the current pump table,
//! decide whether one pump should be shed or added, and which one:
//!
//! ```text
//!              heating                         cooling
//!   temp >= target + h  → shed          temp <= target - h  → shed
//!   temp <= target - h  → add           temp >= target + h  → add
//!   otherwise           → hold (deadband)
//! ```
//!
//! Shedding always rests the enabled pump with the most runtime; adding
//! always wakes the rested pump with the least runtime.  Ties go to the
//! lowest index.  Nothing happens inside the global change interval.
//!
//! The rule is a pure function of its inputs; the
//! [`Controller`](super::Controller) applies the returned [`Rotation`].

use core::fmt;

use serde::{Deserialize, Serialize};

use super::pump::{PUMP_COUNT, PumpIndex, PumpState};
use super::Millis;
use crate::config::ControlTiming;

/// Whether the installation is heating or cooling the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HvacMode {
    Heating,
    Cooling,
}

impl HvacMode {
    pub fn from_heating(heating: bool) -> Self {
        if heating { Self::Heating } else { Self::Cooling }
    }

    pub fn is_heating(self) -> bool {
        matches!(self, Self::Heating)
    }

    /// Parse a mode string as published by the installation.
    ///
    /// Accepts the registry's Dutch wire values and English names, ignoring
    /// case and surrounding whitespace.  Anything else (including the
    /// registry's "no demand" value) yields `None`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("verwarmen") || s.eq_ignore_ascii_case("heating") {
            Some(Self::Heating)
        } else if s.eq_ignore_ascii_case("koelen") || s.eq_ignore_ascii_case("cooling") {
            Some(Self::Cooling)
        } else {
            None
        }
    }
}

impl fmt::Display for HvacMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heating => write!(f, "heating"),
            Self::Cooling => write!(f, "cooling"),
        }
    }
}

/// What the temperature asks for, before cooldown and eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demand {
    /// Switch one pump off.
    Shed,
    /// Switch one pump on.
    Add,
    /// Inside the deadband.
    Hold,
}

impl Demand {
    pub fn evaluate(mode: HvacMode, current_temp: f32, target_temp: f32, hysteresis: f32) -> Self {
        let too_hot = current_temp >= target_temp + hysteresis;
        let too_cold = current_temp <= target_temp - hysteresis;
        let (shed, add) = match mode {
            HvacMode::Heating => (too_hot, too_cold),
            HvacMode::Cooling => (too_cold, too_hot),
        };
        // With a negative hysteresis both can hold; shedding wins.
        if shed {
            Self::Shed
        } else if add {
            Self::Add
        } else {
            Self::Hold
        }
    }
}

/// A single pump toggle chosen by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rotation {
    pub index: PumpIndex,
    /// `true` switches the pump on, `false` switches it off.
    pub enable: bool,
}

/// Everything the policy looks at besides the pump table.
#[derive(Debug, Clone, Copy)]
pub struct PolicyInput {
    pub mode: HvacMode,
    pub current_temp: f32,
    pub target_temp: f32,
    pub hysteresis: f32,
    pub now: Millis,
    /// Last automatic change of any pump, or the boot epoch if none yet.
    pub last_rotation_time: Millis,
}

#[derive(Debug, Clone, Copy)]
pub struct RotationPolicy {
    min_off_dwell: Millis,
    min_change_interval: Millis,
}

impl RotationPolicy {
    pub fn new(timing: &ControlTiming) -> Self {
        Self {
            min_off_dwell: timing.min_off_dwell_ms,
            min_change_interval: timing.min_change_interval_ms,
        }
    }

    /// True while the global change interval since the last rotation is
    /// still running.
    pub fn in_cooldown(&self, now: Millis, last_rotation_time: Millis) -> bool {
        now.saturating_sub(last_rotation_time) < self.min_change_interval
    }

    pub fn decide(
        &self,
        input: &PolicyInput,
        pumps: &[PumpState; PUMP_COUNT],
    ) -> Option<Rotation> {
        if self.in_cooldown(input.now, input.last_rotation_time) {
            return None;
        }

        match Demand::evaluate(
            input.mode,
            input.current_temp,
            input.target_temp,
            input.hysteresis,
        ) {
            Demand::Shed => self.pick_shed(pumps).map(|index| Rotation {
                index,
                enable: false,
            }),
            Demand::Add => self.pick_add(pumps, input.now).map(|index| Rotation {
                index,
                enable: true,
            }),
            Demand::Hold => None,
        }
    }

    /// Enabled pump with the strictly greatest runtime.
    fn pick_shed(&self, pumps: &[PumpState; PUMP_COUNT]) -> Option<PumpIndex> {
        let mut best: Option<(PumpIndex, u64)> = None;
        for (index, pump) in PumpIndex::ALL.into_iter().zip(pumps) {
            if !pump.enabled {
                continue;
            }
            if best.is_none_or(|(_, runtime)| pump.saved_runtime_secs > runtime) {
                best = Some((index, pump.saved_runtime_secs));
            }
        }
        best.map(|(index, _)| index)
    }

    /// Rested, disabled pump with the strictly smallest runtime.
    fn pick_add(&self, pumps: &[PumpState; PUMP_COUNT], now: Millis) -> Option<PumpIndex> {
        let mut best: Option<(PumpIndex, u64)> = None;
        for (index, pump) in PumpIndex::ALL.into_iter().zip(pumps) {
            if pump.enabled || !pump.dwell_elapsed(now, self.min_off_dwell) {
                continue;
            }
            if best.is_none_or(|(_, runtime)| pump.saved_runtime_secs < runtime) {
                best = Some((index, pump.saved_runtime_secs));
            }
        }
        best.map(|(index, _)| index)
    }
}
