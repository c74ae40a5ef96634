//! Per-pump state record and validated pump addressing.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::Millis;
use crate::error::Error;

/// Number of circulation pumps on the buffer.  Fixed for the lifetime of the
/// controller.
pub const PUMP_COUNT: usize = 3;

/// Index of a pump, guaranteed to be in `0..PUMP_COUNT`.
///
/// Every public entry point that accepts a raw `usize` funnels it through
/// [`PumpIndex::new`], so range checking lives in exactly one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct PumpIndex(u8);

impl PumpIndex {
    /// All pumps in ascending order.
    pub const ALL: [PumpIndex; PUMP_COUNT] = [PumpIndex(0), PumpIndex(1), PumpIndex(2)];

    pub fn new(index: usize) -> Option<Self> {
        (index < PUMP_COUNT).then(|| Self(index as u8))
    }

    pub const fn get(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<usize> for PumpIndex {
    type Error = Error;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Self::new(index).ok_or(Error::InvalidPumpIndex(index))
    }
}

impl From<PumpIndex> for usize {
    fn from(index: PumpIndex) -> Self {
        index.get()
    }
}

impl fmt::Display for PumpIndex {
    /// Pumps are labelled 1-based for people.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pump {}", self.0 + 1)
    }
}

/// Where a pump sits in its on/off cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpPhase {
    /// Running.
    On,
    /// Off, but still inside the minimum off-dwell window.
    OffCoolingDown,
    /// Off and allowed to be switched on again.
    OffEligible,
}

/// Mutable record kept by the controller for one pump.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpState {
    pub enabled: bool,
    /// Last automatic transition to on; `None` if never.
    pub last_on_time: Option<Millis>,
    /// Last automatic transition to off; `None` if never.
    pub last_off_time: Option<Millis>,
    /// Last known cumulative runtime from the registry.
    pub saved_runtime_secs: u64,
}

impl PumpState {
    /// True when the pump has rested at least `min_off_dwell` since it was
    /// last switched off.  A pump that was never switched off has nothing
    /// to rest from.
    pub fn dwell_elapsed(&self, now: Millis, min_off_dwell: Millis) -> bool {
        self.last_off_time
            .is_none_or(|off| now.saturating_sub(off) >= min_off_dwell)
    }

    pub fn phase(&self, now: Millis, min_off_dwell: Millis) -> PumpPhase {
        if self.enabled {
            PumpPhase::On
        } else if self.dwell_elapsed(now, min_off_dwell) {
            PumpPhase::OffEligible
        } else {
            PumpPhase::OffCoolingDown
        }
    }
}
