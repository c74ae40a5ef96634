//! Pump rotation control.
//!
//! [`Controller`](controller::Controller) owns the per-pump state and the
//! cooldown bookkeeping; [`rotation`] holds the pure decision rule that
//! picks which pump to shed or add.

pub mod controller;
pub mod pump;
pub mod rotation;

pub use controller::Controller;
pub use pump::{PUMP_COUNT, PumpIndex, PumpState};
pub use rotation::{HvacMode, PolicyInput, Rotation, RotationPolicy};

/// Monotonic milliseconds since boot.
pub type Millis = u64;
