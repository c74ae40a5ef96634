//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide where they go: the serial log, MQTT or the dashboard.

use serde::Serialize;

use super::commands::OperatingMode;
use crate::control::{HvacMode, Millis, PUMP_COUNT, PumpIndex};

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Periodic status snapshot.
    Telemetry(TelemetryData),

    /// A pump relay changed state.
    PumpSwitched {
        index: PumpIndex,
        enabled: bool,
        cause: SwitchCause,
    },

    /// Control moved between automatic and manual.
    OperatingModeChanged {
        from: OperatingMode,
        to: OperatingMode,
    },

    /// The application service has started.
    Started {
        mode: OperatingMode,
        /// Monotonic time of the start, for the retained start stamp.
        uptime_ms: Millis,
    },
}

/// Why a pump changed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SwitchCause {
    /// Chosen by the rotation policy.
    Rotation,
    /// Operator toggle or forced off.
    Manual,
    /// Safe-state entry.
    Shutdown,
}

/// Per-pump view for dashboards and publishers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PumpStatus {
    pub index: PumpIndex,
    pub enabled: bool,
    /// `0` if never switched on.
    pub last_on_ms: Millis,
    /// `0` if never switched off.
    pub last_off_ms: Millis,
    pub runtime_secs: u64,
}

/// A point-in-time snapshot suitable for logging or transmission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryData {
    pub uptime_ms: Millis,
    pub operating_mode: OperatingMode,
    /// `None` when the installation reports no heating/cooling demand.
    pub hvac_mode: Option<HvacMode>,
    pub buffer_temp_c: f32,
    pub target_temp_c: f32,
    pub pumps: [PumpStatus; PUMP_COUNT],
}
