//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (dashboard,
//! MQTT command topic, firmware updater) that the
//! [`AppService`](super::service::AppService) interprets and acts upon.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::config::SystemConfig;

/// Who decides when pumps switch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatingMode {
    /// The rotation policy runs every tick.
    #[default]
    Automatic,
    /// Regulation is suspended; pumps change only on command.
    Manual,
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Automatic => write!(f, "automatic"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// Commands that external adapters can send into the application core.
///
/// Pump indices arrive unvalidated from the outside world.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Switch between automatic and manual control.  Entering manual mode
    /// shuts every pump down first.
    SetOperatingMode(OperatingMode),

    /// Flip one pump (manual mode only).
    TogglePump(usize),

    /// Switch one pump off, in any mode.
    ForcePumpOff(usize),

    /// Switch every pump off.
    ShutdownAll,

    /// Enter the safe state ahead of a firmware flash: all pumps off,
    /// manual mode.
    PrepareFirmwareUpdate,

    /// Hot-reload configuration.
    UpdateConfig(SystemConfig),
}
