//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Controller / AppService (domain)
//! ```
//!
//! Driven adapters (clock, runtime registry, relays, event sinks, config
//! storage) implement these traits.  The domain consumes them via generics,
//! so the control core never touches the network or GPIO directly.

use std::rc::Rc;

use crate::config::SystemConfig;
use crate::control::{HvacMode, Millis, PUMP_COUNT, PumpIndex};

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond time source.  Must never go backwards.
pub trait Clock {
    fn now_ms(&self) -> Millis;
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_ms(&self) -> Millis {
        (**self).now_ms()
    }
}

impl<T: Clock + ?Sized> Clock for Rc<T> {
    fn now_ms(&self) -> Millis {
        (**self).now_ms()
    }
}

// ───────────────────────────────────────────────────────────────
// Runtime registry port (driven adapter: domain ↔ runtime authority)
// ───────────────────────────────────────────────────────────────

/// One bulk fetch: `None` means "unknown", never "zero".
pub type RuntimeSnapshot = [Option<u64>; PUMP_COUNT];

/// The external authority on cumulative pump runtimes.
///
/// `fetch_all` may block, but implementations MUST bound the wait with
/// their own timeout and fall back to `None` entries.  `report` is
/// fire-and-forget: failures are logged by the adapter, never surfaced.
pub trait RuntimeRegistry {
    fn fetch_all(&mut self) -> RuntimeSnapshot;

    fn report(&mut self, index: PumpIndex, runtime_secs: u64);

    /// Pick up a configuration change made at runtime.
    fn reconfigure(&mut self, _config: &SystemConfig) {}
}

// ───────────────────────────────────────────────────────────────
// Relay port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the pump relays.
pub trait RelayPort {
    /// Energise (`true`) or release (`false`) one pump relay.
    fn set_relay(&mut self, index: PumpIndex, on: bool);

    /// Release every relay (safe shutdown).
    fn all_off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Mode source port (driven adapter: installation → domain)
// ───────────────────────────────────────────────────────────────

/// Reports whether the heat pump is currently heating or cooling.
/// `None` means there is no demand (or it could not be determined).
pub trait ModeSource {
    fn current_mode(&mut self) -> Option<HvacMode>;

    fn reconfigure(&mut self, _config: &SystemConfig) {}
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, MQTT,
/// dashboard buffer, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);

    /// Pick up a configuration change made at runtime.
    fn reconfigure(&mut self, _config: &SystemConfig) {}
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from storage.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::NotFound => Self::Config("not found"),
            ConfigError::Corrupted => Self::Config("corrupted"),
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::IoError => Self::Config("I/O error"),
        }
    }
}
