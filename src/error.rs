//! Unified error types for the buffer pump controller.
//!
//! The control core itself never fails: out-of-range indices fall back to
//! safe defaults and missing runtime data is treated as "no news".  These
//! types cover the edges around it: command validation, configuration and
//! transport adapters.  All variants are `Copy` so they can be handed to
//! the dashboard or logged without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A pump index outside `0..PUMP_COUNT` was supplied.
    InvalidPumpIndex(usize),
    /// The command is only accepted while the service runs in manual mode.
    ManualModeRequired,
    /// Configuration failed validation or could not be stored.
    Config(&'static str),
    /// A transport collaborator failed.
    Comms(CommsError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPumpIndex(i) => write!(f, "invalid pump index {i}"),
            Self::ManualModeRequired => write!(f, "command requires manual mode"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    /// The broker connection is down.
    Disconnected,
    /// The broker refused or dropped a publish.
    PublishFailed,
    /// A subscribe/unsubscribe request failed.
    SubscribeFailed,
    /// An outgoing payload could not be encoded.
    EncodeFailed,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "broker disconnected"),
            Self::PublishFailed => write!(f, "publish failed"),
            Self::SubscribeFailed => write!(f, "subscribe failed"),
            Self::EncodeFailed => write!(f, "payload encoding failed"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
