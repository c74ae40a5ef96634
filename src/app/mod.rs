//! Application core: orchestration around the pump controller, zero I/O.
//!
//! This module wraps the [`Controller`](crate::control::Controller) with
//! the operating-mode rules, manual overrides and periodic status
//! reporting.  All interaction with the network and relays happens through
//! **port traits** defined in [`ports`].

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
