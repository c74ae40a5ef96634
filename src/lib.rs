//! Buffer pump rotation library.
//!
//! Exposes the control core, the application service and its adapters for
//! the bench simulator and integration tests.  ESP-IDF specifics are
//! guarded by the `espidf` feature inside each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod diagnostics;
pub mod drivers;
pub mod error;
