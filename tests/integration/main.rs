//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises one subsystem against
//! mock adapters.  Everything runs on the host with simulated time.

mod app_service_tests;
mod mock_adapters;
