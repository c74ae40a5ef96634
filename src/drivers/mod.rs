//! Hardware drivers.

pub mod relay;
