//! System configuration parameters
//!
//! All tunable parameters for the buffer pump controller.
//! Values can be overridden through a [`ConfigPort`](crate::app::ports::ConfigPort)
//! backend or the dashboard.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::control::Millis;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Regulation ---
    /// Deadband half-width around the buffer setpoint (°C)
    pub hysteresis_c: f32,

    // --- Wear protection ---
    /// Minimum time a pump stays off before it may be switched on again (seconds)
    pub min_off_dwell_secs: u32,
    /// Minimum time between any two automatic pump changes (seconds)
    pub min_change_interval_secs: u32,

    // --- Runtime registry ---
    /// How often runtimes are resynchronised from the registry (seconds)
    pub runtime_sync_interval_secs: u32,
    /// Upper bound for one bulk runtime fetch (milliseconds)
    pub registry_timeout_ms: u32,
    /// Upper bound for one heating/cooling mode query (milliseconds)
    pub mode_timeout_ms: u32,
    /// Topic prefix shared by every registry/publish topic
    pub mqtt_topic_prefix: heapless::String<24>,

    // --- Timing ---
    /// Control loop interval (milliseconds)
    pub control_loop_interval_ms: u32,
    /// Pump status publish interval (seconds)
    pub status_publish_interval_secs: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut prefix = heapless::String::new();
        let _ = prefix.push_str("warmtepomp");
        Self {
            hysteresis_c: 5.0,

            min_off_dwell_secs: 15 * 60,
            min_change_interval_secs: 30 * 60,

            runtime_sync_interval_secs: 10 * 60,
            registry_timeout_ms: 5_000,
            mode_timeout_ms: 2_000,
            mqtt_topic_prefix: prefix,

            control_loop_interval_ms: 1_000, // 1 Hz
            status_publish_interval_secs: 10,
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.hysteresis_c.is_finite() || !(0.0..=20.0).contains(&self.hysteresis_c) {
            return Err(ConfigError::ValidationFailed(
                "hysteresis_c must be 0.0–20.0",
            ));
        }
        if self.min_off_dwell_secs > 24 * 3600 {
            return Err(ConfigError::ValidationFailed(
                "min_off_dwell_secs must be at most one day",
            ));
        }
        if self.min_change_interval_secs > 24 * 3600 {
            return Err(ConfigError::ValidationFailed(
                "min_change_interval_secs must be at most one day",
            ));
        }
        if !(60..=24 * 3600).contains(&self.runtime_sync_interval_secs) {
            return Err(ConfigError::ValidationFailed(
                "runtime_sync_interval_secs must be 60–86400",
            ));
        }
        if !(100..=30_000).contains(&self.registry_timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "registry_timeout_ms must be 100–30000",
            ));
        }
        if !(100..=30_000).contains(&self.mode_timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "mode_timeout_ms must be 100–30000",
            ));
        }
        if self.mqtt_topic_prefix.is_empty()
            || self
                .mqtt_topic_prefix
                .chars()
                .any(|c| matches!(c, '#' | '+' | '/'))
        {
            return Err(ConfigError::ValidationFailed(
                "mqtt_topic_prefix must be a single non-wildcard topic level",
            ));
        }
        if !(100..=60_000).contains(&self.control_loop_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "control_loop_interval_ms must be 100–60000",
            ));
        }
        if !(1..=3600).contains(&self.status_publish_interval_secs) {
            return Err(ConfigError::ValidationFailed(
                "status_publish_interval_secs must be 1–3600",
            ));
        }
        Ok(())
    }

    /// Dwell and cooldown periods in the controller's millisecond units.
    pub fn timing(&self) -> ControlTiming {
        ControlTiming {
            min_off_dwell_ms: secs_to_ms(self.min_off_dwell_secs),
            min_change_interval_ms: secs_to_ms(self.min_change_interval_secs),
            runtime_sync_interval_ms: secs_to_ms(self.runtime_sync_interval_secs),
        }
    }
}

/// Timing rules enforced by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlTiming {
    pub min_off_dwell_ms: Millis,
    pub min_change_interval_ms: Millis,
    pub runtime_sync_interval_ms: Millis,
}

impl Default for ControlTiming {
    fn default() -> Self {
        SystemConfig::default().timing()
    }
}

fn secs_to_ms(secs: u32) -> Millis {
    Millis::from(secs) * 1000
}
