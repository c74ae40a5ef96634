//! MQTT adapters.
//!
//! The broker is the installation's runtime registry and status bus.
//! Connection management lives outside this crate; everything here talks
//! to an already-established session through the [`MqttClient`] port.
//!
//! | Adapter                | Implements        | Topics                                   |
//! |------------------------|-------------------|------------------------------------------|
//! | `MqttRuntimeRegistry`  | RuntimeRegistry   | `{p}/pump/{i}/status` ⇣, `{p}/runtime/{i}` ⇡ |
//! | `MqttModeSource`       | ModeSource        | `{p}/mode` ⇣                              |
//! | `MqttEventSink`        | EventSink         | `{p}/relay/{i}/status` ⇡, `{p}/buffer_temperature` ⇡, `{p}/starttijd` ⇡ |
//!
//! All adapters share one client through [`SharedMqtt`] and one
//! [`MqttSettings`] cell, so a runtime config change reaches every adapter
//! at once.  Payloads are small JSON objects; every publish is retained so
//! late subscribers see the latest state.

use core::fmt::Write;
use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::app::events::{AppEvent, TelemetryData};
use crate::app::ports::{Clock, EventSink, ModeSource, RuntimeRegistry, RuntimeSnapshot};
use crate::config::SystemConfig;
use crate::control::{HvacMode, Millis, PUMP_COUNT, PumpIndex};
use crate::error::CommsError;

// ───────────────────────────────────────────────────────────────
// Client port
// ───────────────────────────────────────────────────────────────

/// A message received on a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// Minimal synchronous MQTT session.
pub trait MqttClient {
    fn is_connected(&self) -> bool;

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), CommsError>;

    fn subscribe(&mut self, topic: &str) -> Result<(), CommsError>;

    fn unsubscribe(&mut self, topic: &str) -> Result<(), CommsError>;

    /// Wait up to `timeout_ms` for the next inbound message.  `None` means
    /// nothing arrived in time.
    fn poll(&mut self, timeout_ms: Millis) -> Option<InboundMessage>;
}

/// One client shared by every adapter in this module.
pub type SharedMqtt<M> = Rc<RefCell<M>>;

pub type Topic = heapless::String<64>;

/// Topic layout and wait bounds, shared by every adapter on a session.
#[derive(Debug, Clone)]
pub struct MqttSettings {
    pub topics: Topics,
    pub registry_timeout_ms: Millis,
    pub mode_timeout_ms: Millis,
}

impl MqttSettings {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            topics: Topics::new(&config.mqtt_topic_prefix),
            registry_timeout_ms: config.registry_timeout_ms.into(),
            mode_timeout_ms: config.mode_timeout_ms.into(),
        }
    }

    pub fn shared(config: &SystemConfig) -> SharedSettings {
        Rc::new(RefCell::new(Self::from_config(config)))
    }
}

pub type SharedSettings = Rc<RefCell<MqttSettings>>;

fn apply_config(settings: &SharedSettings, config: &SystemConfig) {
    let next = MqttSettings::from_config(config);
    let mut current = settings.borrow_mut();
    if current.topics.prefix != next.topics.prefix {
        info!(
            "MQTT topic prefix {} -> {}",
            current.topics.prefix, next.topics.prefix
        );
    }
    *current = next;
}

// ───────────────────────────────────────────────────────────────
// Topic layout
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Topics {
    prefix: heapless::String<24>,
}

impl Topics {
    pub fn new(prefix: &heapless::String<24>) -> Self {
        Self {
            prefix: prefix.clone(),
        }
    }

    /// Inbound: cumulative runtime as tracked by the registry.
    pub fn pump_status(&self, index: PumpIndex) -> Topic {
        self.format(format_args!("{}/pump/{}/status", self.prefix, index.get()))
    }

    /// Outbound: runtime echo.
    pub fn runtime(&self, index: PumpIndex) -> Topic {
        self.format(format_args!("{}/runtime/{}", self.prefix, index.get()))
    }

    /// Outbound: relay state and timestamps.
    pub fn relay_status(&self, index: PumpIndex) -> Topic {
        self.format(format_args!("{}/relay/{}/status", self.prefix, index.get()))
    }

    pub fn buffer_temperature(&self) -> Topic {
        self.format(format_args!("{}/buffer_temperature", self.prefix))
    }

    pub fn mode(&self) -> Topic {
        self.format(format_args!("{}/mode", self.prefix))
    }

    /// Outbound: when the controller last started.
    pub fn start_time(&self) -> Topic {
        self.format(format_args!("{}/starttijd", self.prefix))
    }

    fn pump_status_index(&self, topic: &str) -> Option<PumpIndex> {
        PumpIndex::ALL
            .into_iter()
            .find(|i| self.pump_status(*i).as_str() == topic)
    }

    fn format(&self, args: core::fmt::Arguments<'_>) -> Topic {
        let mut s = Topic::new();
        // 24-byte prefix plus the longest suffix fits in 64.
        let _ = s.write_fmt(args);
        s
    }
}

// ───────────────────────────────────────────────────────────────
// Payloads
// ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct PumpStatusPayload {
    run_time: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct RuntimePayload {
    runtime: u64,
}

#[derive(Serialize)]
struct RelayStatusPayload {
    status: &'static str,
    last_on: Millis,
    last_off: Millis,
}

#[derive(Serialize)]
struct BufferTemperaturePayload {
    buffer_temperature: f32,
}

#[derive(Serialize)]
struct StartTimePayload {
    uptime_ms: Millis,
}

/// Extract `run_time` seconds.  Missing, negative or non-numeric values
/// are "unknown"; fractional seconds are truncated.
fn parse_run_time(payload: &[u8]) -> Option<u64> {
    let parsed: PumpStatusPayload = serde_json::from_slice(payload).ok()?;
    let value = parsed.run_time?;
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0)
            .map(|f| f as u64)
    })
}

fn publish_json<M: MqttClient>(
    client: &mut M,
    topic: &str,
    payload: &impl Serialize,
) -> Result<(), CommsError> {
    let bytes = serde_json::to_vec(payload).map_err(|_| CommsError::EncodeFailed)?;
    client.publish(topic, &bytes, true)
}

// ───────────────────────────────────────────────────────────────
// Runtime registry
// ───────────────────────────────────────────────────────────────

pub struct MqttRuntimeRegistry<M, C> {
    client: SharedMqtt<M>,
    clock: C,
    settings: SharedSettings,
}

impl<M: MqttClient, C: Clock> MqttRuntimeRegistry<M, C> {
    pub fn new(client: SharedMqtt<M>, clock: C, settings: SharedSettings) -> Self {
        Self {
            client,
            clock,
            settings,
        }
    }
}

impl<M: MqttClient, C: Clock> RuntimeRegistry for MqttRuntimeRegistry<M, C> {
    fn fetch_all(&mut self) -> RuntimeSnapshot {
        let mut runtimes = [None; PUMP_COUNT];
        let MqttSettings {
            topics,
            registry_timeout_ms: timeout_ms,
            ..
        } = self.settings.borrow().clone();
        let mut client = self.client.borrow_mut();
        if !client.is_connected() {
            warn!("Runtime fetch skipped: broker disconnected");
            return runtimes;
        }

        for index in PumpIndex::ALL {
            if let Err(e) = client.subscribe(&topics.pump_status(index)) {
                warn!("Subscribe for {} failed: {}", index, e);
            }
        }

        let start = self.clock.now_ms();
        while runtimes.iter().any(Option::is_none) {
            let elapsed = self.clock.now_ms().saturating_sub(start);
            if elapsed >= timeout_ms {
                break;
            }
            let Some(msg) = client.poll(timeout_ms - elapsed) else {
                break;
            };
            let Some(index) = topics.pump_status_index(&msg.topic) else {
                continue;
            };
            match parse_run_time(&msg.payload) {
                Some(secs) => runtimes[index.get()] = Some(secs),
                None => debug!("Ignoring malformed status for {}", index),
            }
        }

        for index in PumpIndex::ALL {
            if let Err(e) = client.unsubscribe(&topics.pump_status(index)) {
                warn!("Unsubscribe for {} failed: {}", index, e);
            }
        }

        if runtimes.iter().any(Option::is_none) {
            warn!("Runtime fetch incomplete: {:?}", runtimes);
        }
        runtimes
    }

    fn report(&mut self, index: PumpIndex, runtime_secs: u64) {
        let mut client = self.client.borrow_mut();
        if !client.is_connected() {
            return;
        }
        let payload = RuntimePayload {
            runtime: runtime_secs,
        };
        let topic = self.settings.borrow().topics.runtime(index);
        if let Err(e) = publish_json(&mut *client, &topic, &payload) {
            warn!("Runtime publish for {} failed: {}", index, e);
        }
    }

    fn reconfigure(&mut self, config: &SystemConfig) {
        apply_config(&self.settings, config);
    }
}

// ───────────────────────────────────────────────────────────────
// Mode source
// ───────────────────────────────────────────────────────────────

pub struct MqttModeSource<M, C> {
    client: SharedMqtt<M>,
    clock: C,
    settings: SharedSettings,
}

impl<M: MqttClient, C: Clock> MqttModeSource<M, C> {
    pub fn new(client: SharedMqtt<M>, clock: C, settings: SharedSettings) -> Self {
        Self {
            client,
            clock,
            settings,
        }
    }
}

impl<M: MqttClient, C: Clock> ModeSource for MqttModeSource<M, C> {
    fn current_mode(&mut self) -> Option<HvacMode> {
        let mut client = self.client.borrow_mut();
        if !client.is_connected() {
            return None;
        }
        let (topic, timeout_ms) = {
            let settings = self.settings.borrow();
            (settings.topics.mode(), settings.mode_timeout_ms)
        };
        if let Err(e) = client.subscribe(&topic) {
            warn!("Subscribe for mode failed: {}", e);
            return None;
        }

        let start = self.clock.now_ms();
        let mut mode = None;
        loop {
            let elapsed = self.clock.now_ms().saturating_sub(start);
            if elapsed >= timeout_ms {
                break;
            }
            let Some(msg) = client.poll(timeout_ms - elapsed) else {
                break;
            };
            if msg.topic != topic.as_str() {
                continue;
            }
            // Only a recognised mode ends the wait.
            mode = core::str::from_utf8(&msg.payload)
                .ok()
                .and_then(HvacMode::parse);
            if mode.is_some() {
                break;
            }
        }

        if let Err(e) = client.unsubscribe(&topic) {
            warn!("Unsubscribe for mode failed: {}", e);
        }
        mode
    }

    fn reconfigure(&mut self, config: &SystemConfig) {
        apply_config(&self.settings, config);
    }
}

// ───────────────────────────────────────────────────────────────
// Status publisher
// ───────────────────────────────────────────────────────────────

pub struct MqttEventSink<M> {
    client: SharedMqtt<M>,
    settings: SharedSettings,
}

impl<M: MqttClient> MqttEventSink<M> {
    pub fn new(client: SharedMqtt<M>, settings: SharedSettings) -> Self {
        Self { client, settings }
    }

    fn publish_start(&self, uptime_ms: Millis) {
        let mut client = self.client.borrow_mut();
        if !client.is_connected() {
            return;
        }
        let topic = self.settings.borrow().topics.start_time();
        if let Err(e) = publish_json(&mut *client, &topic, &StartTimePayload { uptime_ms }) {
            warn!("Start time publish failed: {}", e);
        }
    }

    fn publish_telemetry(&self, t: &TelemetryData) {
        let mut client = self.client.borrow_mut();
        if !client.is_connected() {
            return;
        }
        let topics = self.settings.borrow().topics.clone();
        for pump in &t.pumps {
            let payload = RelayStatusPayload {
                status: if pump.enabled { "ON" } else { "OFF" },
                last_on: pump.last_on_ms,
                last_off: pump.last_off_ms,
            };
            let topic = topics.relay_status(pump.index);
            if let Err(e) = publish_json(&mut *client, &topic, &payload) {
                warn!("Relay status publish for {} failed: {}", pump.index, e);
            }
        }
        let payload = BufferTemperaturePayload {
            buffer_temperature: t.buffer_temp_c,
        };
        if let Err(e) = publish_json(&mut *client, &topics.buffer_temperature(), &payload) {
            warn!("Buffer temperature publish failed: {}", e);
        }
    }
}

impl<M: MqttClient> EventSink for MqttEventSink<M> {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => self.publish_telemetry(t),
            AppEvent::Started { uptime_ms, .. } => self.publish_start(*uptime_ms),
            _ => {}
        }
    }

    fn reconfigure(&mut self, config: &SystemConfig) {
        apply_config(&self.settings, config);
    }
}
