//! Mock adapters for integration tests.
//!
//! Each mock records what the domain asked of it so tests can assert on
//! the full history without a broker or relay board.

use std::collections::VecDeque;

use buffer_pumps::adapters::mqtt::{InboundMessage, MqttClient};
use buffer_pumps::app::events::{AppEvent, SwitchCause};
use buffer_pumps::app::ports::{EventSink, RelayPort, RuntimeRegistry, RuntimeSnapshot};
use buffer_pumps::control::{Millis, PUMP_COUNT, PumpIndex};
use buffer_pumps::error::CommsError;

// ── Registry ──────────────────────────────────────────────────

/// Serves queued snapshots, then repeats `fallback` forever.
pub struct MockRegistry {
    pub queued: VecDeque<RuntimeSnapshot>,
    pub fallback: RuntimeSnapshot,
    pub fetches: usize,
    pub reports: Vec<(usize, u64)>,
}

#[allow(dead_code)]
impl MockRegistry {
    pub fn constant(runtimes: [u64; PUMP_COUNT]) -> Self {
        Self {
            queued: VecDeque::new(),
            fallback: runtimes.map(Some),
            fetches: 0,
            reports: Vec::new(),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            queued: VecDeque::new(),
            fallback: [None; PUMP_COUNT],
            fetches: 0,
            reports: Vec::new(),
        }
    }

    pub fn then(mut self, snapshot: RuntimeSnapshot) -> Self {
        self.queued.push_back(snapshot);
        self
    }
}

impl RuntimeRegistry for MockRegistry {
    fn fetch_all(&mut self) -> RuntimeSnapshot {
        self.fetches += 1;
        self.queued.pop_front().unwrap_or(self.fallback)
    }

    fn report(&mut self, index: PumpIndex, runtime_secs: u64) {
        self.reports.push((index.get(), runtime_secs));
    }
}

// ── Relays ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayCall {
    Set { index: usize, on: bool },
    AllOff,
}

#[derive(Default)]
pub struct MockRelays {
    pub calls: Vec<RelayCall>,
    pub state: [bool; PUMP_COUNT],
}

#[allow(dead_code)]
impl MockRelays {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn running(&self) -> usize {
        self.state.iter().filter(|on| **on).count()
    }
}

impl RelayPort for MockRelays {
    fn set_relay(&mut self, index: PumpIndex, on: bool) {
        self.calls.push(RelayCall::Set {
            index: index.get(),
            on,
        });
        self.state[index.get()] = on;
    }

    fn all_off(&mut self) {
        self.calls.push(RelayCall::AllOff);
        self.state = [false; PUMP_COUNT];
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(index, enabled, cause)` for every pump switch, in order.
    pub fn switches(&self) -> Vec<(usize, bool, SwitchCause)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::PumpSwitched {
                    index,
                    enabled,
                    cause,
                } => Some((index.get(), *enabled, *cause)),
                _ => None,
            })
            .collect()
    }

    pub fn telemetry_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, AppEvent::Telemetry(_)))
            .count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── MQTT ──────────────────────────────────────────────────────

/// Broker stand-in: retained messages are replayed on every subscribe.
#[derive(Default)]
pub struct MockBroker {
    pub connected: bool,
    pub retained: Vec<InboundMessage>,
    pub inbox: VecDeque<InboundMessage>,
    pub published: Vec<(String, String)>,
}

#[allow(dead_code)]
impl MockBroker {
    pub fn online() -> Self {
        Self {
            connected: true,
            ..Self::default()
        }
    }

    pub fn retain(&mut self, topic: &str, payload: &str) {
        self.retained.retain(|m| m.topic != topic);
        self.retained.push(InboundMessage {
            topic: topic.into(),
            payload: payload.as_bytes().to_vec(),
        });
    }

    pub fn last_published(&self, topic: &str) -> Option<&str> {
        self.published
            .iter()
            .rev()
            .find(|(t, _)| t == topic)
            .map(|(_, p)| p.as_str())
    }
}

impl MqttClient for MockBroker {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn publish(&mut self, topic: &str, payload: &[u8], _retain: bool) -> Result<(), CommsError> {
        self.published
            .push((topic.into(), String::from_utf8_lossy(payload).into_owned()));
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), CommsError> {
        let matching = self.retained.iter().filter(|m| m.topic == topic).cloned();
        self.inbox.extend(matching);
        Ok(())
    }

    fn unsubscribe(&mut self, _topic: &str) -> Result<(), CommsError> {
        Ok(())
    }

    fn poll(&mut self, _timeout_ms: Millis) -> Option<InboundMessage> {
        self.inbox.pop_front()
    }
}
