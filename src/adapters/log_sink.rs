//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (serial console on the device, stderr plus the
//! dashboard debug buffer on the host).

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                let mode = t.hvac_mode.map_or("idle".into(), |m| m.to_string());
                info!(
                    "TELEM | {} {} | buffer={:.1}/{:.1}\u{00b0}C | pumps={}{}{} | runtime={}/{}/{}s",
                    t.operating_mode,
                    mode,
                    t.buffer_temp_c,
                    t.target_temp_c,
                    on_off(t.pumps[0].enabled),
                    on_off(t.pumps[1].enabled),
                    on_off(t.pumps[2].enabled),
                    t.pumps[0].runtime_secs,
                    t.pumps[1].runtime_secs,
                    t.pumps[2].runtime_secs,
                );
            }
            AppEvent::PumpSwitched {
                index,
                enabled,
                cause,
            } => {
                info!(
                    "PUMP  | {} {} ({:?})",
                    index,
                    if *enabled { "on" } else { "off" },
                    cause
                );
            }
            AppEvent::OperatingModeChanged { from, to } => {
                info!("MODE  | {} -> {}", from, to);
            }
            AppEvent::Started { mode, uptime_ms } => {
                info!("START | mode={} uptime={}ms", mode, uptime_ms);
            }
        }
    }
}

fn on_off(enabled: bool) -> char {
    if enabled { '1' } else { '0' }
}
