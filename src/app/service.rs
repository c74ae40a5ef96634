//! Application service, the hexagonal core.
//!
//! [`AppService`] owns the pump [`Controller`] together with the
//! operating mode (automatic/manual) and the telemetry schedule.  It
//! exposes a hardware-agnostic API; relays and event sinks are injected at
//! call sites, the runtime registry and clock at construction.
//!
//! ```text
//!  BufferReading ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                    │       AppService        │
//!  AppCommand ─────▶ │  mode · Controller      │ ──▶ RelayPort
//!                    └────────────────────────┘
//! ```

use log::{debug, info, warn};

use crate::config::SystemConfig;
use crate::control::{Controller, HvacMode, Millis, PUMP_COUNT, PumpIndex};
use crate::error::{Error, Result};

use super::commands::{AppCommand, OperatingMode};
use super::events::{AppEvent, PumpStatus, SwitchCause, TelemetryData};
use super::ports::{Clock, ConfigPort, EventSink, RelayPort, RuntimeRegistry};

/// One sample from the buffer sensor and the installation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferReading {
    pub current_temp_c: f32,
    pub target_temp_c: f32,
    /// `None` when there is no heating/cooling demand.
    pub mode: Option<HvacMode>,
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService<R, C> {
    controller: Controller<R, C>,
    config: SystemConfig,
    operating_mode: OperatingMode,
    last_reading: Option<BufferReading>,
    last_telemetry: Option<Millis>,
    tick_count: u64,
}

impl<R: RuntimeRegistry, C: Clock> AppService<R, C> {
    /// Construct the service.  The controller pulls its first runtime
    /// snapshot from `registry` here.
    pub fn new(config: SystemConfig, registry: R, clock: C) -> Self {
        let controller = Controller::new(config.timing(), registry, clock);
        Self {
            controller,
            config,
            operating_mode: OperatingMode::Automatic,
            last_reading: None,
            last_telemetry: None,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Put the relays in a known state and announce the start.
    pub fn start(&mut self, relays: &mut impl RelayPort, sink: &mut impl EventSink) {
        relays.all_off();
        self.apply_relays(relays);
        sink.emit(&AppEvent::Started {
            mode: self.operating_mode,
            uptime_ms: self.controller.clock().now_ms(),
        });
        info!("AppService started in {} mode", self.operating_mode);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle: regulate → relays → telemetry.
    pub fn tick(
        &mut self,
        reading: BufferReading,
        relays: &mut impl RelayPort,
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;
        self.last_reading = Some(reading);

        match (self.operating_mode, reading.mode) {
            (OperatingMode::Automatic, Some(mode)) => {
                let rotation = self.controller.update(
                    reading.current_temp_c,
                    reading.target_temp_c,
                    mode.is_heating(),
                    self.config.hysteresis_c,
                );
                if let Some(r) = rotation {
                    sink.emit(&AppEvent::PumpSwitched {
                        index: r.index,
                        enabled: r.enable,
                        cause: SwitchCause::Rotation,
                    });
                }
            }
            (OperatingMode::Automatic, None) => {
                debug!("No heating/cooling demand, pumps held");
                self.controller.sync_runtimes_if_due();
            }
            (OperatingMode::Manual, _) => {
                self.controller.sync_runtimes_if_due();
            }
        }

        self.apply_relays(relays);

        let now = self.controller.clock().now_ms();
        let interval = Millis::from(self.config.status_publish_interval_secs) * 1000;
        if self
            .last_telemetry
            .is_none_or(|t| now.saturating_sub(t) >= interval)
        {
            self.last_telemetry = Some(now);
            sink.emit(&AppEvent::Telemetry(self.build_telemetry()));
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (dashboard, MQTT, updater).
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        relays: &mut impl RelayPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let result = self.dispatch(cmd, sink);
        if let Err(e) = &result {
            warn!("Command rejected: {}", e);
        }
        self.apply_relays(relays);
        result
    }

    fn dispatch(&mut self, cmd: AppCommand, sink: &mut impl EventSink) -> Result<()> {
        match cmd {
            AppCommand::SetOperatingMode(mode) => {
                self.set_operating_mode(mode, sink);
            }
            AppCommand::TogglePump(index) => {
                if self.operating_mode != OperatingMode::Manual {
                    return Err(Error::ManualModeRequired);
                }
                let index = PumpIndex::try_from(index)?;
                let enable = !self.controller.pump(index).enabled;
                if enable {
                    self.controller.force_pump_on(index.get());
                } else {
                    self.controller.force_pump_off(index.get());
                }
                sink.emit(&AppEvent::PumpSwitched {
                    index,
                    enabled: enable,
                    cause: SwitchCause::Manual,
                });
            }
            AppCommand::ForcePumpOff(index) => {
                let index = PumpIndex::try_from(index)?;
                if self.controller.pump(index).enabled {
                    self.controller.force_pump_off(index.get());
                    sink.emit(&AppEvent::PumpSwitched {
                        index,
                        enabled: false,
                        cause: SwitchCause::Manual,
                    });
                }
            }
            AppCommand::ShutdownAll => {
                self.shutdown(sink);
            }
            AppCommand::PrepareFirmwareUpdate => {
                info!("Entering safe state for firmware update");
                self.set_operating_mode(OperatingMode::Manual, sink);
                // Pumps may have been toggled on while already in manual mode.
                self.shutdown(sink);
            }
            AppCommand::UpdateConfig(new_config) => {
                new_config.validate()?;
                self.controller.set_timing(new_config.timing());
                // Topic prefix and wait bounds live in the adapters.
                self.controller.registry_mut().reconfigure(&new_config);
                sink.reconfigure(&new_config);
                self.config = new_config;
                info!("Configuration updated at runtime");
            }
        }
        Ok(())
    }

    fn set_operating_mode(&mut self, mode: OperatingMode, sink: &mut impl EventSink) {
        let from = self.operating_mode;
        if from == mode {
            return;
        }
        if mode == OperatingMode::Manual {
            self.shutdown(sink);
        }
        self.operating_mode = mode;
        info!("Operating mode {} -> {}", from, mode);
        sink.emit(&AppEvent::OperatingModeChanged { from, to: mode });
    }

    fn shutdown(&mut self, sink: &mut impl EventSink) {
        let was_on = self.controller.pumps().map(|p| p.enabled);
        self.controller.shutdown_all_pumps();
        for (index, on) in PumpIndex::ALL.into_iter().zip(was_on) {
            if on {
                sink.emit(&AppEvent::PumpSwitched {
                    index,
                    enabled: false,
                    cause: SwitchCause::Shutdown,
                });
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn build_telemetry(&self) -> TelemetryData {
        let reading = self.last_reading;
        TelemetryData {
            uptime_ms: self.controller.clock().now_ms(),
            operating_mode: self.operating_mode,
            hvac_mode: reading.and_then(|r| r.mode),
            buffer_temp_c: reading.map_or(0.0, |r| r.current_temp_c),
            target_temp_c: reading.map_or(0.0, |r| r.target_temp_c),
            pumps: self.pump_statuses(),
        }
    }

    pub fn pump_statuses(&self) -> [PumpStatus; PUMP_COUNT] {
        PumpIndex::ALL.map(|index| {
            let i = index.get();
            PumpStatus {
                index,
                enabled: self.controller.pump_status(i),
                last_on_ms: self.controller.last_on_time(i),
                last_off_ms: self.controller.last_off_time(i),
                runtime_secs: self.controller.saved_runtime_secs(i),
            }
        })
    }

    pub fn operating_mode(&self) -> OperatingMode {
        self.operating_mode
    }

    pub fn controller(&self) -> &Controller<R, C> {
        &self.controller
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Persist the live configuration.
    pub fn save_config(&self, store: &impl ConfigPort) -> Result<()> {
        store.save(&self.config)?;
        info!("Config saved");
        Ok(())
    }

    // ── Internal ──────────────────────────────────────────────

    /// Mirror the controller's pump table onto the relays.
    fn apply_relays(&self, relays: &mut impl RelayPort) {
        for index in PumpIndex::ALL {
            relays.set_relay(index, self.controller.pump(index).enabled);
        }
    }
}
