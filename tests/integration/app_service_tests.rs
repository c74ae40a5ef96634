//! Integration tests for the AppService → Controller → relays pipeline.
//!
//! Simulated time only: every test drives a `ManualClock` by hand.

use buffer_pumps::adapters::config_store::MemoryConfigStore;
use buffer_pumps::adapters::sim::ManualClock;
use buffer_pumps::app::commands::{AppCommand, OperatingMode};
use buffer_pumps::app::events::{AppEvent, SwitchCause};
use buffer_pumps::app::ports::ConfigPort;
use buffer_pumps::app::service::{AppService, BufferReading};
use buffer_pumps::config::SystemConfig;
use buffer_pumps::control::{HvacMode, Millis};
use buffer_pumps::error::Error;

use crate::mock_adapters::{MockRegistry, MockRelays, RecordingSink, RelayCall};

const MIN: Millis = 60 * 1000;
/// Default change interval; the controller holds every pump until it
/// has passed since start-up.
const BOOT_HOLD: Millis = 30 * MIN;

const COLD: BufferReading = BufferReading {
    current_temp_c: 30.0,
    target_temp_c: 45.0,
    mode: Some(HvacMode::Heating),
};

const ON_TARGET: BufferReading = BufferReading {
    current_temp_c: 45.0,
    target_temp_c: 45.0,
    mode: Some(HvacMode::Heating),
};

fn make_app(clock: &ManualClock) -> (AppService<MockRegistry, &ManualClock>, MockRelays, RecordingSink) {
    let registry = MockRegistry::constant([300, 100, 200]);
    let mut app = AppService::new(SystemConfig::default(), registry, clock);
    let mut relays = MockRelays::new();
    let mut sink = RecordingSink::new();
    app.start(&mut relays, &mut sink);
    (app, relays, sink)
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn start_releases_every_relay_and_announces() {
    let clock = ManualClock::new(0);
    let (app, relays, sink) = make_app(&clock);

    assert_eq!(relays.calls.first(), Some(&RelayCall::AllOff));
    assert_eq!(relays.running(), 0);
    assert!(matches!(
        sink.events.as_slice(),
        [AppEvent::Started {
            mode: OperatingMode::Automatic,
            uptime_ms: 0
        }]
    ));
    assert_eq!(app.operating_mode(), OperatingMode::Automatic);
    // Initial resync pulled and echoed the runtimes.
    assert_eq!(app.controller().registry().fetches, 1);
    assert_eq!(app.controller().registry().reports, vec![(0, 300), (1, 100), (2, 200)]);
}

// ── Automatic rotation ────────────────────────────────────────

#[test]
fn cold_buffer_adds_least_worn_pump_then_waits_for_cooldown() {
    let clock = ManualClock::new(0);
    let (mut app, mut relays, mut sink) = make_app(&clock);

    app.tick(COLD, &mut relays, &mut sink);
    assert!(sink.switches().is_empty(), "start-up hold");

    clock.advance(BOOT_HOLD);
    app.tick(COLD, &mut relays, &mut sink);
    assert_eq!(sink.switches(), vec![(1, true, SwitchCause::Rotation)]);
    assert_eq!(relays.state, [false, true, false]);

    clock.advance(29 * MIN);
    app.tick(COLD, &mut relays, &mut sink);
    assert_eq!(sink.switches().len(), 1, "cooldown must block a second change");

    clock.advance(MIN);
    app.tick(COLD, &mut relays, &mut sink);
    assert_eq!(sink.switches()[1], (2, true, SwitchCause::Rotation));
    assert_eq!(relays.state, [false, true, true]);
}

#[test]
fn deadband_holds_pumps() {
    let clock = ManualClock::new(0);
    let (mut app, mut relays, mut sink) = make_app(&clock);

    for _ in 0..10 {
        app.tick(ON_TARGET, &mut relays, &mut sink);
        clock.advance(30 * MIN);
    }
    assert!(sink.switches().is_empty());
    assert_eq!(relays.running(), 0);
}

#[test]
fn no_hvac_demand_holds_pumps() {
    let clock = ManualClock::new(0);
    let (mut app, mut relays, mut sink) = make_app(&clock);

    let idle = BufferReading { mode: None, ..COLD };
    app.tick(idle, &mut relays, &mut sink);
    assert!(sink.switches().is_empty());

    let t = app.build_telemetry();
    assert_eq!(t.hvac_mode, None);
    assert!((t.buffer_temp_c - 30.0).abs() < f32::EPSILON);
}

#[test]
fn runtimes_resync_every_ten_minutes_in_any_mode() {
    let clock = ManualClock::new(0);
    let (mut app, mut relays, mut sink) = make_app(&clock);
    app.handle_command(
        AppCommand::SetOperatingMode(OperatingMode::Manual),
        &mut relays,
        &mut sink,
    )
    .unwrap();

    clock.advance(9 * MIN);
    app.tick(ON_TARGET, &mut relays, &mut sink);
    assert_eq!(app.controller().registry().fetches, 1);

    clock.advance(MIN);
    app.tick(ON_TARGET, &mut relays, &mut sink);
    assert_eq!(app.controller().registry().fetches, 2);
}

// ── Operating mode ────────────────────────────────────────────

#[test]
fn manual_mode_shuts_down_and_stops_rotation() {
    let clock = ManualClock::new(0);
    let (mut app, mut relays, mut sink) = make_app(&clock);
    clock.advance(BOOT_HOLD);
    app.tick(COLD, &mut relays, &mut sink);
    assert_eq!(relays.running(), 1);
    sink.clear();

    app.handle_command(
        AppCommand::SetOperatingMode(OperatingMode::Manual),
        &mut relays,
        &mut sink,
    )
    .unwrap();
    assert_eq!(relays.running(), 0);
    assert_eq!(sink.switches(), vec![(1, false, SwitchCause::Shutdown)]);
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::OperatingModeChanged {
            from: OperatingMode::Automatic,
            to: OperatingMode::Manual
        }
    )));

    clock.advance(60 * MIN);
    app.tick(COLD, &mut relays, &mut sink);
    assert_eq!(relays.running(), 0, "manual mode never rotates");
}

#[test]
fn setting_the_same_mode_is_a_no_op() {
    let clock = ManualClock::new(0);
    let (mut app, mut relays, mut sink) = make_app(&clock);
    sink.clear();
    app.handle_command(
        AppCommand::SetOperatingMode(OperatingMode::Automatic),
        &mut relays,
        &mut sink,
    )
    .unwrap();
    assert!(sink.events.is_empty());
}

#[test]
fn toggle_switches_pumps_in_manual_mode() {
    let clock = ManualClock::new(0);
    let (mut app, mut relays, mut sink) = make_app(&clock);
    app.handle_command(
        AppCommand::SetOperatingMode(OperatingMode::Manual),
        &mut relays,
        &mut sink,
    )
    .unwrap();
    sink.clear();

    app.handle_command(AppCommand::TogglePump(2), &mut relays, &mut sink)
        .unwrap();
    assert_eq!(relays.state, [false, false, true]);
    app.handle_command(AppCommand::TogglePump(2), &mut relays, &mut sink)
        .unwrap();
    assert_eq!(relays.state, [false, false, false]);
    assert_eq!(
        sink.switches(),
        vec![(2, true, SwitchCause::Manual), (2, false, SwitchCause::Manual)]
    );
    // Overrides leave the dwell timestamps alone.
    assert_eq!(app.controller().last_off_time(2), 0);
}

#[test]
fn toggle_rejects_bad_index() {
    let clock = ManualClock::new(0);
    let (mut app, mut relays, mut sink) = make_app(&clock);
    app.handle_command(
        AppCommand::SetOperatingMode(OperatingMode::Manual),
        &mut relays,
        &mut sink,
    )
    .unwrap();
    let r = app.handle_command(AppCommand::TogglePump(3), &mut relays, &mut sink);
    assert_eq!(r, Err(Error::InvalidPumpIndex(3)));
}

#[test]
fn force_off_works_in_automatic_mode() {
    let clock = ManualClock::new(0);
    let (mut app, mut relays, mut sink) = make_app(&clock);
    clock.advance(BOOT_HOLD);
    app.tick(COLD, &mut relays, &mut sink);
    sink.clear();

    app.handle_command(AppCommand::ForcePumpOff(1), &mut relays, &mut sink)
        .unwrap();
    assert_eq!(relays.running(), 0);
    assert_eq!(sink.switches(), vec![(1, false, SwitchCause::Manual)]);

    // Already off: accepted, nothing emitted.
    sink.clear();
    app.handle_command(AppCommand::ForcePumpOff(1), &mut relays, &mut sink)
        .unwrap();
    assert!(sink.switches().is_empty());

    let r = app.handle_command(AppCommand::ForcePumpOff(9), &mut relays, &mut sink);
    assert_eq!(r, Err(Error::InvalidPumpIndex(9)));
}

#[test]
fn firmware_update_prep_enters_safe_state() {
    let clock = ManualClock::new(0);
    let (mut app, mut relays, mut sink) = make_app(&clock);
    clock.advance(BOOT_HOLD);
    app.tick(COLD, &mut relays, &mut sink);
    clock.advance(30 * MIN);
    app.tick(COLD, &mut relays, &mut sink);
    assert_eq!(relays.running(), 2);

    app.handle_command(AppCommand::PrepareFirmwareUpdate, &mut relays, &mut sink)
        .unwrap();
    assert_eq!(app.operating_mode(), OperatingMode::Manual);
    assert_eq!(relays.running(), 0);
    assert!(app.controller().pumps().iter().all(|p| !p.enabled));
}

#[test]
fn shutdown_all_keeps_automatic_mode() {
    let clock = ManualClock::new(0);
    let (mut app, mut relays, mut sink) = make_app(&clock);
    clock.advance(BOOT_HOLD);
    app.tick(COLD, &mut relays, &mut sink);
    assert_eq!(relays.running(), 1);

    app.handle_command(AppCommand::ShutdownAll, &mut relays, &mut sink)
        .unwrap();
    assert_eq!(relays.running(), 0);
    assert_eq!(app.operating_mode(), OperatingMode::Automatic);
}

// ── Telemetry ─────────────────────────────────────────────────

#[test]
fn telemetry_follows_publish_interval() {
    let clock = ManualClock::new(0);
    let (mut app, mut relays, mut sink) = make_app(&clock);

    for _ in 0..25 {
        app.tick(ON_TARGET, &mut relays, &mut sink);
        clock.advance(1000);
    }
    // t = 0, 10 s and 20 s.
    assert_eq!(sink.telemetry_count(), 3);
    assert_eq!(app.tick_count(), 25);
}

#[test]
fn telemetry_reports_pump_table() {
    let clock = ManualClock::new(5_000);
    let (mut app, mut relays, mut sink) = make_app(&clock);
    clock.advance(BOOT_HOLD);
    app.tick(COLD, &mut relays, &mut sink);

    let now = 5_000 + BOOT_HOLD;
    let t = app.build_telemetry();
    assert_eq!(t.uptime_ms, now);
    assert_eq!(t.hvac_mode, Some(HvacMode::Heating));
    assert!(t.pumps[1].enabled);
    assert_eq!(t.pumps[1].last_on_ms, now);
    assert_eq!(t.pumps.map(|p| p.runtime_secs), [300, 100, 200]);
}

// ── Configuration ─────────────────────────────────────────────

#[test]
fn invalid_config_update_is_rejected() {
    let clock = ManualClock::new(0);
    let (mut app, mut relays, mut sink) = make_app(&clock);

    let mut cfg = SystemConfig::default();
    cfg.hysteresis_c = -1.0;
    let r = app.handle_command(AppCommand::UpdateConfig(cfg), &mut relays, &mut sink);
    assert!(matches!(r, Err(Error::Config(_))));
    assert_eq!(app.config(), &SystemConfig::default());
}

#[test]
fn config_update_changes_timing_live() {
    let clock = ManualClock::new(0);
    let (mut app, mut relays, mut sink) = make_app(&clock);

    let mut cfg = SystemConfig::default();
    cfg.min_change_interval_secs = 60;
    app.handle_command(AppCommand::UpdateConfig(cfg), &mut relays, &mut sink)
        .unwrap();

    clock.advance(MIN);
    app.tick(COLD, &mut relays, &mut sink);
    clock.advance(MIN);
    app.tick(COLD, &mut relays, &mut sink);
    assert_eq!(relays.running(), 2);
}

#[test]
fn save_config_persists_live_config() {
    let clock = ManualClock::new(0);
    let (mut app, mut relays, mut sink) = make_app(&clock);
    let store = MemoryConfigStore::new();

    let mut cfg = SystemConfig::default();
    cfg.hysteresis_c = 2.5;
    app.handle_command(AppCommand::UpdateConfig(cfg.clone()), &mut relays, &mut sink)
        .unwrap();
    app.save_config(&store).unwrap();
    assert_eq!(store.load(), Ok(cfg));
}

// ── Relay driver ──────────────────────────────────────────────

mod relay_bank {
    use core::convert::Infallible;

    use buffer_pumps::adapters::sim::ManualClock;
    use buffer_pumps::app::service::AppService;
    use buffer_pumps::config::SystemConfig;
    use buffer_pumps::drivers::relay::RelayBank;
    use embedded_hal::digital::{ErrorType, OutputPin};

    use super::COLD;
    use crate::mock_adapters::{MockRegistry, RecordingSink};

    #[derive(Default)]
    struct Pin {
        high: bool,
    }

    impl ErrorType for Pin {
        type Error = Infallible;
    }

    impl OutputPin for Pin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.high = true;
            Ok(())
        }
    }

    #[test]
    fn active_low_board_follows_service() {
        let clock = ManualClock::new(0);
        let mut app = AppService::new(
            SystemConfig::default(),
            MockRegistry::constant([300, 100, 200]),
            &clock,
        );
        let mut bank = RelayBank::new([Pin::default(), Pin::default(), Pin::default()], true);
        let mut sink = RecordingSink::new();

        app.start(&mut bank, &mut sink);
        clock.advance(super::BOOT_HOLD);
        app.tick(COLD, &mut bank, &mut sink);

        let levels = bank.release().map(|p| p.high);
        // Pump 1 energised means its pin is pulled low.
        assert_eq!(levels, [true, false, true]);
    }
}
