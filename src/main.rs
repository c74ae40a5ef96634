//! Buffer pump bench simulator.
//!
//! Drives the real [`AppService`] against simulated adapters for one day
//! of plant time: a thermal buffer that a varying house load pulls away
//! from its target, three pumps with runtime counters, and a clock that
//! only moves when the loop advances it.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  BufferModel ──▶ BufferReading ──▶ AppService ──▶ Relays │
//! │       ▲                              │  ▲               │
//! │       └──────── running pumps ◀──────┘  │               │
//! │                                   SimRegistry ◀─ Ledger  │
//! └──────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use log::info;

use buffer_pumps::adapters::config_store::MemoryConfigStore;
use buffer_pumps::adapters::log_sink::LogEventSink;
use buffer_pumps::adapters::sim::{BufferModel, ManualClock, RuntimeLedger, SimRegistry, SimRelays};
use buffer_pumps::adapters::time::SystemClock;
use buffer_pumps::app::commands::AppCommand;
use buffer_pumps::app::ports::{Clock, RelayPort};
use buffer_pumps::app::service::{AppService, BufferReading};
use buffer_pumps::control::{HvacMode, Millis};

const SIM_DURATION_MS: Millis = 24 * 60 * 60 * 1000;
const TARGET_TEMP_C: f32 = 45.0;
/// Plant time covered by one simulated control tick.
const SIM_STEP_MS: Millis = 60_000;

fn main() -> Result<()> {
    #[cfg(feature = "espidf")]
    {
        esp_idf_svc::sys::link_patches();
        esp_idf_logger::init()?;
    }
    #[cfg(not(feature = "espidf"))]
    let debug_log = buffer_pumps::diagnostics::init_logger(log::LevelFilter::Info)?;

    info!("Buffer pump simulator starting");
    let wall = SystemClock::new();

    // ── Config ────────────────────────────────────────────────
    let store = MemoryConfigStore::new();
    let config = store.load_or_default();

    // ── Simulated plant ───────────────────────────────────────
    let clock = Rc::new(ManualClock::new(0));
    let ledger = Rc::new(RefCell::new(RuntimeLedger::with_runtimes([3_600, 7_200, 0])));
    let registry = SimRegistry::new(ledger.clone());
    let mut relays = SimRelays::new();
    let mut sink = LogEventSink::new();
    let mut buffer = BufferModel::new(38.0, 20.0);

    let mut app = AppService::new(config, registry, clock.clone());
    app.start(&mut relays, &mut sink);

    // ── Main loop ─────────────────────────────────────────────
    let mut now: Millis = 0;
    while now < SIM_DURATION_MS {
        let hour = now as f32 / 3_600_000.0;
        // Colder nights draw more heat from the buffer.
        buffer.load_c = 22.0 - 8.0 * (hour / 24.0 * core::f32::consts::TAU).cos();

        let reading = BufferReading {
            current_temp_c: buffer.temp_c,
            target_temp_c: TARGET_TEMP_C,
            mode: Some(HvacMode::Heating),
        };
        app.tick(reading, &mut relays, &mut sink);

        clock.advance(SIM_STEP_MS);
        ledger.borrow_mut().accrue(relays.state(), SIM_STEP_MS);
        buffer.step(SIM_STEP_MS, relays.running(), HvacMode::Heating);
        now += SIM_STEP_MS;
    }

    app.handle_command(AppCommand::PrepareFirmwareUpdate, &mut relays, &mut sink)?;
    relays.all_off();
    app.save_config(&store)?;

    info!(
        "Simulated {} ticks in {} ms wall time; runtimes {:?}s, relay edges {:?}",
        app.tick_count(),
        wall.now_ms(),
        ledger.borrow().runtime_secs(),
        relays.switch_count,
    );

    #[cfg(not(feature = "espidf"))]
    {
        println!("── debug log tail (reboot: {}) ──", debug_log.reboot_reason());
        print!("{}", debug_log.tail());
    }

    Ok(())
}
