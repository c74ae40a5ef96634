//! Debug log tail and reboot diagnostics.
//!
//! Every log record is echoed to stderr and appended to a bounded
//! in-memory tail (the last [`DEBUG_LOG_CAPACITY`] characters) so the
//! dashboard or the bench simulator can show recent history without a
//! serial console attached.  The reason for the last reset is captured
//! once at boot.

use std::sync::{Mutex, OnceLock, PoisonError};

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Characters kept in the debug tail.  Older text is dropped first.
pub const DEBUG_LOG_CAPACITY: usize = 1000;

const REASON_CAPACITY: usize = 64;

// ── DebugLog ──────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct DebugLog {
    buf: String,
    chars: usize,
    reboot_reason: heapless::String<REASON_CAPACITY>,
}

impl DebugLog {
    pub const fn new() -> Self {
        Self {
            buf: String::new(),
            chars: 0,
            reboot_reason: heapless::String::new(),
        }
    }

    /// Append one line, dropping the oldest characters past capacity.
    pub fn push_line(&mut self, line: &str) {
        self.buf.push_str(line);
        self.buf.push('\n');
        self.chars += line.chars().count() + 1;

        if self.chars > DEBUG_LOG_CAPACITY {
            let excess = self.chars - DEBUG_LOG_CAPACITY;
            let cut = self
                .buf
                .char_indices()
                .nth(excess)
                .map_or(self.buf.len(), |(i, _)| i);
            self.buf.drain(..cut);
            self.chars = DEBUG_LOG_CAPACITY;
        }
    }

    pub fn tail(&self) -> &str {
        &self.buf
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.chars = 0;
    }

    /// Record why the device last restarted.  Long reasons are cut on a
    /// character boundary.
    pub fn set_reboot_reason(&mut self, reason: &str) {
        self.reboot_reason.clear();
        for c in reason.chars() {
            if self.reboot_reason.push(c).is_err() {
                break;
            }
        }
    }

    pub fn reboot_reason(&self) -> &str {
        &self.reboot_reason
    }
}

// ── Logger ────────────────────────────────────────────────────

/// `log` backend feeding a shared [`DebugLog`].
pub struct DebugLogger {
    level: LevelFilter,
    log: Mutex<DebugLog>,
}

impl DebugLogger {
    pub const fn new(level: LevelFilter) -> Self {
        Self {
            level,
            log: Mutex::new(DebugLog::new()),
        }
    }

    /// Copy of the current tail.
    pub fn tail(&self) -> String {
        self.with_log(|log| log.tail().to_owned())
    }

    pub fn set_reboot_reason(&self, reason: &str) {
        self.with_log(|log| log.set_reboot_reason(reason));
    }

    pub fn reboot_reason(&self) -> String {
        self.with_log(|log| log.reboot_reason().to_owned())
    }

    fn with_log<T>(&self, f: impl FnOnce(&mut DebugLog) -> T) -> T {
        // A panic while logging must not silence every later record.
        let mut guard = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl Log for DebugLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!("[{}] {}: {}", record.level(), record.target(), record.args());
        eprintln!("{}", line);
        self.with_log(|log| log.push_line(&line));
    }

    fn flush(&self) {}
}

static LOGGER: OnceLock<DebugLogger> = OnceLock::new();

/// Install the [`DebugLogger`] as the global logger.  Fails if another
/// logger is already installed.
pub fn init_logger(level: LevelFilter) -> Result<&'static DebugLogger, SetLoggerError> {
    let logger = LOGGER.get_or_init(|| DebugLogger::new(level));
    log::set_logger(logger)?;
    log::set_max_level(level);
    logger.set_reboot_reason(reset_reason());
    Ok(logger)
}

// ── Reset reason ──────────────────────────────────────────────

#[cfg(feature = "espidf")]
#[allow(non_upper_case_globals)]
pub fn reset_reason() -> &'static str {
    use esp_idf_svc::sys::*;

    match unsafe { esp_reset_reason() } {
        esp_reset_reason_t_ESP_RST_POWERON => "power-on",
        esp_reset_reason_t_ESP_RST_EXT => "external pin",
        esp_reset_reason_t_ESP_RST_SW => "software restart",
        esp_reset_reason_t_ESP_RST_PANIC => "panic",
        esp_reset_reason_t_ESP_RST_INT_WDT => "interrupt watchdog",
        esp_reset_reason_t_ESP_RST_TASK_WDT => "task watchdog",
        esp_reset_reason_t_ESP_RST_WDT => "other watchdog",
        esp_reset_reason_t_ESP_RST_DEEPSLEEP => "deep sleep wake",
        esp_reset_reason_t_ESP_RST_BROWNOUT => "brownout",
        _ => "unknown",
    }
}

#[cfg(not(feature = "espidf"))]
pub fn reset_reason() -> &'static str {
    "power-on"
}
