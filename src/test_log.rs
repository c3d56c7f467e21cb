//! Process-wide capturing logger for unit tests
//!
//! `log` accepts one logger per process, so every test shares this one and
//! picks out its own records by target and a message fragment unique to it.

use log::{Level, LevelFilter, Log, Metadata, Record};
use parking_lot::{const_mutex, Mutex};
use std::sync::Once;

/// One captured record.
#[derive(Debug, Clone)]
pub struct Captured {
    pub level: Level,
    pub target: String,
    pub message: String,
}

struct CaptureLogger {
    records: Mutex<Vec<Captured>>,
}

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        self.records.lock().push(Captured {
            level: record.level(),
            target: record.target().to_string(),
            message: record.args().to_string(),
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger {
    records: const_mutex(Vec::new()),
};
static INIT: Once = Once::new();

/// Install the capturing logger (idempotent).
pub fn install() {
    INIT.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    });
}

/// Records under `target` whose message contains `fragment`.
pub fn records(target: &str, fragment: &str) -> Vec<Captured> {
    LOGGER
        .records
        .lock()
        .iter()
        .filter(|r| r.target == target && r.message.contains(fragment))
        .cloned()
        .collect()
}
