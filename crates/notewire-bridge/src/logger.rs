//! Custom logger that routes messages to the TUI activity log
//!
//! In TUI mode log records are sent over a channel and rendered
//! newest-first with timestamps; outside TUI mode they go to stderr.

use crossbeam_channel::{Receiver, Sender};
use log::{Level, LevelFilter, Metadata, Record};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

static TUI_MODE: AtomicBool = AtomicBool::new(false);
static LOG_SENDER: Mutex<Option<Sender<LogEntry>>> = Mutex::new(None);
static LOGGER: TuiLogger = TuiLogger;

/// One entry of the activity log
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: Level,
    pub timestamp: chrono::DateTime<chrono::Local>,
    pub message: String,
}

/// Custom logger that routes to the TUI when enabled, otherwise to stderr
pub struct TuiLogger;

impl log::Log for TuiLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        if TUI_MODE.load(Ordering::Relaxed) {
            let entry = LogEntry {
                level: record.level(),
                timestamp: chrono::Local::now(),
                message: record.args().to_string(),
            };
            if let Some(sender) = LOG_SENDER.lock().unwrap().as_ref() {
                let _ = sender.send(entry);
            }
        } else {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Initialize the logger in TUI mode; returns the receiver for the
/// activity log
pub fn init_tui_logger() -> Receiver<LogEntry> {
    TUI_MODE.store(true, Ordering::Relaxed);
    let (sender, receiver) = crossbeam_channel::unbounded();
    *LOG_SENDER.lock().unwrap() = Some(sender);

    if log::set_logger(&LOGGER).is_ok() {
        // Default to Info, allow override via RUST_LOG
        let default_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|s| s.parse::<LevelFilter>().ok())
            .unwrap_or(LevelFilter::Info);
        log::set_max_level(default_level);
    }

    receiver
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tui_logger_routes_to_channel() {
        let rx = init_tui_logger();
        log::info!("note bridge up");

        // Other tests may log concurrently; find our record
        let entry = rx
            .try_iter()
            .find(|e| e.message == "note bridge up")
            .unwrap();
        assert_eq!(entry.level, Level::Info);
    }
}
