//! Shared helpers for unit tests

use std::sync::{Arc, Mutex};
use crate::log::{Logger, LogEntry, LogSeverity};
use crate::engine::Engine;

/// Logger that captures entries for verification
pub struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

/// Install a capturing logger and return the shared entry list
pub fn capture_logs() -> Arc<Mutex<Vec<LogEntry>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CaptureLogger { entries: entries.clone() });
    entries
}

/// Count captured entries at `severity` whose message contains `needle`
pub fn count_logs(entries: &Arc<Mutex<Vec<LogEntry>>>, severity: LogSeverity, needle: &str) -> usize {
    entries
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.severity == severity && e.message.contains(needle))
        .count()
}
