/// Stratum Engine - process-wide configuration and logging entry points
///
/// The swap chain and descriptor layers are single-threaded by contract, but
/// logging and configuration are reachable from anywhere, so they are stored
/// in thread-safe statics guarded by RwLock.

use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;
use crate::config::{EngineConfig, ErrorPolicy};
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

// ===== INTERNAL STATE =====

/// Global engine configuration
static CONFIG: OnceLock<RwLock<EngineConfig>> = OnceLock::new();

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

fn config_lock() -> &'static RwLock<EngineConfig> {
    CONFIG.get_or_init(|| RwLock::new(EngineConfig::default()))
}

fn logger_lock() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)))
}

// ===== PUBLIC API =====

/// Engine-wide entry points
///
/// # Example
///
/// ```no_run
/// use stratum_gpu::stratum::{Engine, EngineConfig, ErrorPolicy};
///
/// Engine::initialize(EngineConfig {
///     error_policy: ErrorPolicy::Relaxed,
///     ..EngineConfig::default()
/// });
///
/// // ... create swap chains and descriptor sets ...
///
/// Engine::shutdown();
/// ```
pub struct Engine;

impl Engine {
    /// Install the engine configuration
    ///
    /// May be called again to replace the configuration (e.g. when the host
    /// application switches to relaxed error handling for production).
    pub fn initialize(config: EngineConfig) {
        if let Ok(mut lock) = config_lock().write() {
            *lock = config;
        }
        crate::engine_debug!("stratum::Engine", "Engine configured: {:?}", Self::config());
    }

    /// Restore the default configuration and logger
    pub fn shutdown() {
        if let Ok(mut lock) = config_lock().write() {
            *lock = EngineConfig::default();
        }
        Self::reset_logger();
    }

    /// Snapshot of the current configuration
    pub fn config() -> EngineConfig {
        config_lock()
            .read()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    /// Current precondition error policy
    pub fn error_policy() -> ErrorPolicy {
        config_lock()
            .read()
            .map(|c| c.error_policy)
            .unwrap_or_default()
    }

    /// Change only the precondition error policy
    pub fn set_error_policy(policy: ErrorPolicy) {
        if let Ok(mut lock) = config_lock().write() {
            lock.error_policy = policy;
        }
    }

    // ===== LOGGING API =====

    /// Set a custom logger
    ///
    /// Replace the default logger with a custom implementation (file logger, test capture, etc.)
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        if let Ok(mut lock) = logger_lock().write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        if let Ok(mut lock) = logger_lock().write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    fn enabled(severity: LogSeverity) -> bool {
        config_lock()
            .read()
            .map(|c| severity >= c.min_log_severity)
            .unwrap_or(true)
    }

    /// Internal logging method (for simple logs without file:line)
    ///
    /// Used by macros like engine_info!, engine_warn!, etc.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        if !Self::enabled(severity) {
            return;
        }
        if let Ok(lock) = logger_lock().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Internal logging method with file:line information (for ERROR logs)
    ///
    /// Used by engine_error! macro to include source location.
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        if !Self::enabled(severity) {
            return;
        }
        if let Ok(lock) = logger_lock().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
