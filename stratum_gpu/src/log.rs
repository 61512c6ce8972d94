//! Internal logging system for Stratum
//!
//! This module provides a flexible logging system with:
//! - Customizable logger via Logger trait
//! - Severity levels (Trace, Debug, Info, Warn, Error)
//! - Colored console output by default
//! - Thread-safe logging with RwLock
//! - File and line information for detailed ERROR logs
//! - Error-building macros that log before returning

use colored::*;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Logger trait for custom logging implementations
///
/// Implement this trait to create custom loggers (file logging, capture in tests, etc.)
///
/// # Example
///
/// ```no_run
/// use stratum_gpu::stratum::log::{Logger, LogEntry};
///
/// struct FileLogger {
///     file: std::fs::File,
/// }
///
/// impl Logger for FileLogger {
///     fn log(&self, entry: &LogEntry) {
///         // Write to file...
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Log an entry
    fn log(&self, entry: &LogEntry);
}

/// Log entry containing all information about a log message
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity level (Trace, Debug, Info, Warn, Error)
    pub severity: LogSeverity,

    /// Timestamp when the log was created
    pub timestamp: SystemTime,

    /// Source component (e.g., "stratum::SurfaceSwapChain", "stratum::vulkan")
    pub source: String,

    /// Log message
    pub message: String,

    /// Source file (only for detailed ERROR logs)
    pub file: Option<&'static str>,

    /// Source line (only for detailed ERROR logs)
    pub line: Option<u32>,
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Very verbose debug information (typically disabled in release)
    Trace,

    /// Development/debugging information
    Debug,

    /// Important informational messages
    Info,

    /// Warning messages (potential issues)
    Warn,

    /// Error messages (critical issues with file:line details)
    Error,
}

/// Default logger implementation using colored console output
///
/// Format:
/// - Normal: `[timestamp] [SEVERITY] [source] message`
/// - Error: `[timestamp] [ERROR] [source] message (file:line)`
pub struct DefaultLogger;

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string();

        let severity_str = match entry.severity {
            LogSeverity::Trace => "TRACE".bright_black(),
            LogSeverity::Debug => "DEBUG".cyan(),
            LogSeverity::Info => "INFO ".green(),
            LogSeverity::Warn => "WARN ".yellow(),
            LogSeverity::Error => "ERROR".red().bold(),
        };

        let source = entry.source.bright_blue();

        if let (Some(file), Some(line)) = (entry.file, entry.line) {
            println!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp,
                severity_str,
                source,
                entry.message,
                file,
                line
            );
        } else {
            println!(
                "[{}] [{}] [{}] {}",
                timestamp,
                severity_str,
                source,
                entry.message
            );
        }
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message (very verbose, typically disabled)
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::stratum::Engine::log(
            $crate::stratum::log::LogSeverity::Trace,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a DEBUG message (development information)
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::stratum::Engine::log(
            $crate::stratum::log::LogSeverity::Debug,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an INFO message (important events)
///
/// # Example
///
/// ```no_run
/// # use stratum_gpu::engine_info;
/// engine_info!("stratum::SurfaceSwapChain", "Created {} images", 3);
/// ```
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::stratum::Engine::log(
            $crate::stratum::log::LogSeverity::Info,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a WARN message (potential issues)
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::stratum::Engine::log(
            $crate::stratum::log::LogSeverity::Warn,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an ERROR message with file:line information
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::stratum::Engine::log_detailed(
            $crate::stratum::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

// ===== ERROR MACROS =====

/// Log an ERROR and build an `Error::BackendError` with the same message
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::stratum::Error::BackendError(message)
    }};
}

/// Log an ERROR and return `Err(Error::BackendError)` from the current function
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

/// Log a WARN and build an `Error::BackendError` with the same message
#[macro_export]
macro_rules! engine_warn_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_warn!($source, "{}", message);
        $crate::stratum::Error::BackendError(message)
    }};
}

/// Log a WARN and return `Err(Error::BackendError)` from the current function
#[macro_export]
macro_rules! engine_bail_warn {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_warn_err!($source, $($arg)*))
    };
}

/// Log a failed driver call and build an `Error::DriverError`
///
/// The diagnostic names the component (source), the operation and the
/// numeric status returned by the driver.
///
/// ```no_run
/// # use stratum_gpu::engine_driver_err;
/// # use stratum_gpu::stratum::device::DriverError;
/// let err = engine_driver_err!("stratum::SurfaceSwapChain", "vkCreateSwapchainKHR", DriverError(-4));
/// ```
#[macro_export]
macro_rules! engine_driver_err {
    ($source:expr, $operation:expr, $driver_error:expr) => {{
        let code: i32 = $driver_error.0;
        $crate::engine_error!($source, "{} failed. error={}", $operation, code);
        $crate::stratum::Error::DriverError {
            operation: ($operation).to_string(),
            code,
        }
    }};
}

/// Log a capability/precondition failure and build `Error::PreconditionViolation`
#[macro_export]
macro_rules! engine_precondition_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::stratum::Error::PreconditionViolation(message)
    }};
}

/// Report an API-usage precondition violation according to the error policy
///
/// - `ErrorPolicy::Strict`: log at ERROR and return `Err(Error::PreconditionViolation)`
/// - `ErrorPolicy::Relaxed`: log at WARN and return `Ok(())`, turning the call into a no-op
///
/// Only usable in functions returning `Result<()>`.
#[macro_export]
macro_rules! engine_precondition {
    ($source:expr, $($arg:tt)*) => {
        match $crate::stratum::Engine::error_policy() {
            $crate::stratum::ErrorPolicy::Strict => {
                return Err($crate::engine_precondition_err!($source, $($arg)*));
            }
            $crate::stratum::ErrorPolicy::Relaxed => {
                $crate::engine_warn!($source, $($arg)*);
                return Ok(());
            }
        }
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
