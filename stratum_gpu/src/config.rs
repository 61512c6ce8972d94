//! Engine-wide configuration
//!
//! Holds the knobs that change how the core reports problems rather than
//! what it does: the precondition error policy and the minimum log severity.

use crate::log::LogSeverity;

/// Severity policy for API-usage precondition violations
///
/// Capability failures (no memory type, no depth format, driver errors during
/// creation) are always errors. This policy only governs misuse of the
/// descriptor set API such as binding a buffer to a sampler slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Violations are logged at ERROR and returned as `Error::PreconditionViolation`
    #[default]
    Strict,
    /// Violations are logged at WARN and the offending call becomes a no-op
    Relaxed,
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How descriptor binding mismatches are reported
    pub error_policy: ErrorPolicy,
    /// Entries below this severity are discarded before reaching the logger
    pub min_log_severity: LogSeverity,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            error_policy: ErrorPolicy::Strict,
            min_log_severity: if cfg!(debug_assertions) {
                LogSeverity::Trace
            } else {
                LogSeverity::Info
            },
        }
    }
}
