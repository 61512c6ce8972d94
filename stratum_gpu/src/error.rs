//! Error types for the Stratum GPU core
//!
//! This module defines the error types used throughout the swap chain and
//! descriptor set layers, including driver failures and precondition violations.

use std::fmt;

/// Result type for Stratum operations
pub type Result<T> = std::result::Result<T, Error>;

/// Stratum errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (Vulkan, mock, etc.)
    BackendError(String),

    /// Out of device or host memory while allocating an attachment
    OutOfMemory,

    /// Initialization failed (swap chain, context, subsystems)
    InitializationFailed(String),

    /// A capability or API-usage precondition does not hold
    ///
    /// Raised when no compatible memory type, depth format, surface format
    /// or present mode exists, or when a descriptor binding is used with the
    /// wrong resource type.
    PreconditionViolation(String),

    /// A native driver call returned a non-success status
    DriverError {
        /// Driver operation that failed (e.g. "vkCreateImage")
        operation: String,
        /// Raw numeric status returned by the driver
        code: i32,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::PreconditionViolation(msg) => write!(f, "Precondition violation: {}", msg),
            Error::DriverError { operation, code } => {
                write!(f, "Driver error: {} failed (error={})", operation, code)
            }
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Numeric driver status carried by this error, if any
    pub fn driver_code(&self) -> Option<i32> {
        match self {
            Error::DriverError { code, .. } => Some(*code),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
