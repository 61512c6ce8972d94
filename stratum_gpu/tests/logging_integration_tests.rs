//! Integration tests for Engine logging and configuration
//!
//! These tests verify the logging system and error policy as seen by a
//! host application. No GPU required.
//!
//! Run with: cargo test --test logging_integration_tests

use stratum_gpu::stratum::{Engine, EngineConfig, Error, ErrorPolicy};
use stratum_gpu::stratum::log::{Logger, LogEntry, LogSeverity};
use stratum_gpu::stratum::device::{Extent2D, MockDevice, SurfaceHandle};
use stratum_gpu::stratum::swapchain::{SurfaceSwapChain, SwapChainFlags};
use std::sync::{Arc, Mutex};
use serial_test::serial;

// ============================================================================
// TEST LOGGER IMPLEMENTATION
// ============================================================================

/// Test logger that captures log entries for verification
struct TestLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLogger {
    fn new() -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (Self { entries: entries.clone() }, entries)
    }
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

// ============================================================================
// LOGGING TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_custom_logger() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    Engine::log(LogSeverity::Info, "test::module", "Test info message".to_string());
    Engine::log(LogSeverity::Warn, "test::module", "Test warning message".to_string());

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 2);
    assert_eq!(captured[0].severity, LogSeverity::Info);
    assert_eq!(captured[1].message, "Test warning message");
    assert_eq!(captured[1].source, "test::module");
    drop(captured);

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_min_severity_filters() {
    let (test_logger, entries) = TestLogger::new();
    Engine::initialize(EngineConfig {
        min_log_severity: LogSeverity::Warn,
        ..EngineConfig::default()
    });
    Engine::set_logger(test_logger);

    Engine::log(LogSeverity::Debug, "test::module", "hidden".to_string());
    Engine::log(LogSeverity::Error, "test::module", "shown".to_string());

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].message, "shown");
    drop(captured);

    Engine::shutdown();
}

#[test]
#[serial]
fn test_integration_swapchain_failure_is_logged_with_location() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    let mock = Arc::new(MockDevice::new());
    mock.set_present_modes(vec![]);
    let result = SurfaceSwapChain::new(
        mock,
        SurfaceHandle(1),
        Extent2D::new(64, 64),
        SwapChainFlags::empty(),
    );
    assert!(matches!(result, Err(Error::PreconditionViolation(_))));

    let captured = entries.lock().unwrap();
    let error = captured
        .iter()
        .find(|e| e.severity == LogSeverity::Error)
        .expect("error entry");
    assert_eq!(error.source, "stratum::SurfaceSwapChain");
    assert!(error.message.contains("FIFO"));
    assert!(error.file.is_some());
    assert!(error.line.is_some());
    drop(captured);

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_driver_error_message_has_code() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    let mock = Arc::new(MockDevice::new());
    mock.fail_on(
        "vkCreateSwapchainKHR",
        stratum_gpu::stratum::device::DriverError::ERROR_SURFACE_LOST,
    );
    let err = SurfaceSwapChain::new(mock, SurfaceHandle(1), Extent2D::new(64, 64), SwapChainFlags::empty())
        .err()
        .expect("creation must fail");
    assert_eq!(err.to_string(), "Driver error: vkCreateSwapchainKHR failed (error=-1000000000)");

    let captured = entries.lock().unwrap();
    assert!(captured
        .iter()
        .any(|e| e.message == "vkCreateSwapchainKHR failed. error=-1000000000"));
    drop(captured);

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_error_policy_round_trip() {
    assert_eq!(Engine::error_policy(), ErrorPolicy::Strict);
    Engine::set_error_policy(ErrorPolicy::Relaxed);
    assert_eq!(Engine::error_policy(), ErrorPolicy::Relaxed);
    Engine::shutdown();
    assert_eq!(Engine::error_policy(), ErrorPolicy::Strict);
}
