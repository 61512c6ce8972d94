use super::*;
use serial_test::serial;
use crate::device::{DriverError, MockDevice};
use crate::error::Error;

fn extent() -> Extent2D {
    Extent2D::new(64, 32)
}

// ============================================================================
// create_image_and_memory
// ============================================================================

#[test]
fn test_color_image_usage_and_memory() {
    let mock = MockDevice::new();
    let (image, memory) =
        create_image_and_memory(&mock, extent(), PixelFormat::R8G8B8A8_UNORM, false).unwrap();

    let desc = mock.image_desc(image).unwrap();
    assert_eq!(
        desc.usage,
        ImageUsage::TRANSFER_SRC | ImageUsage::TRANSFER_DST | ImageUsage::COLOR_ATTACHMENT
    );
    assert!(!desc.protected);
    assert_eq!(mock.image_memory(image), Some(memory));
    assert_eq!(mock.memory_type_index(memory), Some(1));
    assert_eq!(mock.memory_size(memory), Some(64 * 32 * 4));
}

#[test]
fn test_depth_image_uses_depth_attachment() {
    let mock = MockDevice::new();
    let (image, _) =
        create_image_and_memory(&mock, extent(), PixelFormat::D32_SFLOAT, false).unwrap();
    let usage = mock.image_desc(image).unwrap().usage;
    assert!(usage.contains(ImageUsage::DEPTH_STENCIL_ATTACHMENT));
    assert!(!usage.contains(ImageUsage::COLOR_ATTACHMENT));
    assert!(usage.contains(ImageUsage::TRANSFER_SRC | ImageUsage::TRANSFER_DST));
}

#[test]
fn test_protected_image_uses_protected_memory() {
    let mock = MockDevice::new();
    let (image, memory) =
        create_image_and_memory(&mock, extent(), PixelFormat::D24_UNORM_S8_UINT, true).unwrap();
    assert!(mock.image_desc(image).unwrap().protected);
    assert_eq!(mock.memory_type_index(memory), Some(2));
}

#[test]
#[serial]
fn test_no_memory_type_is_precondition_violation() {
    let mock = MockDevice::new();
    mock.set_memory_types(vec![MemoryProperty::HOST_VISIBLE]);
    let err = create_image_and_memory(&mock, extent(), PixelFormat::R8G8B8A8_UNORM, false)
        .unwrap_err();
    assert!(matches!(err, Error::PreconditionViolation(_)));
    assert_eq!(mock.live_image_count(), 0);
    assert!(mock.invalid_operations().is_empty());
}

#[test]
#[serial]
fn test_create_image_failure_reports_code() {
    let mock = MockDevice::new();
    mock.fail_on("vkCreateImage", DriverError::ERROR_OUT_OF_DEVICE_MEMORY);
    let err = create_image_and_memory(&mock, extent(), PixelFormat::R8G8B8A8_UNORM, false)
        .unwrap_err();
    assert_eq!(err.driver_code(), Some(-2));
}

#[test]
#[serial]
fn test_allocation_failure_releases_image() {
    let mock = MockDevice::new();
    mock.fail_on("vkAllocateMemory", DriverError::ERROR_OUT_OF_DEVICE_MEMORY);
    let err = create_image_and_memory(&mock, extent(), PixelFormat::R8G8B8A8_UNORM, false)
        .unwrap_err();
    assert!(matches!(err, Error::OutOfMemory));
    assert_eq!(mock.live_image_count(), 0);
}

#[test]
#[serial]
fn test_other_allocation_failure_keeps_driver_code() {
    let mock = MockDevice::new();
    mock.fail_on("vkAllocateMemory", DriverError::ERROR_DEVICE_LOST);
    let err = create_image_and_memory(&mock, extent(), PixelFormat::R8G8B8A8_UNORM, false)
        .unwrap_err();
    assert_eq!(err.driver_code(), Some(DriverError::ERROR_DEVICE_LOST.0));
    assert_eq!(mock.live_image_count(), 0);
}

#[test]
#[serial]
fn test_bind_failure_releases_both() {
    let mock = MockDevice::new();
    mock.fail_on("vkBindImageMemory", DriverError::ERROR_OUT_OF_DEVICE_MEMORY);
    assert!(create_image_and_memory(&mock, extent(), PixelFormat::R8G8B8A8_UNORM, false).is_err());
    assert_eq!(mock.live_image_count(), 0);
    assert_eq!(mock.live_memory_count(), 0);
    assert!(mock.invalid_operations().is_empty());
}

// ============================================================================
// select_depth_format
// ============================================================================

#[test]
fn test_depth_format_first_depth_capable() {
    let formats = [PixelFormat::S8_UINT, PixelFormat::D32_SFLOAT, PixelFormat::D24_UNORM_S8_UINT];
    assert_eq!(select_depth_format(&formats, false).unwrap(), PixelFormat::D32_SFLOAT);
}

#[test]
fn test_depth_format_with_stencil() {
    let formats = [PixelFormat::D32_SFLOAT, PixelFormat::S8_UINT, PixelFormat::D24_UNORM_S8_UINT];
    assert_eq!(select_depth_format(&formats, true).unwrap(), PixelFormat::D24_UNORM_S8_UINT);
}

#[test]
#[serial]
fn test_depth_format_missing() {
    let formats = [PixelFormat::D16_UNORM];
    assert!(matches!(
        select_depth_format(&formats, true),
        Err(Error::PreconditionViolation(_))
    ));
    assert!(select_depth_format(&[], false).is_err());
}
