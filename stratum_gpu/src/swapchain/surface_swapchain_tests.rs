use super::*;
use serial_test::serial;
use crate::device::{
    ColorSpace, MockDevice, SurfaceCapabilities, UNDEFINED_EXTENT,
};
use crate::error::Error;
use crate::log::LogSeverity;
use crate::test_utils::{capture_logs, count_logs};
use crate::engine::Engine;

const SURFACE: SurfaceHandle = SurfaceHandle(0xABCD);

fn mock() -> Arc<MockDevice> {
    Arc::new(MockDevice::new())
}

fn create(mock: &Arc<MockDevice>, flags: SwapChainFlags) -> Result<SurfaceSwapChain<MockDevice>> {
    SurfaceSwapChain::new(Arc::clone(mock), SURFACE, Extent2D::new(320, 240), flags)
}

// ============================================================================
// Creation
// ============================================================================

#[test]
fn test_create_fills_bundle() {
    let mock = mock();
    let chain = create(&mock, SwapChainFlags::empty()).unwrap();
    let bundle = chain.bundle();

    assert!(!bundle.colors.is_empty());
    assert!(!bundle.depth.is_null());
    assert_eq!(bundle.extent, Extent2D::new(800, 600));
    assert_eq!(bundle.color_format, PixelFormat::B8G8R8A8_UNORM);
    assert_eq!(bundle.color_space, ColorSpace::SrgbNonlinear);
    assert_eq!(bundle.depth_format, PixelFormat::D32_SFLOAT);
    assert!(!bundle.is_protected);
    assert_eq!(chain.core().registry_len(), 1);
    assert_eq!(mock.live_semaphore_count(), IMAGE_READY_SEMAPHORE_COUNT);
}

#[test]
fn test_create_requests_min_plus_one_images() {
    let mock = mock();
    let chain = create(&mock, SwapChainFlags::empty()).unwrap();
    let desc = mock.swapchain_descs()[0];
    assert_eq!(desc.min_image_count, 3);
    assert_eq!(chain.bundle().colors.len(), 3);
}

#[test]
fn test_image_count_clamped_to_max() {
    let mock = mock();
    mock.set_capabilities(SurfaceCapabilities {
        min_image_count: 2,
        max_image_count: 2,
        ..mock.capabilities()
    });
    let _chain = create(&mock, SwapChainFlags::empty()).unwrap();
    assert_eq!(mock.swapchain_descs()[0].min_image_count, 2);
}

#[test]
fn test_zero_max_image_count_is_unbounded() {
    let mock = mock();
    mock.set_capabilities(SurfaceCapabilities {
        min_image_count: 4,
        max_image_count: 0,
        ..mock.capabilities()
    });
    let _chain = create(&mock, SwapChainFlags::empty()).unwrap();
    assert_eq!(mock.swapchain_descs()[0].min_image_count, 5);
}

#[test]
fn test_swapchain_desc_fields() {
    let mock = mock();
    let _chain = create(&mock, SwapChainFlags::empty()).unwrap();
    let desc = mock.swapchain_descs()[0];
    assert_eq!(desc.surface, SURFACE);
    assert_eq!(desc.pre_transform, SurfaceTransform::IDENTITY);
    assert_eq!(desc.present_mode, PresentMode::Fifo);
    assert_eq!(desc.composite_alpha, CompositeAlpha::INHERIT);
    assert_eq!(
        desc.usage,
        ImageUsage::COLOR_ATTACHMENT | ImageUsage::TRANSFER_SRC | ImageUsage::TRANSFER_DST
    );
    assert!(desc.old_swapchain.is_null());
    assert!(!desc.protected);
}

#[test]
fn test_composite_alpha_falls_back_to_opaque() {
    let mock = mock();
    mock.set_capabilities(SurfaceCapabilities {
        supported_composite_alpha: CompositeAlpha::OPAQUE | CompositeAlpha::PRE_MULTIPLIED,
        ..mock.capabilities()
    });
    let _chain = create(&mock, SwapChainFlags::empty()).unwrap();
    assert_eq!(mock.swapchain_descs()[0].composite_alpha, CompositeAlpha::OPAQUE);
}

#[test]
fn test_undefined_extent_uses_fallback() {
    let mock = mock();
    mock.set_current_extent(Extent2D::new(UNDEFINED_EXTENT, UNDEFINED_EXTENT));
    let chain = create(&mock, SwapChainFlags::empty()).unwrap();
    assert_eq!(chain.bundle().extent, Extent2D::new(320, 240));
    assert_eq!(mock.swapchain_descs()[0].extent, Extent2D::new(320, 240));
}

#[test]
fn test_srgb_flag_selects_srgb_format() {
    let mock = mock();
    let chain = create(&mock, SwapChainFlags::SRGB_COLORSPACE).unwrap();
    assert_eq!(chain.bundle().color_format, PixelFormat::B8G8R8A8_SRGB);
}

#[test]
fn test_format_preference_follows_surface_order() {
    let mock = mock();
    mock.set_surface_formats(vec![
        SurfaceFormat { format: PixelFormat::A2B10G10R10_UNORM, color_space: ColorSpace::SrgbNonlinear },
        SurfaceFormat { format: PixelFormat::R8G8B8A8_UNORM, color_space: ColorSpace::DisplayP3Nonlinear },
        SurfaceFormat { format: PixelFormat::B8G8R8A8_UNORM, color_space: ColorSpace::SrgbNonlinear },
    ]);
    let chain = create(&mock, SwapChainFlags::empty()).unwrap();
    assert_eq!(chain.bundle().color_format, PixelFormat::R8G8B8A8_UNORM);
    assert_eq!(chain.bundle().color_space, ColorSpace::DisplayP3Nonlinear);
}

#[test]
fn test_stencil_flag_selects_stencil_depth() {
    let mock = mock();
    let chain = create(&mock, SwapChainFlags::HAS_STENCIL_BUFFER).unwrap();
    assert_eq!(chain.bundle().depth_format, PixelFormat::D24_UNORM_S8_UINT);
}

#[test]
fn test_protected_flag_propagates() {
    let mock = mock();
    let chain = create(&mock, SwapChainFlags::PROTECTED_CONTENT).unwrap();
    assert!(chain.is_protected());
    assert!(chain.bundle().is_protected);
    assert!(mock.swapchain_descs()[0].protected);
    let depth_memory = mock.image_memory(chain.bundle().depth).unwrap();
    assert_eq!(mock.memory_type_index(depth_memory), Some(2));
}

// ============================================================================
// Creation failures
// ============================================================================

#[test]
#[serial]
fn test_missing_surface_format_fails_and_releases_surface() {
    let mock = mock();
    mock.set_surface_formats(vec![SurfaceFormat {
        format: PixelFormat::A2B10G10R10_UNORM,
        color_space: ColorSpace::SrgbNonlinear,
    }]);
    let result = create(&mock, SwapChainFlags::empty());
    assert!(matches!(result, Err(Error::PreconditionViolation(_))));
    assert_eq!(mock.destroyed_surfaces(), vec![SURFACE]);
    assert_eq!(mock.live_swapchain_count(), 0);
}

#[test]
#[serial]
fn test_missing_fifo_fails() {
    let mock = mock();
    mock.set_present_modes(vec![PresentMode::Mailbox, PresentMode::Immediate]);
    assert!(matches!(
        create(&mock, SwapChainFlags::empty()),
        Err(Error::PreconditionViolation(_))
    ));
}

#[test]
#[serial]
fn test_missing_depth_format_fails_without_leaks() {
    let mock = mock();
    mock.set_depth_formats(vec![PixelFormat::D32_SFLOAT]);
    assert!(create(&mock, SwapChainFlags::HAS_STENCIL_BUFFER).is_err());
    assert_eq!(mock.live_swapchain_count(), 0);
    assert_eq!(mock.live_image_count(), 0);
    assert_eq!(mock.live_memory_count(), 0);
}

#[test]
#[serial]
fn test_swapchain_creation_error_carries_code() {
    let mock = mock();
    mock.fail_on("vkCreateSwapchainKHR", DriverError::ERROR_SURFACE_LOST);
    let Err(err) = create(&mock, SwapChainFlags::empty()) else {
        panic!("swap chain creation should fail");
    };
    assert_eq!(err.driver_code(), Some(DriverError::ERROR_SURFACE_LOST.0));
}

#[test]
#[serial]
fn test_zero_surface_extent_fails_before_swapchain_creation() {
    let mock = mock();
    mock.set_current_extent(Extent2D::new(0, 0));
    assert!(matches!(
        create(&mock, SwapChainFlags::empty()),
        Err(Error::PreconditionViolation(_))
    ));
    assert!(mock.swapchain_descs().is_empty());
    assert_eq!(mock.live_swapchain_count(), 0);
    assert_eq!(mock.destroyed_surfaces(), vec![SURFACE]);
}

#[test]
#[serial]
fn test_zero_fallback_extent_rejected() {
    let mock = mock();
    mock.set_current_extent(Extent2D::new(UNDEFINED_EXTENT, UNDEFINED_EXTENT));
    let result = SurfaceSwapChain::new(Arc::clone(&mock), SURFACE, Extent2D::new(0, 0), SwapChainFlags::empty());
    assert!(matches!(result, Err(Error::PreconditionViolation(_))));
    assert!(mock.swapchain_descs().is_empty());
}

#[test]
#[serial]
fn test_semaphore_failure_cleans_up() {
    let mock = mock();
    mock.fail_on("vkCreateSemaphore", DriverError::ERROR_OUT_OF_HOST_MEMORY);
    assert!(create(&mock, SwapChainFlags::empty()).is_err());
    assert_eq!(mock.live_swapchain_count(), 0);
    assert_eq!(mock.live_semaphore_count(), 0);
    assert_eq!(mock.live_memory_count(), 0);
    assert!(mock.invalid_operations().is_empty());
}

// ============================================================================
// Acquire / present
// ============================================================================

#[test]
fn test_acquire_then_present() {
    let mock = mock();
    let mut chain = create(&mock, SwapChainFlags::empty()).unwrap();
    let mut sync = ImageSyncData::default();

    assert_eq!(chain.acquire(&mut sync).unwrap(), SwapChainStatus::Optimal);
    assert!(!sync.image_ready_semaphore.is_null());
    assert!((sync.image_index as usize) < chain.bundle().colors.len());

    let status = chain.present(sync.image_index, sync.image_ready_semaphore).unwrap();
    assert_eq!(status, SwapChainStatus::Optimal);
    assert_eq!(mock.presents(), vec![(sync.image_index, sync.image_ready_semaphore)]);
}

#[test]
fn test_acquire_rotates_semaphores() {
    let mock = mock();
    let mut chain = create(&mock, SwapChainFlags::empty()).unwrap();
    let mut seen = Vec::new();
    for _ in 0..IMAGE_READY_SEMAPHORE_COUNT * 2 {
        let mut sync = ImageSyncData::default();
        chain.acquire(&mut sync).unwrap();
        seen.push(sync.image_ready_semaphore);
    }
    for i in 0..IMAGE_READY_SEMAPHORE_COUNT {
        assert_ne!(seen[i], seen[(i + 1) % IMAGE_READY_SEMAPHORE_COUNT]);
        assert_eq!(seen[i], seen[i + IMAGE_READY_SEMAPHORE_COUNT]);
        assert!(chain.image_ready_semaphores().contains(&seen[i]));
    }
}

#[test]
#[serial]
fn test_suboptimal_logged_once() {
    let logs = capture_logs();
    let mock = mock();
    let mut chain = create(&mock, SwapChainFlags::empty()).unwrap();
    let mut sync = ImageSyncData::default();

    mock.script_acquire(Ok(DriverStatus::Suboptimal));
    mock.script_acquire(Ok(DriverStatus::Suboptimal));
    mock.script_present(Ok(DriverStatus::Suboptimal));
    assert_eq!(chain.acquire(&mut sync).unwrap(), SwapChainStatus::Suboptimal);
    assert_eq!(chain.acquire(&mut sync).unwrap(), SwapChainStatus::Suboptimal);
    assert_eq!(chain.present(0, sync.image_ready_semaphore).unwrap(), SwapChainStatus::Suboptimal);
    assert!(chain.is_suboptimal());
    assert_eq!(count_logs(&logs, LogSeverity::Warn, "Suboptimal"), 1);

    chain.recreate().unwrap();
    assert!(!chain.is_suboptimal());
    mock.script_acquire(Ok(DriverStatus::Suboptimal));
    chain.acquire(&mut sync).unwrap();
    assert_eq!(count_logs(&logs, LogSeverity::Warn, "Suboptimal"), 2);

    drop(chain);
    Engine::reset_logger();
}

#[test]
fn test_out_of_date_is_a_status() {
    let mock = mock();
    let mut chain = create(&mock, SwapChainFlags::empty()).unwrap();
    let mut sync = ImageSyncData::default();
    mock.script_acquire(Err(DriverError::ERROR_OUT_OF_DATE));
    assert_eq!(chain.acquire(&mut sync).unwrap(), SwapChainStatus::OutOfDate);
    mock.script_present(Err(DriverError::ERROR_OUT_OF_DATE));
    assert_eq!(chain.present(0, sync.image_ready_semaphore).unwrap(), SwapChainStatus::OutOfDate);
}

#[test]
#[serial]
fn test_device_lost_is_an_error() {
    let mock = mock();
    let mut chain = create(&mock, SwapChainFlags::empty()).unwrap();
    let mut sync = ImageSyncData::default();
    mock.script_acquire(Err(DriverError::ERROR_DEVICE_LOST));
    let err = chain.acquire(&mut sync).unwrap_err();
    assert_eq!(err.driver_code(), Some(-4));
}

// ============================================================================
// Resize / recreate / destroy
// ============================================================================

#[test]
fn test_has_resized() {
    let mock = mock();
    let chain = create(&mock, SwapChainFlags::empty()).unwrap();
    assert!(!chain.has_resized().unwrap());

    mock.set_current_extent(Extent2D::new(1024, 768));
    assert!(chain.has_resized().unwrap());
    assert_eq!(chain.bundle().extent, Extent2D::new(800, 600));
}

#[test]
fn test_has_resized_with_undefined_extent_compares_fallback() {
    let mock = mock();
    mock.set_current_extent(Extent2D::new(UNDEFINED_EXTENT, UNDEFINED_EXTENT));
    let chain = create(&mock, SwapChainFlags::empty()).unwrap();
    assert_eq!(chain.bundle().extent, Extent2D::new(320, 240));
    assert!(!chain.has_resized().unwrap());

    mock.set_current_extent(Extent2D::new(640, 480));
    assert!(chain.has_resized().unwrap());
}

#[test]
fn test_recreate_preserves_identity_and_tracks_extent() {
    let mock = mock();
    let mut chain = create(&mock, SwapChainFlags::empty()).unwrap();
    let first_swapchain = chain.swapchain();
    let first_depth = chain.bundle().depth;

    mock.set_current_extent(Extent2D::new(1280, 720));
    assert_eq!(chain.recreate().unwrap(), SwapChainStatus::Optimal);

    assert_eq!(chain.surface(), SURFACE);
    assert_eq!(chain.bundle().extent, Extent2D::new(1280, 720));
    assert_ne!(chain.swapchain(), first_swapchain);
    assert!(!mock.is_image_alive(first_depth));
    assert_eq!(mock.live_swapchain_count(), 1);
    assert_eq!(mock.live_semaphore_count(), IMAGE_READY_SEMAPHORE_COUNT);
    assert_eq!(chain.core().registry_len(), 1);
    assert!(mock.destroyed_surfaces().is_empty());
    assert!(mock.invalid_operations().is_empty());
}

#[test]
fn test_destroy_waits_idle_and_releases() {
    let mock = mock();
    let mut chain = create(&mock, SwapChainFlags::empty()).unwrap();
    chain.destroy();

    assert_eq!(mock.wait_idle_count(), 1);
    assert_eq!(mock.live_swapchain_count(), 0);
    assert_eq!(mock.live_semaphore_count(), 0);
    assert_eq!(mock.live_image_count(), 0);
    assert_eq!(mock.live_memory_count(), 0);
    assert!(chain.bundle().colors.is_empty());
    assert!(chain.bundle().depth.is_null());
    assert!(chain.swapchain().is_null());
}

#[test]
fn test_destroy_twice_is_noop() {
    let mock = mock();
    let mut chain = create(&mock, SwapChainFlags::empty()).unwrap();
    chain.destroy();
    chain.destroy();
    assert_eq!(mock.wait_idle_count(), 1);
    assert!(mock.invalid_operations().is_empty());
}

#[test]
#[serial]
fn test_wait_idle_failure_still_tears_down() {
    let mock = mock();
    let mut chain = create(&mock, SwapChainFlags::empty()).unwrap();
    mock.fail_on("vkQueueWaitIdle", DriverError::ERROR_DEVICE_LOST);
    chain.destroy();
    assert_eq!(mock.live_swapchain_count(), 0);
    assert_eq!(mock.live_memory_count(), 0);
}

#[test]
fn test_drop_destroys_surface_once() {
    let mock = mock();
    let mut chain = create(&mock, SwapChainFlags::empty()).unwrap();
    chain.destroy();
    drop(chain);
    assert_eq!(mock.destroyed_surfaces(), vec![SURFACE]);
    assert_eq!(mock.live_swapchain_count(), 0);
    assert!(mock.invalid_operations().is_empty());
}

#[test]
#[serial]
fn test_creation_is_logged() {
    let logs = capture_logs();
    let mock = mock();
    let chain = create(&mock, SwapChainFlags::empty()).unwrap();
    assert_eq!(
        count_logs(&logs, LogSeverity::Info, "800x600, B8G8R8A8_UNORM, SrgbNonlinear, swapchain-size=3"),
        1
    );
    assert_eq!(count_logs(&logs, LogSeverity::Info, "identity-transform=true"), 1);
    drop(chain);
    Engine::reset_logger();
}
