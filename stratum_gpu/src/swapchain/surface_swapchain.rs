/// Swap chain presenting to a window surface
///
/// Color images belong to the presentation engine and are only borrowed;
/// the depth image and the "image ready" semaphores are owned. Teardown
/// (on `destroy`, `recreate` or drop) first waits for the queue to go idle
/// because the presentation API offers no signal telling when swap chain
/// resources stop being in flight. This stall only happens on resize or
/// surface loss.

use std::sync::Arc;
use crate::device::{
    CompositeAlpha, DriverError, DriverResult, DriverStatus, Extent2D, ImageUsage, PixelFormat, PresentMode,
    SemaphoreHandle, SurfaceDevice, SurfaceFormat, SurfaceHandle, SurfaceTransform,
    SwapchainDesc, SwapchainHandle,
};
use crate::error::Result;
use crate::swapchain::{
    select_depth_format, ImageSyncData, SwapChain, SwapChainBundle, SwapChainCore,
    SwapChainFlags, SwapChainStatus, IMAGE_READY_SEMAPHORE_COUNT,
};
use crate::{engine_driver_err, engine_error, engine_info, engine_precondition_err, engine_warn};

const SOURCE: &str = "stratum::SurfaceSwapChain";

/// Swap chain backed by a presentable surface
pub struct SurfaceSwapChain<D: SurfaceDevice + ?Sized> {
    core: SwapChainCore<D>,
    surface: SurfaceHandle,
    swapchain: SwapchainHandle,
    /// Used when the surface reports an undefined extent
    fallback_extent: Extent2D,
    flags: SwapChainFlags,
    image_ready: [SemaphoreHandle; IMAGE_READY_SEMAPHORE_COUNT],
    current_image_ready_index: usize,
    /// Set on the first suboptimal result, re-armed by `create`
    suboptimal: bool,
}

impl<D: SurfaceDevice + ?Sized> SurfaceSwapChain<D> {
    /// Take ownership of `surface` and build the swap chain for it
    ///
    /// On failure everything created so far, including the surface, is released.
    pub fn new(
        device: Arc<D>,
        surface: SurfaceHandle,
        fallback_extent: Extent2D,
        flags: SwapChainFlags,
    ) -> Result<Self> {
        let mut chain = Self {
            core: SwapChainCore::new(device),
            surface,
            swapchain: SwapchainHandle::NULL,
            fallback_extent,
            flags,
            image_ready: [SemaphoreHandle::NULL; IMAGE_READY_SEMAPHORE_COUNT],
            current_image_ready_index: 0,
            suboptimal: false,
        };
        chain.create()?;
        Ok(chain)
    }

    fn create(&mut self) -> Result<()> {
        let device = Arc::clone(self.core.device());
        let caps = device
            .surface_capabilities(self.surface)
            .map_err(|e| engine_driver_err!(SOURCE, "vkGetPhysicalDeviceSurfaceCapabilitiesKHR", e))?;

        // One more than the minimum so acquire never waits on the compositor
        // to release the previous frame. A max of zero means unbounded.
        let mut image_count = caps.min_image_count + 1;
        if caps.max_image_count != 0 && image_count > caps.max_image_count {
            engine_warn!(SOURCE, "Swap chain does not support {} images", image_count);
            image_count = caps.max_image_count;
        }

        let surface_format = self.select_surface_format(&*device)?;

        let present_modes = device
            .surface_present_modes(self.surface)
            .map_err(|e| engine_driver_err!(SOURCE, "vkGetPhysicalDeviceSurfacePresentModesKHR", e))?;
        if !present_modes.contains(&PresentMode::Fifo) {
            return Err(engine_precondition_err!(
                SOURCE,
                "Desired present mode FIFO is not supported by this device ({:?})",
                present_modes
            ));
        }

        let extent = if caps.current_extent.is_undefined() {
            self.fallback_extent
        } else {
            caps.current_extent
        };
        if extent.is_empty() {
            return Err(engine_precondition_err!(
                SOURCE,
                "Surface extent must be non-zero, got {}",
                extent
            ));
        }

        let composite_alpha = if caps.supported_composite_alpha.contains(CompositeAlpha::INHERIT) {
            CompositeAlpha::INHERIT
        } else {
            CompositeAlpha::OPAQUE
        };

        let is_protected = self.is_protected();
        // Rotation is left to the compositor: always request the identity transform.
        let desc = SwapchainDesc {
            surface: self.surface,
            min_image_count: image_count,
            format: surface_format.format,
            color_space: surface_format.color_space,
            extent,
            usage: ImageUsage::COLOR_ATTACHMENT | ImageUsage::TRANSFER_DST | ImageUsage::TRANSFER_SRC,
            pre_transform: SurfaceTransform::IDENTITY,
            composite_alpha,
            present_mode: PresentMode::Fifo,
            protected: is_protected,
            old_swapchain: self.swapchain,
        };
        self.swapchain = device
            .create_swapchain(&desc)
            .map_err(|e| engine_driver_err!(SOURCE, "vkCreateSwapchainKHR", e))?;

        let colors = device
            .swapchain_images(self.swapchain)
            .map_err(|e| engine_driver_err!(SOURCE, "vkGetSwapchainImagesKHR", e))?;
        if colors.is_empty() {
            return Err(engine_precondition_err!(SOURCE, "swap chain returned no images"));
        }

        let depth_format = select_depth_format(
            &device.depth_stencil_formats(),
            self.flags.contains(SwapChainFlags::HAS_STENCIL_BUFFER),
        )?;

        {
            let bundle = self.core.bundle_mut();
            bundle.colors = colors;
            bundle.extent = extent;
            bundle.color_format = surface_format.format;
            bundle.color_space = surface_format.color_space;
            bundle.depth_format = depth_format;
            bundle.is_protected = is_protected;
        }
        let depth = self.core.create_image(extent, depth_format, is_protected)?;
        self.core.bundle_mut().depth = depth;

        engine_info!(
            SOURCE,
            "vkCreateSwapchain: {}, {:?}, {:?}, swapchain-size={}, identity-transform={}, depth={:?}, protected={}",
            extent,
            surface_format.format,
            surface_format.color_space,
            self.core.bundle().colors.len(),
            caps.current_transform == SurfaceTransform::IDENTITY,
            depth_format,
            is_protected
        );

        for slot in self.image_ready.iter_mut() {
            *slot = device
                .create_semaphore()
                .map_err(|e| engine_driver_err!(SOURCE, "vkCreateSemaphore", e))?;
        }

        self.suboptimal = false;
        Ok(())
    }

    fn select_surface_format(&self, device: &D) -> Result<SurfaceFormat> {
        let formats = device
            .surface_formats(self.surface)
            .map_err(|e| engine_driver_err!(SOURCE, "vkGetPhysicalDeviceSurfaceFormatsKHR", e))?;

        let expected = if self.flags.contains(SwapChainFlags::SRGB_COLORSPACE) {
            [PixelFormat::R8G8B8A8_SRGB, PixelFormat::B8G8R8A8_SRGB]
        } else {
            [PixelFormat::R8G8B8A8_UNORM, PixelFormat::B8G8R8A8_UNORM]
        };

        formats
            .iter()
            .copied()
            .find(|f| expected.contains(&f.format))
            .ok_or_else(|| {
                engine_precondition_err!(
                    SOURCE,
                    "Cannot find suitable swapchain format among {:?}",
                    formats
                )
            })
    }

    /// Map a driver acquire/present outcome to a status, logging the first suboptimal result
    fn handle_status(
        &mut self,
        operation: &str,
        result: DriverResult<DriverStatus>,
    ) -> Result<SwapChainStatus> {
        match result {
            Ok(DriverStatus::Success) => Ok(SwapChainStatus::Optimal),
            Ok(DriverStatus::Suboptimal) => {
                if !self.suboptimal {
                    engine_warn!(SOURCE, "Suboptimal swap chain");
                    self.suboptimal = true;
                }
                Ok(SwapChainStatus::Suboptimal)
            }
            Err(DriverError::ERROR_OUT_OF_DATE) => Ok(SwapChainStatus::OutOfDate),
            Err(e) => Err(engine_driver_err!(SOURCE, operation, e)),
        }
    }

    fn is_destroyed(&self) -> bool {
        self.swapchain.is_null()
            && self.core.bundle().depth.is_null()
            && self.image_ready.iter().all(|s| s.is_null())
    }

    pub fn surface(&self) -> SurfaceHandle {
        self.surface
    }

    pub fn swapchain(&self) -> SwapchainHandle {
        self.swapchain
    }

    pub fn flags(&self) -> SwapChainFlags {
        self.flags
    }

    pub fn fallback_extent(&self) -> Extent2D {
        self.fallback_extent
    }

    /// Whether a suboptimal result has been seen since the last creation
    pub fn is_suboptimal(&self) -> bool {
        self.suboptimal
    }

    pub fn image_ready_semaphores(&self) -> &[SemaphoreHandle] {
        &self.image_ready
    }

    pub fn core(&self) -> &SwapChainCore<D> {
        &self.core
    }
}

impl<D: SurfaceDevice + ?Sized> SwapChain for SurfaceSwapChain<D> {
    fn acquire(&mut self, sync: &mut ImageSyncData) -> Result<SwapChainStatus> {
        self.current_image_ready_index =
            (self.current_image_ready_index + 1) % IMAGE_READY_SEMAPHORE_COUNT;
        let semaphore = self.image_ready[self.current_image_ready_index];
        sync.image_ready_semaphore = semaphore;

        let result = self
            .core
            .device()
            .acquire_next_image(self.swapchain, u64::MAX, semaphore)
            .map(|(index, status)| {
                sync.image_index = index;
                status
            });
        self.handle_status("vkAcquireNextImageKHR", result)
    }

    fn present(&mut self, index: u32, finished: SemaphoreHandle) -> Result<SwapChainStatus> {
        let result = self.core.device().queue_present(self.swapchain, index, finished);
        self.handle_status("vkQueuePresentKHR", result)
    }

    fn destroy(&mut self) {
        if self.is_destroyed() {
            return;
        }
        let device = Arc::clone(self.core.device());
        if let Err(e) = device.queue_wait_idle() {
            engine_error!(SOURCE, "vkQueueWaitIdle failed during teardown. error={}", e.0);
        }

        for slot in self.image_ready.iter_mut() {
            if !slot.is_null() {
                device.destroy_semaphore(*slot);
                *slot = SemaphoreHandle::NULL;
            }
        }

        self.core.destroy();

        if !self.swapchain.is_null() {
            device.destroy_swapchain(self.swapchain);
            self.swapchain = SwapchainHandle::NULL;
        }
    }

    fn recreate(&mut self) -> Result<SwapChainStatus> {
        self.destroy();
        self.create()?;
        Ok(SwapChainStatus::Optimal)
    }

    fn has_resized(&self) -> Result<bool> {
        let caps = self
            .core
            .device()
            .surface_capabilities(self.surface)
            .map_err(|e| engine_driver_err!(SOURCE, "vkGetPhysicalDeviceSurfaceCapabilitiesKHR", e))?;
        let perceived = if caps.current_extent.is_undefined() {
            self.fallback_extent
        } else {
            caps.current_extent
        };
        Ok(self.core.bundle().extent != perceived)
    }

    fn is_protected(&self) -> bool {
        self.flags.contains(SwapChainFlags::PROTECTED_CONTENT)
    }

    fn bundle(&self) -> &SwapChainBundle {
        self.core.bundle()
    }
}

impl<D: SurfaceDevice + ?Sized> Drop for SurfaceSwapChain<D> {
    fn drop(&mut self) {
        self.destroy();
        self.core.device().destroy_surface(self.surface);
    }
}

#[cfg(test)]
#[path = "surface_swapchain_tests.rs"]
mod tests;
