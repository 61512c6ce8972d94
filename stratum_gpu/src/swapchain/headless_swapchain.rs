/// Offscreen swap chain: a fixed ring of engine-owned images

use std::sync::Arc;
use crate::device::{Device, Extent2D, PixelFormat, SemaphoreHandle};
use crate::error::Result;
use crate::swapchain::{
    select_depth_format, ImageSyncData, SwapChain, SwapChainBundle, SwapChainCore,
    SwapChainFlags, SwapChainStatus, HEADLESS_SWAPCHAIN_SIZE,
};
use crate::{engine_debug, engine_precondition_err};

const SOURCE: &str = "stratum::HeadlessSwapChain";

/// Swap chain with no presentation target
///
/// Acquire cycles through the ring without any GPU wait and present does
/// nothing. All color images and the depth image are owned.
pub struct HeadlessSwapChain<D: Device + ?Sized> {
    core: SwapChainCore<D>,
    flags: SwapChainFlags,
    current_index: u32,
}

impl<D: Device + ?Sized> HeadlessSwapChain<D> {
    pub fn new(device: Arc<D>, extent: Extent2D, flags: SwapChainFlags) -> Result<Self> {
        if extent.is_empty() || extent.is_undefined() {
            return Err(engine_precondition_err!(
                SOURCE,
                "Offscreen extent must be non-zero, got {}",
                extent
            ));
        }

        let mut chain = Self {
            core: SwapChainCore::new(device),
            flags,
            current_index: 0,
        };

        let color_format = if flags.contains(SwapChainFlags::SRGB_COLORSPACE) {
            PixelFormat::R8G8B8A8_SRGB
        } else {
            PixelFormat::R8G8B8A8_UNORM
        };
        let depth_format = select_depth_format(
            &chain.core.device().depth_stencil_formats(),
            flags.contains(SwapChainFlags::HAS_STENCIL_BUFFER),
        )?;
        {
            let bundle = chain.core.bundle_mut();
            bundle.extent = extent;
            bundle.color_format = color_format;
            bundle.depth_format = depth_format;
        }

        // Pushed one by one so a failure midway still leaves them for destroy()
        for _ in 0..HEADLESS_SWAPCHAIN_SIZE {
            let image = chain.core.create_image(extent, color_format, false)?;
            chain.core.bundle_mut().colors.push(image);
        }
        let depth = chain.core.create_image(extent, depth_format, false)?;
        chain.core.bundle_mut().depth = depth;

        engine_debug!(
            SOURCE,
            "Created {} offscreen images {} {:?}, depth={:?}",
            HEADLESS_SWAPCHAIN_SIZE,
            extent,
            color_format,
            depth_format
        );
        Ok(chain)
    }

    pub fn flags(&self) -> SwapChainFlags {
        self.flags
    }

    pub fn core(&self) -> &SwapChainCore<D> {
        &self.core
    }
}

impl<D: Device + ?Sized> SwapChain for HeadlessSwapChain<D> {
    fn acquire(&mut self, sync: &mut ImageSyncData) -> Result<SwapChainStatus> {
        sync.image_ready_semaphore = SemaphoreHandle::NULL;
        sync.image_index = self.current_index;
        self.current_index = (self.current_index + 1) % HEADLESS_SWAPCHAIN_SIZE as u32;
        Ok(SwapChainStatus::Optimal)
    }

    fn present(&mut self, _index: u32, _finished: SemaphoreHandle) -> Result<SwapChainStatus> {
        Ok(SwapChainStatus::Optimal)
    }

    fn destroy(&mut self) {
        let colors = std::mem::take(&mut self.core.bundle_mut().colors);
        for image in colors {
            self.core.destroy_image(image);
        }
        self.core.destroy();
    }

    fn is_protected(&self) -> bool {
        false
    }

    fn bundle(&self) -> &SwapChainBundle {
        self.core.bundle()
    }
}

impl<D: Device + ?Sized> Drop for HeadlessSwapChain<D> {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
#[path = "headless_swapchain_tests.rs"]
mod tests;
