/// SwapChain trait and the state every variant shares

use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::device::{Device, Extent2D, ImageHandle, MemoryHandle, PixelFormat, SemaphoreHandle};
use crate::error::Result;
use crate::swapchain::{create_image_and_memory, ImageSyncData, SwapChainBundle, SwapChainStatus};
use crate::engine_warn;

const SOURCE: &str = "stratum::SwapChain";

/// Set of images a frame is rendered into and presented from
///
/// Implemented by [`SurfaceSwapChain`](crate::swapchain::SurfaceSwapChain)
/// and [`HeadlessSwapChain`](crate::swapchain::HeadlessSwapChain).
pub trait SwapChain {
    /// Get the next image to render into, writing its index and ready semaphore to `sync`
    fn acquire(&mut self, sync: &mut ImageSyncData) -> Result<SwapChainStatus>;

    /// Present image `index` once `finished` is signalled
    fn present(&mut self, index: u32, finished: SemaphoreHandle) -> Result<SwapChainStatus>;

    /// Release every resource owned by the swap chain (idempotent)
    fn destroy(&mut self);

    /// Rebuild the swap chain in place
    fn recreate(&mut self) -> Result<SwapChainStatus> {
        Ok(SwapChainStatus::Optimal)
    }

    /// Whether the target size no longer matches the bundle extent
    fn has_resized(&self) -> Result<bool> {
        Ok(false)
    }

    fn is_protected(&self) -> bool;

    fn bundle(&self) -> &SwapChainBundle;
}

/// Bundle plus the image -> memory registry of owned images
///
/// Every image created through [`SwapChainCore::create_image`] has exactly
/// one registry entry until [`SwapChainCore::destroy_image`] releases both.
pub struct SwapChainCore<D: Device + ?Sized> {
    device: Arc<D>,
    bundle: SwapChainBundle,
    memory: FxHashMap<ImageHandle, MemoryHandle>,
}

impl<D: Device + ?Sized> SwapChainCore<D> {
    pub fn new(device: Arc<D>) -> Self {
        Self {
            device,
            bundle: SwapChainBundle::default(),
            memory: FxHashMap::default(),
        }
    }

    pub fn device(&self) -> &Arc<D> {
        &self.device
    }

    pub fn bundle(&self) -> &SwapChainBundle {
        &self.bundle
    }

    pub fn bundle_mut(&mut self) -> &mut SwapChainBundle {
        &mut self.bundle
    }

    /// Allocate an image with backing memory and register the pair
    pub fn create_image(
        &mut self,
        extent: Extent2D,
        format: PixelFormat,
        is_protected: bool,
    ) -> Result<ImageHandle> {
        let (image, memory) = create_image_and_memory(&*self.device, extent, format, is_protected)?;
        self.memory.insert(image, memory);
        Ok(image)
    }

    /// Destroy an owned image, then free its memory
    pub fn destroy_image(&mut self, image: ImageHandle) {
        match self.memory.remove(&image) {
            Some(memory) => {
                self.device.destroy_image(image);
                self.device.free_memory(memory);
            }
            None => {
                engine_warn!(SOURCE, "{:?} is not owned by this swap chain, not destroyed", image);
            }
        }
    }

    /// Destroy the depth image and forget the color handles
    ///
    /// Color images are not destroyed here; variants that own them release
    /// them before calling this.
    pub fn destroy(&mut self) {
        if !self.bundle.depth.is_null() {
            let depth = self.bundle.depth;
            self.destroy_image(depth);
            self.bundle.depth = ImageHandle::NULL;
        }
        self.bundle.colors.clear();
    }

    /// Memory backing `image`, if it is owned by this swap chain
    pub fn memory_for(&self, image: ImageHandle) -> Option<MemoryHandle> {
        self.memory.get(&image).copied()
    }

    /// Number of owned images still alive
    pub fn registry_len(&self) -> usize {
        self.memory.len()
    }
}

impl<D: Device + ?Sized> Drop for SwapChainCore<D> {
    fn drop(&mut self) {
        if self.memory.is_empty() {
            return;
        }
        engine_warn!(SOURCE, "{} owned images still alive at drop, releasing", self.memory.len());
        for (image, memory) in self.memory.drain() {
            self.device.destroy_image(image);
            self.device.free_memory(memory);
        }
    }
}

#[cfg(test)]
#[path = "swapchain_tests.rs"]
mod tests;
