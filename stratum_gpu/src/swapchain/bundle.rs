/// Swap chain state shared by every variant

use bitflags::bitflags;
use crate::device::{ColorSpace, Extent2D, ImageHandle, PixelFormat, SemaphoreHandle};

/// Size of the "image ready" semaphore pool of a surface swap chain
pub const IMAGE_READY_SEMAPHORE_COUNT: usize = 3;

/// Number of color images in a headless swap chain
pub const HEADLESS_SWAPCHAIN_SIZE: usize = 3;

bitflags! {
    /// Swap chain configuration flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SwapChainFlags: u64 {
        /// Prefer sRGB color formats
        const SRGB_COLORSPACE = 0x01;
        /// Depth attachment must carry a stencil aspect
        const HAS_STENCIL_BUFFER = 0x02;
        /// Allocate images from protected memory
        const PROTECTED_CONTENT = 0x04;
    }
}

/// Images, formats and extent of a swap chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapChainBundle {
    /// Borrowed from the presentation engine (surface) or owned (headless)
    pub colors: Vec<ImageHandle>,
    /// Always owned by the swap chain
    pub depth: ImageHandle,
    pub extent: Extent2D,
    pub color_format: PixelFormat,
    pub color_space: ColorSpace,
    pub depth_format: PixelFormat,
    pub is_protected: bool,
}

impl Default for SwapChainBundle {
    fn default() -> Self {
        Self {
            colors: Vec::new(),
            depth: ImageHandle::NULL,
            extent: Extent2D::default(),
            color_format: PixelFormat::Undefined,
            color_space: ColorSpace::SrgbNonlinear,
            depth_format: PixelFormat::Undefined,
            is_protected: false,
        }
    }
}

/// Output of `acquire`: which image to render into and what to wait on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageSyncData {
    /// Signalled when the image is available (null for headless chains)
    pub image_ready_semaphore: SemaphoreHandle,
    /// Index into `SwapChainBundle::colors`
    pub image_index: u32,
}

/// Non-fatal outcome of acquire/present/recreate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapChainStatus {
    Optimal,
    /// Still usable, but no longer matches the surface exactly
    Suboptimal,
    /// Unusable until `recreate()` is called
    OutOfDate,
}

impl SwapChainStatus {
    /// Whether the caller should recreate the swap chain
    pub fn needs_recreate(self) -> bool {
        self != SwapChainStatus::Optimal
    }
}
