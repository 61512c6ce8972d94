/// Driver boundary value types: handles, extents, flags and capability records

use bitflags::bitflags;
use std::fmt;
use crate::device::PixelFormat;

// ============================================================================
// Handles
// ============================================================================

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub u64);

        impl $name {
            /// The null handle
            pub const NULL: Self = Self(0);

            /// Wrap a raw backend handle value
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            /// Raw backend handle value
            pub const fn as_raw(self) -> u64 {
                self.0
            }

            pub const fn is_null(self) -> bool {
                self.0 == 0
            }
        }
    };
}

define_handle!(
    /// GPU image (color or depth attachment)
    ImageHandle
);
define_handle!(
    /// Device memory allocation backing an image
    MemoryHandle
);
define_handle!(
    /// GPU-GPU synchronization primitive
    SemaphoreHandle
);
define_handle!(
    /// Low-level presentation swap chain object
    SwapchainHandle
);
define_handle!(
    /// Presentable window surface
    SurfaceHandle
);
define_handle!(
    /// Uniform or storage buffer object
    BufferHandle
);
define_handle!(
    /// Sampled texture (image view in the Vulkan backend)
    TextureHandle
);
define_handle!(
    /// Backend descriptor set
    DescriptorSetHandle
);
define_handle!(
    /// Backend descriptor set layout
    DescriptorSetLayoutHandle
);

// ============================================================================
// Extent
// ============================================================================

/// Sentinel reported by surfaces that have no fixed extent
pub const UNDEFINED_EXTENT: u32 = u32::MAX;

/// Maximum number of memory types a device can expose
pub const MAX_MEMORY_TYPES: u32 = 32;

/// Two-dimensional size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

impl Extent2D {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether either dimension holds the "undefined" sentinel
    pub fn is_undefined(&self) -> bool {
        self.width == UNDEFINED_EXTENT || self.height == UNDEFINED_EXTENT
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Extent2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

// ============================================================================
// Flags (bit values match the Vulkan encoding)
// ============================================================================

bitflags! {
    /// How an image will be used
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ImageUsage: u32 {
        const TRANSFER_SRC = 0x01;
        const TRANSFER_DST = 0x02;
        const SAMPLED = 0x04;
        const STORAGE = 0x08;
        const COLOR_ATTACHMENT = 0x10;
        const DEPTH_STENCIL_ATTACHMENT = 0x20;
    }
}

bitflags! {
    /// Properties of a device memory type
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MemoryProperty: u32 {
        const DEVICE_LOCAL = 0x01;
        const HOST_VISIBLE = 0x02;
        const HOST_COHERENT = 0x04;
        const HOST_CACHED = 0x08;
        const LAZILY_ALLOCATED = 0x10;
        const PROTECTED = 0x20;
    }
}

bitflags! {
    /// Alpha compositing modes supported by a surface
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CompositeAlpha: u32 {
        const OPAQUE = 0x01;
        const PRE_MULTIPLIED = 0x02;
        const POST_MULTIPLIED = 0x04;
        const INHERIT = 0x08;
    }
}

bitflags! {
    /// Surface pre-transform (rotation/mirroring applied before presentation)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SurfaceTransform: u32 {
        const IDENTITY = 0x001;
        const ROTATE_90 = 0x002;
        const ROTATE_180 = 0x004;
        const ROTATE_270 = 0x008;
        const HORIZONTAL_MIRROR = 0x010;
        const HORIZONTAL_MIRROR_ROTATE_90 = 0x020;
        const HORIZONTAL_MIRROR_ROTATE_180 = 0x040;
        const HORIZONTAL_MIRROR_ROTATE_270 = 0x080;
        const INHERIT = 0x100;
    }
}

/// Presentation mode of a swap chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresentMode {
    Immediate,
    Mailbox,
    /// Vsync-ordered queue of images, never tears
    Fifo,
    FifoRelaxed,
}

/// Color space of a surface format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    SrgbNonlinear,
    ExtendedSrgbLinear,
    DisplayP3Nonlinear,
    /// Any other backend color space, carried as its raw value
    Other(i32),
}

// ============================================================================
// Capability and creation records
// ============================================================================

/// Surface capabilities reported by the presentation engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceCapabilities {
    pub min_image_count: u32,
    /// Zero means "no limit"
    pub max_image_count: u32,
    /// May hold `UNDEFINED_EXTENT` in both dimensions
    pub current_extent: Extent2D,
    pub supported_composite_alpha: CompositeAlpha,
    pub current_transform: SurfaceTransform,
}

/// Pixel format + color space pair supported by a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceFormat {
    pub format: PixelFormat,
    pub color_space: ColorSpace,
}

/// Memory requirements of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRequirements {
    pub size: u64,
    pub alignment: u64,
    /// Bit `i` set when memory type `i` may back the resource
    pub memory_type_bits: u32,
}

/// Description of a single-mip, single-layer 2D image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDesc {
    pub extent: Extent2D,
    pub format: PixelFormat,
    pub usage: ImageUsage,
    pub protected: bool,
}

/// Parameters of a low-level swap chain creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapchainDesc {
    pub surface: SurfaceHandle,
    pub min_image_count: u32,
    pub format: PixelFormat,
    pub color_space: ColorSpace,
    pub extent: Extent2D,
    pub usage: ImageUsage,
    pub pre_transform: SurfaceTransform,
    pub composite_alpha: CompositeAlpha,
    pub present_mode: PresentMode,
    pub protected: bool,
    /// Previous swap chain, passed as a recycling hint (may be null)
    pub old_swapchain: SwapchainHandle,
}

// ============================================================================
// Driver results
// ============================================================================

/// Non-success status returned by a native driver call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DriverError(pub i32);

impl DriverError {
    pub const ERROR_OUT_OF_HOST_MEMORY: Self = Self(-1);
    pub const ERROR_OUT_OF_DEVICE_MEMORY: Self = Self(-2);
    pub const ERROR_INITIALIZATION_FAILED: Self = Self(-3);
    pub const ERROR_DEVICE_LOST: Self = Self(-4);
    pub const ERROR_FORMAT_NOT_SUPPORTED: Self = Self(-11);
    pub const ERROR_SURFACE_LOST: Self = Self(-1_000_000_000);
    pub const ERROR_OUT_OF_DATE: Self = Self(-1_000_001_004);
    pub const ERROR_OUT_OF_POOL_MEMORY: Self = Self(-1_000_069_000);
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "driver error {}", self.0)
    }
}

impl std::error::Error for DriverError {}

/// Result of a native driver call
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// Successful outcome of acquire/present calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverStatus {
    Success,
    /// Surface still usable but no longer matches the swap chain exactly
    Suboptimal,
}

/// Pick the first memory type allowed by `type_bits` that has all `required` properties
///
/// Shared by every backend so memory selection behaves identically on the
/// mock device and on real hardware.
pub fn select_memory_type(
    memory_types: &[MemoryProperty],
    type_bits: u32,
    required: MemoryProperty,
) -> Option<u32> {
    memory_types
        .iter()
        .take(MAX_MEMORY_TYPES as usize)
        .enumerate()
        .find(|(i, props)| type_bits & (1u32 << i) != 0 && props.contains(required))
        .map(|(i, _)| i as u32)
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
