pub mod types;
pub mod format;
pub mod device;
pub mod descriptor_driver;
pub mod mock_device;

pub use types::{
    select_memory_type, BufferHandle, ColorSpace, CompositeAlpha, DescriptorSetHandle,
    DescriptorSetLayoutHandle, DriverError, DriverResult, DriverStatus, Extent2D, ImageDesc,
    ImageHandle, ImageUsage, MemoryHandle, MemoryProperty, MemoryRequirements, PresentMode,
    SemaphoreHandle, SurfaceCapabilities, SurfaceFormat, SurfaceHandle, SurfaceTransform,
    SwapchainDesc, SwapchainHandle, TextureHandle, MAX_MEMORY_TYPES, UNDEFINED_EXTENT,
};
pub use format::PixelFormat;
pub use device::{Device, SurfaceDevice};
pub use descriptor_driver::DescriptorDriver;
pub use mock_device::{MockCommand, MockDevice};
