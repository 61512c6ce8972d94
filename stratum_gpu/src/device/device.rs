/// Driver traits the swap chain layer is written against
///
/// Every method takes `&self`: backends are shared behind `Arc` and
/// synchronize internally. Fallible calls return the raw driver status so
/// callers decide how fatal a failure is.

use crate::device::{
    DriverResult, DriverStatus, ImageDesc, ImageHandle, MemoryHandle,
    MemoryProperty, MemoryRequirements, PixelFormat, PresentMode, SemaphoreHandle,
    SurfaceCapabilities, SurfaceFormat, SurfaceHandle, SwapchainDesc, SwapchainHandle,
};

/// Image, memory and synchronization services of a logical device
pub trait Device: Send + Sync {
    /// Create a 2D image without backing memory
    fn create_image(&self, desc: &ImageDesc) -> DriverResult<ImageHandle>;

    /// Query the memory requirements of an image
    fn image_memory_requirements(&self, image: ImageHandle) -> MemoryRequirements;

    /// Properties of each memory type exposed by the device, in index order
    fn memory_types(&self) -> Vec<MemoryProperty>;

    fn allocate_memory(&self, size: u64, memory_type_index: u32) -> DriverResult<MemoryHandle>;

    fn bind_image_memory(&self, image: ImageHandle, memory: MemoryHandle) -> DriverResult<()>;

    fn destroy_image(&self, image: ImageHandle);

    fn free_memory(&self, memory: MemoryHandle);

    fn create_semaphore(&self) -> DriverResult<SemaphoreHandle>;

    fn destroy_semaphore(&self, semaphore: SemaphoreHandle);

    /// Block until the graphics queue has drained
    fn queue_wait_idle(&self) -> DriverResult<()>;

    /// Depth/stencil attachment formats supported by the device, best first
    fn depth_stencil_formats(&self) -> Vec<PixelFormat>;
}

/// Presentation services on top of [`Device`]
pub trait SurfaceDevice: Device {
    fn surface_capabilities(&self, surface: SurfaceHandle) -> DriverResult<SurfaceCapabilities>;

    fn surface_formats(&self, surface: SurfaceHandle) -> DriverResult<Vec<SurfaceFormat>>;

    fn surface_present_modes(&self, surface: SurfaceHandle) -> DriverResult<Vec<PresentMode>>;

    fn create_swapchain(&self, desc: &SwapchainDesc) -> DriverResult<SwapchainHandle>;

    /// Images owned by the presentation engine, in swap chain index order
    fn swapchain_images(&self, swapchain: SwapchainHandle) -> DriverResult<Vec<ImageHandle>>;

    /// Request the next presentable image, signalling `semaphore` when it is ready
    fn acquire_next_image(
        &self,
        swapchain: SwapchainHandle,
        timeout_ns: u64,
        semaphore: SemaphoreHandle,
    ) -> DriverResult<(u32, DriverStatus)>;

    /// Queue image `index` for presentation after `wait_semaphore` is signalled
    fn queue_present(
        &self,
        swapchain: SwapchainHandle,
        index: u32,
        wait_semaphore: SemaphoreHandle,
    ) -> DriverResult<DriverStatus>;

    /// Destroy a swap chain and release the images it owns
    fn destroy_swapchain(&self, swapchain: SwapchainHandle);

    fn destroy_surface(&self, surface: SurfaceHandle);
}
