pub mod bundle;
pub mod allocator;
pub mod swapchain;
pub mod surface_swapchain;
pub mod headless_swapchain;

pub use bundle::{
    ImageSyncData, SwapChainBundle, SwapChainFlags, SwapChainStatus, HEADLESS_SWAPCHAIN_SIZE,
    IMAGE_READY_SEMAPHORE_COUNT,
};
pub use allocator::{create_image_and_memory, select_depth_format};
pub use swapchain::{SwapChain, SwapChainCore};
pub use surface_swapchain::SurfaceSwapChain;
pub use headless_swapchain::HeadlessSwapChain;
