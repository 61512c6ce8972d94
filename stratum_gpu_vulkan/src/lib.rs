/*!
# Stratum GPU - Vulkan Backend

Vulkan implementation of the `stratum_gpu` driver traits, built on the Ash
bindings.

`VulkanContext` implements `Device`, `SurfaceDevice` and `DescriptorDriver`,
so it can back both swap chain variants and descriptor sets:

```no_run
use std::sync::Arc;
use stratum_gpu::stratum::device::Extent2D;
use stratum_gpu::stratum::swapchain::{HeadlessSwapChain, SwapChainFlags};
use stratum_gpu_vulkan::{VulkanConfig, VulkanContext};

let context = Arc::new(VulkanContext::new(VulkanConfig::default(), &[])?);
let _chain = HeadlessSwapChain::new(context, Extent2D::new(1280, 720), SwapChainFlags::empty())?;
# Ok::<(), stratum_gpu::stratum::Error>(())
```
*/

mod vulkan_context;
mod vulkan_device;
mod vulkan_descriptor;
mod vulkan_sampler;
pub mod vulkan_format;

#[cfg(feature = "vulkan-validation")]
mod vulkan_debug;

pub use vulkan_context::{VulkanConfig, VulkanContext};
pub use vulkan_device::surface_handle;
