/*!
# Stratum GPU

Swap chain lifecycle and descriptor set management for real-time renderers.

This crate holds the backend-agnostic half of the GPU layer. It is written
against small driver traits (`Device`, `SurfaceDevice`, `DescriptorDriver`)
that a backend crate implements on top of a native API; `stratum_gpu_vulkan`
provides the Vulkan implementation and `MockDevice` a GPU-free one.

## Architecture

- **Resource allocator**: attachment images with device-local (optionally protected) memory
- **SurfaceSwapChain**: presentation-engine images, semaphore pool, recreate on resize
- **HeadlessSwapChain**: fixed ring of owned offscreen images
- **DescriptorSet**: per-material binding table with dirty tracking and lazy commit
- **Engine**: global logger and error policy
*/

// Internal modules
mod error;
mod engine;
mod config;
pub mod log;
pub mod device;
pub mod swapchain;
pub mod descriptor;
pub mod utils;

#[cfg(test)]
mod test_utils;

// Main stratum namespace module
pub mod stratum {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton and configuration
    pub use crate::engine::Engine;
    pub use crate::config::{EngineConfig, ErrorPolicy};

    // Logging sub-module (types only, macros live at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Driver boundary: handles, formats, traits, mock
    pub mod device {
        pub use crate::device::*;
    }

    // Swap chains
    pub mod swapchain {
        pub use crate::swapchain::*;
    }

    // Descriptor sets
    pub mod descriptor {
        pub use crate::descriptor::*;
    }

    pub use crate::utils::Bitset64;
}
