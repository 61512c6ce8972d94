/// Device and SurfaceDevice implementations on top of ash
///
/// Engine handles carry the raw Vulkan handle values, so conversions are
/// plain `from_raw`/`as_raw` copies. Failed calls surface the raw
/// `vk::Result` code; `VK_SUBOPTIMAL_KHR` maps to `DriverStatus::Suboptimal`.

use ash::vk;
use ash::vk::Handle;
use stratum_gpu::stratum::device::{
    Device, DriverError, DriverResult, DriverStatus, ImageDesc, ImageHandle, MemoryHandle,
    MemoryProperty, MemoryRequirements, PixelFormat, PresentMode, SemaphoreHandle,
    SurfaceCapabilities, SurfaceDevice, SurfaceFormat, SurfaceHandle, SwapchainDesc,
    SwapchainHandle,
};
use crate::vulkan_context::VulkanContext;
use crate::vulkan_format::{
    color_space_to_vk, composite_alpha_to_vk, driver_error, extent_to_vk, image_usage_to_vk,
    pixel_format_to_vk, present_mode_to_vk, surface_transform_to_vk, vk_to_color_space,
    vk_to_composite_alpha, vk_to_extent, vk_to_pixel_format, vk_to_present_mode,
    vk_to_surface_transform,
};

/// Returned by swapchain calls when the device lacks `VK_KHR_swapchain`
const EXTENSION_NOT_PRESENT: DriverError = DriverError(vk::Result::ERROR_EXTENSION_NOT_PRESENT.as_raw());

fn status(suboptimal: bool) -> DriverStatus {
    if suboptimal {
        DriverStatus::Suboptimal
    } else {
        DriverStatus::Success
    }
}

/// Wrap a Vulkan surface created by the application
pub fn surface_handle(surface: vk::SurfaceKHR) -> SurfaceHandle {
    SurfaceHandle::from_raw(surface.as_raw())
}

// ============================================================================
// Device
// ============================================================================

impl Device for VulkanContext {
    fn create_image(&self, desc: &ImageDesc) -> DriverResult<ImageHandle> {
        let flags = if desc.protected {
            vk::ImageCreateFlags::PROTECTED
        } else {
            vk::ImageCreateFlags::empty()
        };
        let create_info = vk::ImageCreateInfo::default()
            .flags(flags)
            .image_type(vk::ImageType::TYPE_2D)
            .format(pixel_format_to_vk(desc.format))
            .extent(vk::Extent3D {
                width: desc.extent.width,
                height: desc.extent.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(image_usage_to_vk(desc.usage))
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = unsafe { self.device().create_image(&create_info, None) }.map_err(driver_error)?;
        Ok(ImageHandle::from_raw(image.as_raw()))
    }

    fn image_memory_requirements(&self, image: ImageHandle) -> MemoryRequirements {
        let requirements = unsafe {
            self.device()
                .get_image_memory_requirements(vk::Image::from_raw(image.as_raw()))
        };
        MemoryRequirements {
            size: requirements.size,
            alignment: requirements.alignment,
            memory_type_bits: requirements.memory_type_bits,
        }
    }

    fn memory_types(&self) -> Vec<MemoryProperty> {
        self.memory_type_properties().to_vec()
    }

    fn allocate_memory(&self, size: u64, memory_type_index: u32) -> DriverResult<MemoryHandle> {
        let allocate_info = vk::MemoryAllocateInfo::default()
            .allocation_size(size)
            .memory_type_index(memory_type_index);
        let memory = unsafe { self.device().allocate_memory(&allocate_info, None) }.map_err(driver_error)?;
        Ok(MemoryHandle::from_raw(memory.as_raw()))
    }

    fn bind_image_memory(&self, image: ImageHandle, memory: MemoryHandle) -> DriverResult<()> {
        unsafe {
            self.device().bind_image_memory(
                vk::Image::from_raw(image.as_raw()),
                vk::DeviceMemory::from_raw(memory.as_raw()),
                0,
            )
        }
        .map_err(driver_error)
    }

    fn destroy_image(&self, image: ImageHandle) {
        unsafe {
            self.device()
                .destroy_image(vk::Image::from_raw(image.as_raw()), None)
        };
    }

    fn free_memory(&self, memory: MemoryHandle) {
        unsafe {
            self.device()
                .free_memory(vk::DeviceMemory::from_raw(memory.as_raw()), None)
        };
    }

    fn create_semaphore(&self) -> DriverResult<SemaphoreHandle> {
        let create_info = vk::SemaphoreCreateInfo::default();
        let semaphore = unsafe { self.device().create_semaphore(&create_info, None) }.map_err(driver_error)?;
        Ok(SemaphoreHandle::from_raw(semaphore.as_raw()))
    }

    fn destroy_semaphore(&self, semaphore: SemaphoreHandle) {
        unsafe {
            self.device()
                .destroy_semaphore(vk::Semaphore::from_raw(semaphore.as_raw()), None)
        };
    }

    fn queue_wait_idle(&self) -> DriverResult<()> {
        unsafe { self.device().queue_wait_idle(self.graphics_queue()) }.map_err(driver_error)
    }

    fn depth_stencil_formats(&self) -> Vec<PixelFormat> {
        self.depth_formats().to_vec()
    }
}

// ============================================================================
// SurfaceDevice
// ============================================================================

impl SurfaceDevice for VulkanContext {
    fn surface_capabilities(&self, surface: SurfaceHandle) -> DriverResult<SurfaceCapabilities> {
        let caps = unsafe {
            self.surface_loader().get_physical_device_surface_capabilities(
                self.physical_device(),
                vk::SurfaceKHR::from_raw(surface.as_raw()),
            )
        }
        .map_err(driver_error)?;

        Ok(SurfaceCapabilities {
            min_image_count: caps.min_image_count,
            max_image_count: caps.max_image_count,
            current_extent: vk_to_extent(caps.current_extent),
            supported_composite_alpha: vk_to_composite_alpha(caps.supported_composite_alpha),
            current_transform: vk_to_surface_transform(caps.current_transform),
        })
    }

    fn surface_formats(&self, surface: SurfaceHandle) -> DriverResult<Vec<SurfaceFormat>> {
        let formats = unsafe {
            self.surface_loader().get_physical_device_surface_formats(
                self.physical_device(),
                vk::SurfaceKHR::from_raw(surface.as_raw()),
            )
        }
        .map_err(driver_error)?;

        Ok(formats
            .iter()
            .map(|f| SurfaceFormat {
                format: vk_to_pixel_format(f.format),
                color_space: vk_to_color_space(f.color_space),
            })
            .collect())
    }

    fn surface_present_modes(&self, surface: SurfaceHandle) -> DriverResult<Vec<PresentMode>> {
        let modes = unsafe {
            self.surface_loader().get_physical_device_surface_present_modes(
                self.physical_device(),
                vk::SurfaceKHR::from_raw(surface.as_raw()),
            )
        }
        .map_err(driver_error)?;

        Ok(modes.into_iter().filter_map(vk_to_present_mode).collect())
    }

    fn create_swapchain(&self, desc: &SwapchainDesc) -> DriverResult<SwapchainHandle> {
        let loader = self.swapchain_loader().ok_or(EXTENSION_NOT_PRESENT)?;
        let flags = if desc.protected {
            vk::SwapchainCreateFlagsKHR::PROTECTED
        } else {
            vk::SwapchainCreateFlagsKHR::empty()
        };

        let create_info = vk::SwapchainCreateInfoKHR::default()
            .flags(flags)
            .surface(vk::SurfaceKHR::from_raw(desc.surface.as_raw()))
            .min_image_count(desc.min_image_count)
            .image_format(pixel_format_to_vk(desc.format))
            .image_color_space(color_space_to_vk(desc.color_space))
            .image_extent(extent_to_vk(desc.extent))
            .image_array_layers(1)
            .image_usage(image_usage_to_vk(desc.usage))
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(surface_transform_to_vk(desc.pre_transform))
            .composite_alpha(composite_alpha_to_vk(desc.composite_alpha))
            .present_mode(present_mode_to_vk(desc.present_mode))
            .clipped(true)
            .old_swapchain(vk::SwapchainKHR::from_raw(desc.old_swapchain.as_raw()));

        let swapchain = unsafe { loader.create_swapchain(&create_info, None) }.map_err(driver_error)?;
        Ok(SwapchainHandle::from_raw(swapchain.as_raw()))
    }

    fn swapchain_images(&self, swapchain: SwapchainHandle) -> DriverResult<Vec<ImageHandle>> {
        let loader = self.swapchain_loader().ok_or(EXTENSION_NOT_PRESENT)?;
        let images = unsafe {
            loader.get_swapchain_images(vk::SwapchainKHR::from_raw(swapchain.as_raw()))
        }
        .map_err(driver_error)?;
        Ok(images
            .into_iter()
            .map(|image| ImageHandle::from_raw(image.as_raw()))
            .collect())
    }

    fn acquire_next_image(
        &self,
        swapchain: SwapchainHandle,
        timeout_ns: u64,
        semaphore: SemaphoreHandle,
    ) -> DriverResult<(u32, DriverStatus)> {
        let loader = self.swapchain_loader().ok_or(EXTENSION_NOT_PRESENT)?;
        let (index, suboptimal) = unsafe {
            loader.acquire_next_image(
                vk::SwapchainKHR::from_raw(swapchain.as_raw()),
                timeout_ns,
                vk::Semaphore::from_raw(semaphore.as_raw()),
                vk::Fence::null(),
            )
        }
        .map_err(driver_error)?;
        Ok((index, status(suboptimal)))
    }

    fn queue_present(
        &self,
        swapchain: SwapchainHandle,
        index: u32,
        wait_semaphore: SemaphoreHandle,
    ) -> DriverResult<DriverStatus> {
        let loader = self.swapchain_loader().ok_or(EXTENSION_NOT_PRESENT)?;
        let wait_semaphores: Vec<vk::Semaphore> = if wait_semaphore.is_null() {
            Vec::new()
        } else {
            vec![vk::Semaphore::from_raw(wait_semaphore.as_raw())]
        };
        let swapchains = [vk::SwapchainKHR::from_raw(swapchain.as_raw())];
        let indices = [index];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&indices);

        let suboptimal = unsafe { loader.queue_present(self.graphics_queue(), &present_info) }
            .map_err(driver_error)?;
        Ok(status(suboptimal))
    }

    fn destroy_swapchain(&self, swapchain: SwapchainHandle) {
        if let Some(loader) = self.swapchain_loader() {
            unsafe { loader.destroy_swapchain(vk::SwapchainKHR::from_raw(swapchain.as_raw()), None) };
        }
    }

    fn destroy_surface(&self, surface: SurfaceHandle) {
        unsafe {
            self.surface_loader()
                .destroy_surface(vk::SurfaceKHR::from_raw(surface.as_raw()), None)
        };
    }
}
