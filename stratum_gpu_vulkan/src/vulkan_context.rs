/// VulkanContext: instance, device and queue shared by the Vulkan driver traits
///
/// The context either bootstraps its own instance and logical device
/// (`VulkanContext::new`) or wraps handles created by the application
/// (`VulkanContext::from_raw_handles`). In both cases it owns the
/// descriptor pools, the sampler cache and the deferred binding state.

use ash::vk;
use std::ffi::{CStr, CString};
use std::sync::{Mutex, MutexGuard};
use stratum_gpu::stratum::device::{MemoryProperty, PixelFormat};
use stratum_gpu::stratum::{Error, Result};
use stratum_gpu::{engine_error, engine_info, engine_warn};
use crate::vulkan_descriptor::DescriptorState;
use crate::vulkan_format::{pixel_format_to_vk, vk_to_memory_property};
use crate::vulkan_sampler::SamplerCache;

#[cfg(feature = "vulkan-validation")]
use crate::vulkan_debug::DebugMessenger;

const SOURCE: &str = "stratum::vulkan";

/// Depth attachment candidates in preference order
const DEPTH_FORMAT_CANDIDATES: [PixelFormat; 6] = [
    PixelFormat::D32_SFLOAT,
    PixelFormat::X8_D24_UNORM,
    PixelFormat::D16_UNORM,
    PixelFormat::D32_SFLOAT_S8_UINT,
    PixelFormat::D24_UNORM_S8_UINT,
    PixelFormat::D16_UNORM_S8_UINT,
];

// ============================================================================
// Configuration
// ============================================================================

/// Vulkan backend configuration
#[derive(Debug, Clone)]
pub struct VulkanConfig {
    /// Application name reported to the driver
    pub app_name: String,
    /// Enable `VK_LAYER_KHRONOS_validation` and forward its messages to the engine log
    ///
    /// Ignored (with a warning) unless the `vulkan-validation` feature is compiled in.
    pub enable_validation: bool,
    /// Sets per descriptor pool; a new pool is created when one runs out
    pub descriptor_pool_max_sets: u32,
}

impl Default for VulkanConfig {
    fn default() -> Self {
        Self {
            app_name: "Stratum Application".to_string(),
            enable_validation: cfg!(debug_assertions) && cfg!(feature = "vulkan-validation"),
            descriptor_pool_max_sets: 1024,
        }
    }
}

// ============================================================================
// VulkanContext
// ============================================================================

pub struct VulkanContext {
    entry: ash::Entry,
    instance: ash::Instance,
    physical_device: vk::PhysicalDevice,
    device: ash::Device,
    graphics_queue: vk::Queue,
    graphics_queue_family: u32,

    memory_types: Vec<MemoryProperty>,
    depth_formats: Vec<PixelFormat>,

    surface_loader: ash::khr::surface::Instance,
    swapchain_loader: Option<ash::khr::swapchain::Device>,

    descriptors: Mutex<DescriptorState>,
    samplers: Mutex<SamplerCache>,

    /// Device and instance are destroyed on drop only when created here
    owns_device: bool,

    #[cfg(feature = "vulkan-validation")]
    debug_messenger: Option<DebugMessenger>,
}

impl VulkanContext {
    /// Bootstrap an instance and logical device on the first GPU with a graphics queue
    ///
    /// `instance_extensions` lists extra instance extensions, typically the
    /// window-system surface extensions the application needs to create
    /// surfaces. `VK_KHR_swapchain` is enabled on the device when available.
    pub fn new(config: VulkanConfig, instance_extensions: &[&CStr]) -> Result<Self> {
        let entry = unsafe { ash::Entry::load() }.map_err(|e| {
            engine_error!(SOURCE, "Failed to load Vulkan library: {:?}", e);
            Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
        })?;

        let app_name = CString::new(config.app_name.clone()).map_err(|e| {
            engine_error!(SOURCE, "Invalid application name: {}", e);
            Error::InitializationFailed(format!("Invalid application name: {}", e))
        })?;
        let app_info = vk::ApplicationInfo::default()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(c"Stratum")
            .engine_version(vk::make_api_version(0, 0, 1, 0))
            .api_version(vk::API_VERSION_1_1);

        let validation = validation_requested(&config);
        #[cfg_attr(not(feature = "vulkan-validation"), allow(unused_mut))]
        let mut extension_names: Vec<*const std::os::raw::c_char> =
            instance_extensions.iter().map(|name| name.as_ptr()).collect();
        #[cfg_attr(not(feature = "vulkan-validation"), allow(unused_mut))]
        let mut layer_names: Vec<*const std::os::raw::c_char> = Vec::new();
        #[cfg(feature = "vulkan-validation")]
        if validation {
            extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            layer_names.push(crate::vulkan_debug::VALIDATION_LAYER.as_ptr());
        }

        let create_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_layer_names(&layer_names)
            .enabled_extension_names(&extension_names);

        let instance = unsafe { entry.create_instance(&create_info, None) }.map_err(|e| {
            engine_error!(SOURCE, "Failed to create Vulkan instance: {:?}", e);
            Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
        })?;

        #[cfg(feature = "vulkan-validation")]
        let debug_messenger = if validation {
            match DebugMessenger::new(&entry, &instance) {
                Ok(messenger) => Some(messenger),
                Err(e) => {
                    unsafe { instance.destroy_instance(None) };
                    return Err(e);
                }
            }
        } else {
            None
        };
        #[cfg(not(feature = "vulkan-validation"))]
        let _ = validation;

        let device_parts = match unsafe { create_logical_device(&instance) } {
            Ok(parts) => parts,
            Err(e) => {
                #[cfg(feature = "vulkan-validation")]
                if let Some(mut messenger) = debug_messenger {
                    messenger.destroy();
                }
                unsafe { instance.destroy_instance(None) };
                return Err(e);
            }
        };
        let (physical_device, device, graphics_queue_family, anisotropy, swapchain_supported) =
            device_parts;

        #[cfg_attr(not(feature = "vulkan-validation"), allow(unused_mut))]
        let mut context = Self::assemble(
            entry,
            instance,
            physical_device,
            device,
            graphics_queue_family,
            &config,
            anisotropy,
            swapchain_supported,
            true,
        );
        #[cfg(feature = "vulkan-validation")]
        {
            context.debug_messenger = debug_messenger;
        }
        Ok(context)
    }

    /// Wrap an instance and device created by the application
    ///
    /// The device must have been created with `VK_KHR_swapchain` if surface
    /// swap chains are used. The handles are not destroyed on drop.
    pub fn from_raw_handles(
        entry: ash::Entry,
        instance: ash::Instance,
        physical_device: vk::PhysicalDevice,
        device: ash::Device,
        graphics_queue_family: u32,
        config: VulkanConfig,
    ) -> Self {
        let features = unsafe { instance.get_physical_device_features(physical_device) };
        Self::assemble(
            entry,
            instance,
            physical_device,
            device,
            graphics_queue_family,
            &config,
            features.sampler_anisotropy == vk::TRUE,
            true,
            false,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        entry: ash::Entry,
        instance: ash::Instance,
        physical_device: vk::PhysicalDevice,
        device: ash::Device,
        graphics_queue_family: u32,
        config: &VulkanConfig,
        anisotropy_supported: bool,
        swapchain_supported: bool,
        owns_device: bool,
    ) -> Self {
        let graphics_queue = unsafe { device.get_device_queue(graphics_queue_family, 0) };

        let memory_types = query_memory_types(&instance, physical_device);
        let depth_formats = query_depth_formats(&instance, physical_device);

        let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);
        let swapchain_loader =
            swapchain_supported.then(|| ash::khr::swapchain::Device::new(&instance, &device));

        let properties = unsafe { instance.get_physical_device_properties(physical_device) };
        let device_name = properties
            .device_name_as_c_str()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        engine_info!(
            SOURCE,
            "Vulkan context ready: {}, {} memory types, depth formats {:?}, swapchain={}",
            device_name,
            memory_types.len(),
            depth_formats,
            swapchain_supported
        );

        Self {
            entry,
            instance,
            physical_device,
            device,
            graphics_queue,
            graphics_queue_family,
            memory_types,
            depth_formats,
            surface_loader,
            swapchain_loader,
            descriptors: Mutex::new(DescriptorState::new(config.descriptor_pool_max_sets)),
            samplers: Mutex::new(SamplerCache::new(anisotropy_supported)),
            owns_device,
            #[cfg(feature = "vulkan-validation")]
            debug_messenger: None,
        }
    }

    // ===== ACCESSORS =====

    pub fn entry(&self) -> &ash::Entry {
        &self.entry
    }

    pub fn instance(&self) -> &ash::Instance {
        &self.instance
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    pub fn graphics_queue(&self) -> vk::Queue {
        self.graphics_queue
    }

    pub fn graphics_queue_family(&self) -> u32 {
        self.graphics_queue_family
    }

    /// Whether the graphics queue can present to `surface`
    pub fn supports_present(&self, surface: vk::SurfaceKHR) -> bool {
        unsafe {
            self.surface_loader.get_physical_device_surface_support(
                self.physical_device,
                self.graphics_queue_family,
                surface,
            )
        }
        .unwrap_or(false)
    }

    /// Number of samplers created so far
    pub fn sampler_count(&self) -> usize {
        self.samplers().len()
    }

    pub(crate) fn memory_type_properties(&self) -> &[MemoryProperty] {
        &self.memory_types
    }

    pub(crate) fn depth_formats(&self) -> &[PixelFormat] {
        &self.depth_formats
    }

    pub(crate) fn surface_loader(&self) -> &ash::khr::surface::Instance {
        &self.surface_loader
    }

    pub(crate) fn swapchain_loader(&self) -> Option<&ash::khr::swapchain::Device> {
        self.swapchain_loader.as_ref()
    }

    pub(crate) fn descriptors(&self) -> MutexGuard<'_, DescriptorState> {
        self.descriptors.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn samplers(&self) -> MutexGuard<'_, SamplerCache> {
        self.samplers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for VulkanContext {
    fn drop(&mut self) {
        unsafe {
            if let Err(e) = self.device.device_wait_idle() {
                engine_warn!(SOURCE, "vkDeviceWaitIdle failed during shutdown. error={}", e.as_raw());
            }

            // Samplers and pools first, while the device is alive
            self.samplers
                .get_mut()
                .unwrap_or_else(|e| e.into_inner())
                .shutdown(&self.device);
            self.descriptors
                .get_mut()
                .unwrap_or_else(|e| e.into_inner())
                .shutdown(&self.device);

            if !self.owns_device {
                return;
            }

            #[cfg(feature = "vulkan-validation")]
            if let Some(messenger) = self.debug_messenger.as_mut() {
                messenger.destroy();
            }

            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}

// ============================================================================
// Bootstrap helpers
// ============================================================================

fn validation_requested(config: &VulkanConfig) -> bool {
    if config.enable_validation && !cfg!(feature = "vulkan-validation") {
        engine_warn!(SOURCE, "Validation requested but the vulkan-validation feature is disabled");
        return false;
    }
    config.enable_validation
}

/// Physical device, logical device, graphics family, anisotropy support, swapchain support
type DeviceParts = (vk::PhysicalDevice, ash::Device, u32, bool, bool);

unsafe fn create_logical_device(instance: &ash::Instance) -> Result<DeviceParts> {
    let physical_devices = instance.enumerate_physical_devices().map_err(|e| {
        engine_error!(SOURCE, "Failed to enumerate physical devices: {:?}", e);
        Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e))
    })?;

    let (physical_device, graphics_family_index) = physical_devices
        .into_iter()
        .find_map(|pd| {
            instance
                .get_physical_device_queue_family_properties(pd)
                .iter()
                .position(|qf| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                .map(|i| (pd, i as u32))
        })
        .ok_or_else(|| {
            engine_error!(SOURCE, "No Vulkan GPU with a graphics queue found");
            Error::InitializationFailed("No Vulkan GPU with a graphics queue found".to_string())
        })?;

    let swapchain_supported = instance
        .enumerate_device_extension_properties(physical_device)
        .map(|extensions| {
            extensions.iter().any(|ext| {
                ext.extension_name_as_c_str()
                    .map(|name| name == ash::khr::swapchain::NAME)
                    .unwrap_or(false)
            })
        })
        .unwrap_or(false);

    let supported_features = instance.get_physical_device_features(physical_device);
    let anisotropy = supported_features.sampler_anisotropy == vk::TRUE;

    let queue_priorities = [1.0];
    let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
        .queue_family_index(graphics_family_index)
        .queue_priorities(&queue_priorities)];

    let device_extension_names = if swapchain_supported {
        vec![ash::khr::swapchain::NAME.as_ptr()]
    } else {
        vec![]
    };
    let device_features = vk::PhysicalDeviceFeatures::default().sampler_anisotropy(anisotropy);

    let device_create_info = vk::DeviceCreateInfo::default()
        .queue_create_infos(&queue_create_infos)
        .enabled_extension_names(&device_extension_names)
        .enabled_features(&device_features);

    let device = instance
        .create_device(physical_device, &device_create_info, None)
        .map_err(|e| {
            engine_error!(SOURCE, "Failed to create logical device: {:?}", e);
            Error::InitializationFailed(format!("Failed to create device: {:?}", e))
        })?;

    Ok((physical_device, device, graphics_family_index, anisotropy, swapchain_supported))
}

/// Memory type properties in index order
///
/// Protected memory is only usable once the protectedMemory feature and a
/// protected queue are enabled, which this context never does, so the
/// PROTECTED bit is masked out and protected allocations fail type selection.
fn query_memory_types(instance: &ash::Instance, physical_device: vk::PhysicalDevice) -> Vec<MemoryProperty> {
    let properties = unsafe { instance.get_physical_device_memory_properties(physical_device) };
    properties.memory_types[..properties.memory_type_count as usize]
        .iter()
        .map(|t| vk_to_memory_property(t.property_flags) - MemoryProperty::PROTECTED)
        .collect()
}

/// Depth formats usable as optimal-tiling depth/stencil attachments, in preference order
fn query_depth_formats(instance: &ash::Instance, physical_device: vk::PhysicalDevice) -> Vec<PixelFormat> {
    DEPTH_FORMAT_CANDIDATES
        .into_iter()
        .filter(|&format| {
            let properties = unsafe {
                instance.get_physical_device_format_properties(physical_device, pixel_format_to_vk(format))
            };
            properties
                .optimal_tiling_features
                .contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
        })
        .collect()
}
