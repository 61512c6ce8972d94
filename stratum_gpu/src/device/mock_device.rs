/// Mock device for testing without a GPU
///
/// Implements every driver trait with in-memory bookkeeping: handles come
/// from slot maps, live objects are counted, double frees are recorded
/// instead of crashing, and descriptor commands are kept in submission
/// order. Surface properties, acquire/present results and driver failures
/// are scriptable so tests can drive the swap chain state machines.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use rustc_hash::FxHashMap;
use slotmap::{DefaultKey, Key, KeyData, SlotMap};
use crate::device::{
    select_memory_type, BufferHandle, ColorSpace, CompositeAlpha, DescriptorDriver,
    DescriptorSetHandle, DescriptorSetLayoutHandle, Device, DriverError, DriverResult,
    DriverStatus, Extent2D, ImageDesc, ImageHandle, MemoryHandle, MemoryProperty,
    MemoryRequirements, PixelFormat, PresentMode, SemaphoreHandle, SurfaceCapabilities,
    SurfaceDevice, SurfaceFormat, SurfaceHandle, SurfaceTransform, SwapchainDesc,
    SwapchainHandle, TextureHandle,
};
use crate::descriptor::{
    DescriptorBinding, DescriptorSetBindingPoint, DescriptorSetLayoutDesc, SamplerParams,
};

fn to_raw(key: DefaultKey) -> u64 {
    key.data().as_ffi()
}

fn from_raw(raw: u64) -> DefaultKey {
    KeyData::from_ffi(raw).into()
}

// ============================================================================
// Recorded state
// ============================================================================

/// Descriptor command recorded by the mock, in submission order
#[derive(Debug, Clone, PartialEq)]
pub enum MockCommand {
    CreateDescriptorSet {
        set: DescriptorSetHandle,
        layout: DescriptorSetLayoutHandle,
    },
    DestroyDescriptorSet {
        set: DescriptorSetHandle,
    },
    UpdateBuffer {
        set: DescriptorSetHandle,
        binding: DescriptorBinding,
        buffer: BufferHandle,
        offset: u32,
        size: u32,
    },
    UpdateTexture {
        set: DescriptorSetHandle,
        binding: DescriptorBinding,
        texture: TextureHandle,
        params: SamplerParams,
    },
    BindDescriptorSet {
        set: DescriptorSetHandle,
        point: DescriptorSetBindingPoint,
        dynamic_offsets: Vec<u32>,
    },
}

#[derive(Debug, Clone, Copy)]
struct MockImage {
    desc: ImageDesc,
    memory: Option<MemoryHandle>,
    /// Owned by a swapchain (presentation engine), never destroyed directly
    presentable: bool,
}

#[derive(Debug, Clone, Copy)]
struct MockMemory {
    size: u64,
    memory_type_index: u32,
}

#[derive(Debug, Clone)]
struct MockSwapchain {
    images: Vec<ImageHandle>,
    next_index: u32,
}

struct MockState {
    images: SlotMap<DefaultKey, MockImage>,
    memory: SlotMap<DefaultKey, MockMemory>,
    semaphores: SlotMap<DefaultKey, ()>,
    swapchains: SlotMap<DefaultKey, MockSwapchain>,
    layouts: SlotMap<DefaultKey, DescriptorSetLayoutDesc>,
    descriptor_sets: SlotMap<DefaultKey, DescriptorSetLayoutHandle>,

    capabilities: SurfaceCapabilities,
    surface_formats: Vec<SurfaceFormat>,
    present_modes: Vec<PresentMode>,
    depth_formats: Vec<PixelFormat>,
    memory_types: Vec<MemoryProperty>,
    memory_type_bits: u32,

    acquire_script: VecDeque<DriverResult<DriverStatus>>,
    present_script: VecDeque<DriverResult<DriverStatus>>,
    failures: FxHashMap<String, DriverError>,

    commands: Vec<MockCommand>,
    swapchain_descs: Vec<SwapchainDesc>,
    presents: Vec<(u32, SemaphoreHandle)>,
    destroyed_surfaces: Vec<SurfaceHandle>,
    invalid_operations: Vec<String>,
    wait_idle_count: u32,
}

impl MockState {
    fn check(&self, operation: &str) -> DriverResult<()> {
        match self.failures.get(operation) {
            Some(&error) => Err(error),
            None => Ok(()),
        }
    }
}

// ============================================================================
// MockDevice
// ============================================================================

/// GPU-free implementation of [`Device`], [`SurfaceDevice`] and [`DescriptorDriver`]
pub struct MockDevice {
    state: Mutex<MockState>,
}

impl MockDevice {
    /// Mock with an 800x600 surface offering BGRA8 formats, FIFO and mailbox
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                images: SlotMap::new(),
                memory: SlotMap::new(),
                semaphores: SlotMap::new(),
                swapchains: SlotMap::new(),
                layouts: SlotMap::new(),
                descriptor_sets: SlotMap::new(),
                capabilities: SurfaceCapabilities {
                    min_image_count: 2,
                    max_image_count: 8,
                    current_extent: Extent2D::new(800, 600),
                    supported_composite_alpha: CompositeAlpha::OPAQUE | CompositeAlpha::INHERIT,
                    current_transform: SurfaceTransform::IDENTITY,
                },
                surface_formats: vec![
                    SurfaceFormat {
                        format: PixelFormat::B8G8R8A8_UNORM,
                        color_space: ColorSpace::SrgbNonlinear,
                    },
                    SurfaceFormat {
                        format: PixelFormat::B8G8R8A8_SRGB,
                        color_space: ColorSpace::SrgbNonlinear,
                    },
                ],
                present_modes: vec![PresentMode::Fifo, PresentMode::Mailbox],
                depth_formats: vec![
                    PixelFormat::D32_SFLOAT,
                    PixelFormat::D24_UNORM_S8_UINT,
                    PixelFormat::D32_SFLOAT_S8_UINT,
                ],
                memory_types: vec![
                    MemoryProperty::HOST_VISIBLE | MemoryProperty::HOST_COHERENT,
                    MemoryProperty::DEVICE_LOCAL,
                    MemoryProperty::DEVICE_LOCAL | MemoryProperty::PROTECTED,
                ],
                memory_type_bits: 0b111,
                acquire_script: VecDeque::new(),
                present_script: VecDeque::new(),
                failures: FxHashMap::default(),
                commands: Vec::new(),
                swapchain_descs: Vec::new(),
                presents: Vec::new(),
                destroyed_surfaces: Vec::new(),
                invalid_operations: Vec::new(),
                wait_idle_count: 0,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        // A panicking test must not poison the mock for its own teardown
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ===== SCRIPTING =====

    pub fn set_capabilities(&self, capabilities: SurfaceCapabilities) {
        self.state().capabilities = capabilities;
    }

    pub fn capabilities(&self) -> SurfaceCapabilities {
        self.state().capabilities
    }

    /// Change the extent the surface reports (simulates a window resize)
    pub fn set_current_extent(&self, extent: Extent2D) {
        self.state().capabilities.current_extent = extent;
    }

    pub fn set_surface_formats(&self, formats: Vec<SurfaceFormat>) {
        self.state().surface_formats = formats;
    }

    pub fn set_present_modes(&self, modes: Vec<PresentMode>) {
        self.state().present_modes = modes;
    }

    pub fn set_depth_formats(&self, formats: Vec<PixelFormat>) {
        self.state().depth_formats = formats;
    }

    pub fn set_memory_types(&self, types: Vec<MemoryProperty>) {
        self.state().memory_types = types;
    }

    /// Memory types reported as acceptable by image memory requirements
    pub fn set_memory_type_bits(&self, bits: u32) {
        self.state().memory_type_bits = bits;
    }

    /// Queue the outcome of the next `acquire_next_image` call
    pub fn script_acquire(&self, result: DriverResult<DriverStatus>) {
        self.state().acquire_script.push_back(result);
    }

    /// Queue the outcome of the next `queue_present` call
    pub fn script_present(&self, result: DriverResult<DriverStatus>) {
        self.state().present_script.push_back(result);
    }

    /// Make every call of `operation` (e.g. "vkCreateImage") fail with `error`
    pub fn fail_on(&self, operation: &str, error: DriverError) {
        self.state().failures.insert(operation.to_string(), error);
    }

    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    // ===== INSPECTION =====

    pub fn live_image_count(&self) -> usize {
        self.state().images.len()
    }

    /// Live images created through `create_image` (not owned by a swapchain)
    pub fn live_owned_image_count(&self) -> usize {
        self.state().images.values().filter(|i| !i.presentable).count()
    }

    pub fn live_memory_count(&self) -> usize {
        self.state().memory.len()
    }

    pub fn live_semaphore_count(&self) -> usize {
        self.state().semaphores.len()
    }

    pub fn live_swapchain_count(&self) -> usize {
        self.state().swapchains.len()
    }

    pub fn live_descriptor_set_count(&self) -> usize {
        self.state().descriptor_sets.len()
    }

    pub fn live_layout_count(&self) -> usize {
        self.state().layouts.len()
    }

    pub fn is_image_alive(&self, image: ImageHandle) -> bool {
        self.state().images.contains_key(from_raw(image.0))
    }

    pub fn is_memory_alive(&self, memory: MemoryHandle) -> bool {
        self.state().memory.contains_key(from_raw(memory.0))
    }

    pub fn image_desc(&self, image: ImageHandle) -> Option<ImageDesc> {
        self.state().images.get(from_raw(image.0)).map(|i| i.desc)
    }

    /// Memory bound to `image`, if any
    pub fn image_memory(&self, image: ImageHandle) -> Option<MemoryHandle> {
        self.state().images.get(from_raw(image.0)).and_then(|i| i.memory)
    }

    pub fn memory_size(&self, memory: MemoryHandle) -> Option<u64> {
        self.state().memory.get(from_raw(memory.0)).map(|m| m.size)
    }

    pub fn memory_type_index(&self, memory: MemoryHandle) -> Option<u32> {
        self.state().memory.get(from_raw(memory.0)).map(|m| m.memory_type_index)
    }

    /// Every swapchain creation request, oldest first
    pub fn swapchain_descs(&self) -> Vec<SwapchainDesc> {
        self.state().swapchain_descs.clone()
    }

    /// Every `(index, wait semaphore)` pair passed to `queue_present`
    pub fn presents(&self) -> Vec<(u32, SemaphoreHandle)> {
        self.state().presents.clone()
    }

    pub fn destroyed_surfaces(&self) -> Vec<SurfaceHandle> {
        self.state().destroyed_surfaces.clone()
    }

    /// Double frees, unknown handles and other misuse, as readable messages
    pub fn invalid_operations(&self) -> Vec<String> {
        self.state().invalid_operations.clone()
    }

    pub fn wait_idle_count(&self) -> u32 {
        self.state().wait_idle_count
    }

    pub fn commands(&self) -> Vec<MockCommand> {
        self.state().commands.clone()
    }

    /// Update commands (buffer or texture) only
    pub fn update_commands(&self) -> Vec<MockCommand> {
        self.state()
            .commands
            .iter()
            .filter(|c| matches!(c, MockCommand::UpdateBuffer { .. } | MockCommand::UpdateTexture { .. }))
            .cloned()
            .collect()
    }

    pub fn clear_commands(&self) {
        self.state().commands.clear();
    }
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Device
// ============================================================================

impl Device for MockDevice {
    fn create_image(&self, desc: &ImageDesc) -> DriverResult<ImageHandle> {
        let mut state = self.state();
        state.check("vkCreateImage")?;
        let key = state.images.insert(MockImage { desc: *desc, memory: None, presentable: false });
        Ok(ImageHandle(to_raw(key)))
    }

    fn image_memory_requirements(&self, image: ImageHandle) -> MemoryRequirements {
        let state = self.state();
        let size = state
            .images
            .get(from_raw(image.0))
            .map(|i| {
                let d = &i.desc;
                d.extent.width as u64 * d.extent.height as u64 * d.format.bytes_per_pixel() as u64
            })
            .unwrap_or(0);
        MemoryRequirements { size, alignment: 256, memory_type_bits: state.memory_type_bits }
    }

    fn memory_types(&self) -> Vec<MemoryProperty> {
        self.state().memory_types.clone()
    }

    fn allocate_memory(&self, size: u64, memory_type_index: u32) -> DriverResult<MemoryHandle> {
        let mut state = self.state();
        state.check("vkAllocateMemory")?;
        if memory_type_index as usize >= state.memory_types.len() {
            return Err(DriverError::ERROR_OUT_OF_DEVICE_MEMORY);
        }
        let key = state.memory.insert(MockMemory { size, memory_type_index });
        Ok(MemoryHandle(to_raw(key)))
    }

    fn bind_image_memory(&self, image: ImageHandle, memory: MemoryHandle) -> DriverResult<()> {
        let mut state = self.state();
        state.check("vkBindImageMemory")?;
        if !state.memory.contains_key(from_raw(memory.0)) {
            return Err(DriverError::ERROR_OUT_OF_DEVICE_MEMORY);
        }
        match state.images.get_mut(from_raw(image.0)) {
            Some(img) if img.memory.is_none() => {
                img.memory = Some(memory);
                Ok(())
            }
            _ => Err(DriverError::ERROR_INITIALIZATION_FAILED),
        }
    }

    fn destroy_image(&self, image: ImageHandle) {
        let mut state = self.state();
        let key = from_raw(image.0);
        match state.images.get(key) {
            Some(img) if img.presentable => state
                .invalid_operations
                .push(format!("destroy_image on presentable image {:?}", image)),
            Some(_) => {
                state.images.remove(key);
            }
            None => state.invalid_operations.push(format!("destroy_image on dead {:?}", image)),
        }
    }

    fn free_memory(&self, memory: MemoryHandle) {
        let mut state = self.state();
        let bound = state.images.values().any(|i| i.memory == Some(memory));
        if bound {
            state.invalid_operations.push(format!("free_memory on bound {:?}", memory));
        }
        if state.memory.remove(from_raw(memory.0)).is_none() {
            state.invalid_operations.push(format!("free_memory on dead {:?}", memory));
        }
    }

    fn create_semaphore(&self) -> DriverResult<SemaphoreHandle> {
        let mut state = self.state();
        state.check("vkCreateSemaphore")?;
        Ok(SemaphoreHandle(to_raw(state.semaphores.insert(()))))
    }

    fn destroy_semaphore(&self, semaphore: SemaphoreHandle) {
        let mut state = self.state();
        if state.semaphores.remove(from_raw(semaphore.0)).is_none() {
            state.invalid_operations.push(format!("destroy_semaphore on dead {:?}", semaphore));
        }
    }

    fn queue_wait_idle(&self) -> DriverResult<()> {
        let mut state = self.state();
        state.wait_idle_count += 1;
        state.check("vkQueueWaitIdle")
    }

    fn depth_stencil_formats(&self) -> Vec<PixelFormat> {
        self.state().depth_formats.clone()
    }
}

// ============================================================================
// SurfaceDevice
// ============================================================================

impl SurfaceDevice for MockDevice {
    fn surface_capabilities(&self, _surface: SurfaceHandle) -> DriverResult<SurfaceCapabilities> {
        let state = self.state();
        state.check("vkGetPhysicalDeviceSurfaceCapabilitiesKHR")?;
        Ok(state.capabilities)
    }

    fn surface_formats(&self, _surface: SurfaceHandle) -> DriverResult<Vec<SurfaceFormat>> {
        let state = self.state();
        state.check("vkGetPhysicalDeviceSurfaceFormatsKHR")?;
        Ok(state.surface_formats.clone())
    }

    fn surface_present_modes(&self, _surface: SurfaceHandle) -> DriverResult<Vec<PresentMode>> {
        let state = self.state();
        state.check("vkGetPhysicalDeviceSurfacePresentModesKHR")?;
        Ok(state.present_modes.clone())
    }

    fn create_swapchain(&self, desc: &SwapchainDesc) -> DriverResult<SwapchainHandle> {
        let mut state = self.state();
        state.check("vkCreateSwapchainKHR")?;
        state.swapchain_descs.push(*desc);

        let image_desc = ImageDesc {
            extent: desc.extent,
            format: desc.format,
            usage: desc.usage,
            protected: desc.protected,
        };
        let images = (0..desc.min_image_count)
            .map(|_| {
                let key = state.images.insert(MockImage {
                    desc: image_desc,
                    memory: None,
                    presentable: true,
                });
                ImageHandle(to_raw(key))
            })
            .collect();
        let key = state.swapchains.insert(MockSwapchain { images, next_index: 0 });
        Ok(SwapchainHandle(to_raw(key)))
    }

    fn swapchain_images(&self, swapchain: SwapchainHandle) -> DriverResult<Vec<ImageHandle>> {
        let state = self.state();
        state.check("vkGetSwapchainImagesKHR")?;
        state
            .swapchains
            .get(from_raw(swapchain.0))
            .map(|s| s.images.clone())
            .ok_or(DriverError::ERROR_SURFACE_LOST)
    }

    fn acquire_next_image(
        &self,
        swapchain: SwapchainHandle,
        _timeout_ns: u64,
        semaphore: SemaphoreHandle,
    ) -> DriverResult<(u32, DriverStatus)> {
        let mut state = self.state();
        state.check("vkAcquireNextImageKHR")?;
        if !state.semaphores.contains_key(from_raw(semaphore.0)) {
            state.invalid_operations.push(format!("acquire with dead {:?}", semaphore));
        }
        let status = state.acquire_script.pop_front().unwrap_or(Ok(DriverStatus::Success))?;
        let chain = state
            .swapchains
            .get_mut(from_raw(swapchain.0))
            .ok_or(DriverError::ERROR_SURFACE_LOST)?;
        let index = chain.next_index;
        chain.next_index = (index + 1) % chain.images.len().max(1) as u32;
        Ok((index, status))
    }

    fn queue_present(
        &self,
        swapchain: SwapchainHandle,
        index: u32,
        wait_semaphore: SemaphoreHandle,
    ) -> DriverResult<DriverStatus> {
        let mut state = self.state();
        state.check("vkQueuePresentKHR")?;
        let image_count = match state.swapchains.get(from_raw(swapchain.0)) {
            Some(chain) => chain.images.len() as u32,
            None => return Err(DriverError::ERROR_SURFACE_LOST),
        };
        if index >= image_count {
            state.invalid_operations.push(format!("present of out-of-range index {}", index));
        }
        state.presents.push((index, wait_semaphore));
        state.present_script.pop_front().unwrap_or(Ok(DriverStatus::Success))
    }

    fn destroy_swapchain(&self, swapchain: SwapchainHandle) {
        let mut state = self.state();
        match state.swapchains.remove(from_raw(swapchain.0)) {
            Some(chain) => {
                for image in chain.images {
                    state.images.remove(from_raw(image.0));
                }
            }
            None => state
                .invalid_operations
                .push(format!("destroy_swapchain on dead {:?}", swapchain)),
        }
    }

    fn destroy_surface(&self, surface: SurfaceHandle) {
        let mut state = self.state();
        if state.destroyed_surfaces.contains(&surface) {
            state.invalid_operations.push(format!("destroy_surface twice on {:?}", surface));
        }
        state.destroyed_surfaces.push(surface);
    }
}

// ============================================================================
// DescriptorDriver
// ============================================================================

impl DescriptorDriver for MockDevice {
    fn create_descriptor_set_layout(
        &self,
        desc: &DescriptorSetLayoutDesc,
    ) -> DriverResult<DescriptorSetLayoutHandle> {
        let mut state = self.state();
        state.check("vkCreateDescriptorSetLayout")?;
        Ok(DescriptorSetLayoutHandle(to_raw(state.layouts.insert(desc.clone()))))
    }

    fn destroy_descriptor_set_layout(&self, layout: DescriptorSetLayoutHandle) {
        let mut state = self.state();
        if state.layouts.remove(from_raw(layout.0)).is_none() {
            state.invalid_operations.push(format!("destroy_layout on dead {:?}", layout));
        }
    }

    fn create_descriptor_set(
        &self,
        layout: DescriptorSetLayoutHandle,
    ) -> DriverResult<DescriptorSetHandle> {
        let mut state = self.state();
        state.check("vkAllocateDescriptorSets")?;
        if !state.layouts.contains_key(from_raw(layout.0)) {
            return Err(DriverError::ERROR_INITIALIZATION_FAILED);
        }
        let set = DescriptorSetHandle(to_raw(state.descriptor_sets.insert(layout)));
        state.commands.push(MockCommand::CreateDescriptorSet { set, layout });
        Ok(set)
    }

    fn destroy_descriptor_set(&self, set: DescriptorSetHandle) {
        let mut state = self.state();
        if state.descriptor_sets.remove(from_raw(set.0)).is_none() {
            state.invalid_operations.push(format!("destroy_descriptor_set on dead {:?}", set));
        }
        state.commands.push(MockCommand::DestroyDescriptorSet { set });
    }

    fn update_descriptor_set_buffer(
        &self,
        set: DescriptorSetHandle,
        binding: DescriptorBinding,
        buffer: BufferHandle,
        offset: u32,
        size: u32,
    ) {
        self.state()
            .commands
            .push(MockCommand::UpdateBuffer { set, binding, buffer, offset, size });
    }

    fn update_descriptor_set_texture(
        &self,
        set: DescriptorSetHandle,
        binding: DescriptorBinding,
        texture: TextureHandle,
        params: SamplerParams,
    ) {
        self.state()
            .commands
            .push(MockCommand::UpdateTexture { set, binding, texture, params });
    }

    fn bind_descriptor_set(
        &self,
        set: DescriptorSetHandle,
        point: DescriptorSetBindingPoint,
        dynamic_offsets: &[u32],
    ) {
        self.state().commands.push(MockCommand::BindDescriptorSet {
            set,
            point,
            dynamic_offsets: dynamic_offsets.to_vec(),
        });
    }
}

/// Memory type the mock would pick for `required` given its current tables
pub fn expected_memory_type(device: &MockDevice, required: MemoryProperty) -> Option<u32> {
    let state = device.state();
    select_memory_type(&state.memory_types, state.memory_type_bits, required)
}

#[cfg(test)]
#[path = "mock_device_tests.rs"]
mod tests;
