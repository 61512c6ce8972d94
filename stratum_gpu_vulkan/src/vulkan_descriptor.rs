/// Descriptor driver on top of Vulkan descriptor pools
///
/// Sets are allocated from a growable list of pools: when the newest pool is
/// exhausted a new one is created and the allocation retried. Binding is
/// deferred. `bind_descriptor_set` only records the set and its dynamic
/// offsets per binding point, and `VulkanContext::flush_descriptor_bindings`
/// emits the `vkCmdBindDescriptorSets` calls for the points that changed.

use ash::vk;
use ash::vk::Handle;
use rustc_hash::FxHashMap;
use stratum_gpu::stratum::descriptor::{
    DescriptorBinding, DescriptorSetBindingPoint, DescriptorSetLayoutDesc, SamplerParams,
    MAX_DESCRIPTOR_SET_COUNT,
};
use stratum_gpu::stratum::device::{
    BufferHandle, DescriptorDriver, DescriptorSetHandle, DescriptorSetLayoutHandle, DriverResult,
    TextureHandle,
};
use stratum_gpu::stratum::Bitset64;
use stratum_gpu::{engine_info, engine_warn};
use crate::vulkan_context::VulkanContext;
use crate::vulkan_format::{descriptor_type_to_vk, driver_error, shader_stages_to_vk};

const SOURCE: &str = "stratum::vulkan";

// ============================================================================
// Bookkeeping
// ============================================================================

/// Set recorded at one binding point
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PendingBinding {
    pub set_index: u32,
    pub set: vk::DescriptorSet,
    pub dynamic_offsets: Vec<u32>,
}

/// Sets recorded per binding point, waiting for a command buffer
#[derive(Debug, Default)]
pub(crate) struct BoundDescriptorSets {
    sets: [vk::DescriptorSet; MAX_DESCRIPTOR_SET_COUNT],
    offsets: [Vec<u32>; MAX_DESCRIPTOR_SET_COUNT],
    dirty: Bitset64,
    pipeline_layout: vk::PipelineLayout,
}

impl BoundDescriptorSets {
    pub(crate) fn record(&mut self, index: usize, set: vk::DescriptorSet, dynamic_offsets: &[u32]) {
        if self.sets[index] == set && self.offsets[index] == dynamic_offsets {
            return;
        }
        self.sets[index] = set;
        self.offsets[index] = dynamic_offsets.to_vec();
        self.dirty.set(index);
    }

    /// Unbind every point holding `set`
    pub(crate) fn forget(&mut self, set: vk::DescriptorSet) {
        for index in 0..MAX_DESCRIPTOR_SET_COUNT {
            if self.sets[index] == set {
                self.sets[index] = vk::DescriptorSet::null();
                self.offsets[index].clear();
                self.dirty.unset(index);
            }
        }
    }

    /// Drain the bindings to emit for `pipeline_layout`
    ///
    /// A pipeline layout change invalidates every bound point. Unbound
    /// points are dropped from the pending list.
    pub(crate) fn take_pending(&mut self, pipeline_layout: vk::PipelineLayout) -> Vec<PendingBinding> {
        if self.pipeline_layout != pipeline_layout {
            self.pipeline_layout = pipeline_layout;
            for index in 0..MAX_DESCRIPTOR_SET_COUNT {
                if self.sets[index] != vk::DescriptorSet::null() {
                    self.dirty.set(index);
                }
            }
        }

        let pending = self
            .dirty
            .iter()
            .filter(|&index| self.sets[index] != vk::DescriptorSet::null())
            .map(|index| PendingBinding {
                set_index: index as u32,
                set: self.sets[index],
                dynamic_offsets: self.offsets[index].clone(),
            })
            .collect();
        self.dirty.clear();
        pending
    }
}

#[derive(Debug, Clone, Copy)]
struct AllocatedSet {
    pool: vk::DescriptorPool,
    layout: vk::DescriptorSetLayout,
}

/// Pools, layout binding types and live sets of a context
pub(crate) struct DescriptorState {
    pools: Vec<vk::DescriptorPool>,
    max_sets: u32,
    /// Native descriptor type per binding index
    layouts: FxHashMap<vk::DescriptorSetLayout, FxHashMap<DescriptorBinding, vk::DescriptorType>>,
    sets: FxHashMap<vk::DescriptorSet, AllocatedSet>,
    pub(crate) bound: BoundDescriptorSets,
}

impl DescriptorState {
    /// Pools are created on first allocation
    pub(crate) fn new(max_sets: u32) -> Self {
        Self {
            pools: Vec::new(),
            max_sets: max_sets.max(1),
            layouts: FxHashMap::default(),
            sets: FxHashMap::default(),
            bound: BoundDescriptorSets::default(),
        }
    }

    pub(crate) fn pool_count(&self) -> usize {
        self.pools.len()
    }

    pub(crate) fn live_set_count(&self) -> usize {
        self.sets.len()
    }

    fn binding_type(&self, set: vk::DescriptorSet, binding: DescriptorBinding) -> Option<vk::DescriptorType> {
        let allocated = self.sets.get(&set)?;
        self.layouts.get(&allocated.layout)?.get(&binding).copied()
    }

    /// Destroy every pool and tracked layout. Must run while the device is alive.
    pub(crate) fn shutdown(&mut self, device: &ash::Device) {
        if !self.sets.is_empty() {
            engine_warn!(SOURCE, "{} descriptor sets still allocated at shutdown", self.sets.len());
        }
        unsafe {
            for pool in self.pools.drain(..) {
                device.destroy_descriptor_pool(pool, None);
            }
            for (layout, _) in self.layouts.drain() {
                device.destroy_descriptor_set_layout(layout, None);
            }
        }
        self.sets.clear();
        self.bound = BoundDescriptorSets::default();
    }
}

/// Create a pool sized for `max_sets` sets of mixed buffers and samplers
fn create_descriptor_pool(device: &ash::Device, max_sets: u32) -> DriverResult<vk::DescriptorPool> {
    let pool_sizes = [
        vk::DescriptorPoolSize { ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER, descriptor_count: max_sets * 2 },
        vk::DescriptorPoolSize { ty: vk::DescriptorType::UNIFORM_BUFFER, descriptor_count: max_sets },
        vk::DescriptorPoolSize { ty: vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC, descriptor_count: max_sets },
        vk::DescriptorPoolSize { ty: vk::DescriptorType::STORAGE_BUFFER, descriptor_count: max_sets },
        vk::DescriptorPoolSize { ty: vk::DescriptorType::STORAGE_BUFFER_DYNAMIC, descriptor_count: max_sets / 4 + 1 },
        vk::DescriptorPoolSize { ty: vk::DescriptorType::INPUT_ATTACHMENT, descriptor_count: max_sets / 4 + 1 },
    ];
    let info = vk::DescriptorPoolCreateInfo::default()
        .flags(vk::DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET)
        .pool_sizes(&pool_sizes)
        .max_sets(max_sets);

    unsafe { device.create_descriptor_pool(&info, None) }.map_err(driver_error)
}

fn allocate_from(
    device: &ash::Device,
    pool: vk::DescriptorPool,
    layout: vk::DescriptorSetLayout,
) -> std::result::Result<vk::DescriptorSet, vk::Result> {
    let layouts = [layout];
    let info = vk::DescriptorSetAllocateInfo::default()
        .descriptor_pool(pool)
        .set_layouts(&layouts);
    let sets = unsafe { device.allocate_descriptor_sets(&info) }?;
    sets.first().copied().ok_or(vk::Result::ERROR_UNKNOWN)
}

// ============================================================================
// DescriptorDriver
// ============================================================================

impl DescriptorDriver for VulkanContext {
    fn create_descriptor_set_layout(
        &self,
        desc: &DescriptorSetLayoutDesc,
    ) -> DriverResult<DescriptorSetLayoutHandle> {
        let bindings: Vec<vk::DescriptorSetLayoutBinding> = desc
            .bindings
            .iter()
            .map(|b| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(b.binding as u32)
                    .descriptor_type(descriptor_type_to_vk(b))
                    .descriptor_count(b.count as u32)
                    .stage_flags(shader_stages_to_vk(b.stage_flags))
            })
            .collect();
        let info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);

        let layout = unsafe { self.device().create_descriptor_set_layout(&info, None) }
            .map_err(driver_error)?;

        let types = desc
            .bindings
            .iter()
            .map(|b| (b.binding, descriptor_type_to_vk(b)))
            .collect();
        self.descriptors().layouts.insert(layout, types);

        Ok(DescriptorSetLayoutHandle::from_raw(layout.as_raw()))
    }

    fn destroy_descriptor_set_layout(&self, layout: DescriptorSetLayoutHandle) {
        let layout = vk::DescriptorSetLayout::from_raw(layout.as_raw());
        self.descriptors().layouts.remove(&layout);
        unsafe { self.device().destroy_descriptor_set_layout(layout, None) };
    }

    fn create_descriptor_set(
        &self,
        layout: DescriptorSetLayoutHandle,
    ) -> DriverResult<DescriptorSetHandle> {
        let layout = vk::DescriptorSetLayout::from_raw(layout.as_raw());
        let device = self.device();
        let mut state = self.descriptors();

        let newest = match state.pools.last() {
            Some(&pool) => pool,
            None => {
                let pool = create_descriptor_pool(device, state.max_sets)?;
                state.pools.push(pool);
                engine_info!(SOURCE, "Created descriptor pool ({} sets)", state.max_sets);
                pool
            }
        };
        let (set, pool) = match allocate_from(device, newest, layout) {
            Ok(set) => (set, newest),
            Err(vk::Result::ERROR_OUT_OF_POOL_MEMORY) | Err(vk::Result::ERROR_FRAGMENTED_POOL) => {
                let pool = create_descriptor_pool(device, state.max_sets)?;
                state.pools.push(pool);
                engine_info!(SOURCE, "Descriptor pool exhausted, created new pool (total: {})", state.pools.len());
                (allocate_from(device, pool, layout).map_err(driver_error)?, pool)
            }
            Err(e) => return Err(driver_error(e)),
        };

        state.sets.insert(set, AllocatedSet { pool, layout });
        Ok(DescriptorSetHandle::from_raw(set.as_raw()))
    }

    fn destroy_descriptor_set(&self, set: DescriptorSetHandle) {
        let set = vk::DescriptorSet::from_raw(set.as_raw());
        let mut state = self.descriptors();
        state.bound.forget(set);
        let Some(allocated) = state.sets.remove(&set) else {
            engine_warn!(SOURCE, "destroy_descriptor_set: unknown set {:?}", set);
            return;
        };
        if let Err(e) = unsafe { self.device().free_descriptor_sets(allocated.pool, &[set]) } {
            engine_warn!(SOURCE, "vkFreeDescriptorSets failed. error={}", e.as_raw());
        }
    }

    fn update_descriptor_set_buffer(
        &self,
        set: DescriptorSetHandle,
        binding: DescriptorBinding,
        buffer: BufferHandle,
        offset: u32,
        size: u32,
    ) {
        let set = vk::DescriptorSet::from_raw(set.as_raw());
        let Some(descriptor_type) = self.descriptors().binding_type(set, binding) else {
            engine_warn!(SOURCE, "Buffer update for unknown binding {} of set {:?}", binding, set);
            return;
        };

        let range = if size == 0 { vk::WHOLE_SIZE } else { size as u64 };
        let buffer_info = [vk::DescriptorBufferInfo::default()
            .buffer(vk::Buffer::from_raw(buffer.as_raw()))
            .offset(offset as u64)
            .range(range)];
        let write = vk::WriteDescriptorSet::default()
            .dst_set(set)
            .dst_binding(binding as u32)
            .descriptor_type(descriptor_type)
            .buffer_info(&buffer_info);

        unsafe { self.device().update_descriptor_sets(&[write], &[]) };
    }

    fn update_descriptor_set_texture(
        &self,
        set: DescriptorSetHandle,
        binding: DescriptorBinding,
        texture: TextureHandle,
        params: SamplerParams,
    ) {
        let set = vk::DescriptorSet::from_raw(set.as_raw());
        let Some(descriptor_type) = self.descriptors().binding_type(set, binding) else {
            engine_warn!(SOURCE, "Texture update for unknown binding {} of set {:?}", binding, set);
            return;
        };
        // Failure already logged by the cache
        let Ok(sampler) = self.samplers().get(self.device(), params) else {
            return;
        };

        let image_info = [vk::DescriptorImageInfo::default()
            .sampler(sampler)
            .image_view(vk::ImageView::from_raw(texture.as_raw()))
            .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)];
        let write = vk::WriteDescriptorSet::default()
            .dst_set(set)
            .dst_binding(binding as u32)
            .descriptor_type(descriptor_type)
            .image_info(&image_info);

        unsafe { self.device().update_descriptor_sets(&[write], &[]) };
    }

    fn bind_descriptor_set(
        &self,
        set: DescriptorSetHandle,
        point: DescriptorSetBindingPoint,
        dynamic_offsets: &[u32],
    ) {
        let set = vk::DescriptorSet::from_raw(set.as_raw());
        self.descriptors()
            .bound
            .record(point.index() as usize, set, dynamic_offsets);
    }
}

impl VulkanContext {
    /// Emit `vkCmdBindDescriptorSets` for every binding point changed since the last flush
    ///
    /// Switching to a different pipeline layout rebinds every bound point.
    /// Returns the number of sets bound.
    pub fn flush_descriptor_bindings(
        &self,
        command_buffer: vk::CommandBuffer,
        pipeline_layout: vk::PipelineLayout,
    ) -> usize {
        let pending = self.descriptors().bound.take_pending(pipeline_layout);
        for binding in &pending {
            unsafe {
                self.device().cmd_bind_descriptor_sets(
                    command_buffer,
                    vk::PipelineBindPoint::GRAPHICS,
                    pipeline_layout,
                    binding.set_index,
                    &[binding.set],
                    &binding.dynamic_offsets,
                );
            }
        }
        pending.len()
    }

    /// Number of descriptor pools created so far
    pub fn descriptor_pool_count(&self) -> usize {
        self.descriptors().pool_count()
    }

    /// Descriptor sets allocated and not yet destroyed
    pub fn live_descriptor_set_count(&self) -> usize {
        self.descriptors().live_set_count()
    }
}

#[cfg(test)]
#[path = "vulkan_descriptor_tests.rs"]
mod tests;
