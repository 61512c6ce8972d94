/// Descriptor set layout: the immutable binding declaration shared by sets

use std::sync::atomic::{AtomicBool, Ordering};
use bitflags::bitflags;
use crate::device::{DescriptorDriver, DescriptorSetLayoutHandle};
use crate::descriptor::{SamplerFormat, SamplerType};
use crate::error::Result;
use crate::utils::Bitset64;
use crate::{engine_driver_err, engine_precondition_err, engine_warn};

/// Binding index within a descriptor set
pub type DescriptorBinding = u8;

/// Maximum number of bindings a layout may declare (one per dirty/valid bit)
pub const MAX_DESCRIPTOR_BINDINGS: usize = 64;

/// Number of descriptor set binding points
pub const MAX_DESCRIPTOR_SET_COUNT: usize = 4;

const SOURCE: &str = "stratum::DescriptorSetLayout";

// ============================================================================
// Binding declarations
// ============================================================================

/// Resource kind a binding expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorType {
    UniformBuffer,
    ShaderStorageBuffer,
    /// Combined texture + sampler of the given dimensionality and data type
    Sampler { sampler: SamplerType, format: SamplerFormat },
    InputAttachment,
}

impl DescriptorType {
    pub fn is_buffer(self) -> bool {
        matches!(self, DescriptorType::UniformBuffer | DescriptorType::ShaderStorageBuffer)
    }

    pub fn is_sampler(self) -> bool {
        matches!(self, DescriptorType::Sampler { .. })
    }
}

bitflags! {
    /// Shader stages that can see a binding
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStageFlags: u8 {
        const VERTEX = 0x01;
        const FRAGMENT = 0x02;
        const COMPUTE = 0x04;
        const VERTEX_FRAGMENT = Self::VERTEX.bits() | Self::FRAGMENT.bits();
    }
}

bitflags! {
    /// Per-binding options
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DescriptorFlags: u8 {
        /// Buffer offset supplied at bind time
        const DYNAMIC_OFFSET = 0x01;
        /// Sampler reads a texture that cannot be filtered
        const UNFILTERABLE = 0x02;
    }
}

/// Declaration of one binding slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorSetLayoutBinding {
    pub binding: DescriptorBinding,
    pub descriptor_type: DescriptorType,
    pub stage_flags: ShaderStageFlags,
    pub flags: DescriptorFlags,
    /// Array size (1 for non-array bindings)
    pub count: u16,
}

impl DescriptorSetLayoutBinding {
    pub fn uniform_buffer(binding: DescriptorBinding, stage_flags: ShaderStageFlags) -> Self {
        Self {
            binding,
            descriptor_type: DescriptorType::UniformBuffer,
            stage_flags,
            flags: DescriptorFlags::empty(),
            count: 1,
        }
    }

    pub fn storage_buffer(binding: DescriptorBinding, stage_flags: ShaderStageFlags) -> Self {
        Self {
            descriptor_type: DescriptorType::ShaderStorageBuffer,
            ..Self::uniform_buffer(binding, stage_flags)
        }
    }

    pub fn sampler(
        binding: DescriptorBinding,
        sampler: SamplerType,
        format: SamplerFormat,
        stage_flags: ShaderStageFlags,
    ) -> Self {
        Self {
            descriptor_type: DescriptorType::Sampler { sampler, format },
            ..Self::uniform_buffer(binding, stage_flags)
        }
    }

    pub fn with_flags(mut self, flags: DescriptorFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn has_dynamic_offset(&self) -> bool {
        self.flags.contains(DescriptorFlags::DYNAMIC_OFFSET)
    }
}

/// Blueprint a backend turns into a native layout object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorSetLayoutDesc {
    pub bindings: Vec<DescriptorSetLayoutBinding>,
}

// ============================================================================
// DescriptorSetLayout
// ============================================================================

/// Immutable layout shared (through `Arc`) by every descriptor set built on it
#[derive(Debug)]
pub struct DescriptorSetLayout {
    handle: DescriptorSetLayoutHandle,
    /// Sorted by binding index
    bindings: Vec<DescriptorSetLayoutBinding>,
    valid: Bitset64,
    samplers: Bitset64,
    buffers: Bitset64,
    dynamic_offset_count: usize,
    terminated: AtomicBool,
}

impl DescriptorSetLayout {
    /// Validate `desc` and create the backend layout object
    ///
    /// Binding indices must be unique and below [`MAX_DESCRIPTOR_BINDINGS`].
    pub fn new(driver: &dyn DescriptorDriver, desc: DescriptorSetLayoutDesc) -> Result<Self> {
        let mut bindings = desc.bindings;
        bindings.sort_by_key(|b| b.binding);

        let mut valid = Bitset64::new();
        let mut samplers = Bitset64::new();
        let mut buffers = Bitset64::new();
        let mut dynamic_offset_count = 0;

        for entry in &bindings {
            let index = entry.binding as usize;
            if index >= MAX_DESCRIPTOR_BINDINGS {
                return Err(engine_precondition_err!(
                    SOURCE,
                    "binding {} exceeds the maximum of {} bindings",
                    index,
                    MAX_DESCRIPTOR_BINDINGS
                ));
            }
            if valid.test(index) {
                return Err(engine_precondition_err!(
                    SOURCE,
                    "binding {} declared more than once",
                    index
                ));
            }
            valid.set(index);
            if entry.descriptor_type.is_sampler() {
                samplers.set(index);
            }
            if entry.descriptor_type.is_buffer() {
                buffers.set(index);
                if entry.has_dynamic_offset() {
                    dynamic_offset_count += 1;
                }
            }
        }

        let native_desc = DescriptorSetLayoutDesc { bindings };
        let handle = driver
            .create_descriptor_set_layout(&native_desc)
            .map_err(|e| engine_driver_err!(SOURCE, "createDescriptorSetLayout", e))?;

        Ok(Self {
            handle,
            bindings: native_desc.bindings,
            valid,
            samplers,
            buffers,
            dynamic_offset_count,
            terminated: AtomicBool::new(false),
        })
    }

    pub fn handle(&self) -> DescriptorSetLayoutHandle {
        self.handle
    }

    pub fn bindings(&self) -> &[DescriptorSetLayoutBinding] {
        &self.bindings
    }

    /// Declaration of `binding`, if the layout has one
    pub fn binding(&self, binding: DescriptorBinding) -> Option<&DescriptorSetLayoutBinding> {
        if !self.valid.test(binding as usize) {
            return None;
        }
        self.bindings
            .binary_search_by_key(&binding, |b| b.binding)
            .ok()
            .map(|i| &self.bindings[i])
    }

    pub fn descriptor_type(&self, binding: DescriptorBinding) -> Option<DescriptorType> {
        self.binding(binding).map(|b| b.descriptor_type)
    }

    /// Bindings declared by this layout
    pub fn valid_descriptors(&self) -> Bitset64 {
        self.valid
    }

    pub fn sampler_descriptors(&self) -> Bitset64 {
        self.samplers
    }

    pub fn buffer_descriptors(&self) -> Bitset64 {
        self.buffers
    }

    pub fn is_sampler(&self, binding: DescriptorBinding) -> bool {
        self.samplers.test(binding as usize)
    }

    /// Number of offsets `bind` must supply
    pub fn dynamic_offset_count(&self) -> usize {
        self.dynamic_offset_count
    }

    /// Highest declared binding index, or `None` for an empty layout
    pub fn max_binding(&self) -> Option<DescriptorBinding> {
        self.bindings.last().map(|b| b.binding)
    }

    /// Release the backend layout object (subsequent calls are no-ops)
    pub fn terminate(&self, driver: &dyn DescriptorDriver) {
        if !self.terminated.swap(true, Ordering::AcqRel) {
            driver.destroy_descriptor_set_layout(self.handle);
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        if !self.is_terminated() {
            engine_warn!(SOURCE, "layout {:?} dropped without terminate()", self.handle);
        }
    }
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;
