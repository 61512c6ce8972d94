/// DescriptorSet: per-material-instance binding table with lazy commit
///
/// Writes land in a CPU-side slot table and mark the binding dirty. Nothing
/// reaches the backend until `commit`, which pushes only the dirty slots in
/// ascending binding order. The set never synchronizes with the GPU: callers
/// must not modify a set that is bound to in-flight work.

use crate::device::{BufferHandle, DescriptorDriver, DescriptorSetHandle, DescriptorSetLayoutHandle, TextureHandle};
use crate::descriptor::{DescriptorBinding, DescriptorSetLayout, SamplerParams};
use crate::error::Result;
use crate::utils::Bitset64;
use crate::{
    engine_driver_err, engine_error, engine_precondition, engine_precondition_err, engine_trace,
    engine_warn,
};

const SOURCE: &str = "stratum::DescriptorSet";

/// Abstract slot a descriptor set is bound to
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorSetBindingPoint {
    PerView = 0,
    PerRenderable = 1,
    PerMaterial = 2,
}

impl DescriptorSetBindingPoint {
    pub const ALL: [DescriptorSetBindingPoint; 3] = [
        DescriptorSetBindingPoint::PerView,
        DescriptorSetBindingPoint::PerRenderable,
        DescriptorSetBindingPoint::PerMaterial,
    ];

    /// Set index used in shaders
    pub fn index(self) -> u32 {
        self as u32
    }
}

/// Contents of one binding slot
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Descriptor {
    #[default]
    Empty,
    Buffer {
        buffer: BufferHandle,
        offset: u32,
        size: u32,
    },
    Sampler {
        texture: TextureHandle,
        params: SamplerParams,
    },
}

/// Table of resource bindings validated against a shared layout
#[derive(Debug)]
pub struct DescriptorSet {
    name: String,
    layout: DescriptorSetLayoutHandle,
    /// One slot per binding index up to the layout's highest binding
    descriptors: Vec<Descriptor>,
    dirty: Bitset64,
    valid: Bitset64,
    handle: DescriptorSetHandle,
    committed: bool,
    terminated: bool,
    set_after_commit_warning: bool,
    set_undefined_parameter_warning: bool,
}

impl DescriptorSet {
    /// Allocate the backend set for `layout`
    pub fn new(
        name: &str,
        layout: &DescriptorSetLayout,
        driver: &dyn DescriptorDriver,
    ) -> Result<Self> {
        let handle = driver
            .create_descriptor_set(layout.handle())
            .map_err(|e| engine_driver_err!(SOURCE, "createDescriptorSet", e))?;

        let slot_count = layout.max_binding().map_or(0, |b| b as usize + 1);
        engine_trace!(SOURCE, "'{}' created with {} slots ({:?})", name, slot_count, handle);

        Ok(Self {
            name: name.to_string(),
            layout: layout.handle(),
            descriptors: vec![Descriptor::Empty; slot_count],
            dirty: Bitset64::new(),
            valid: Bitset64::new(),
            handle,
            committed: false,
            terminated: false,
            set_after_commit_warning: false,
            set_undefined_parameter_warning: false,
        })
    }

    // ===== WRITES =====

    /// Point a uniform/storage buffer binding at `[offset, offset + size)` of `buffer`
    pub fn set_buffer(
        &mut self,
        layout: &DescriptorSetLayout,
        binding: DescriptorBinding,
        buffer: BufferHandle,
        offset: u32,
        size: u32,
    ) -> Result<()> {
        if layout.handle() != self.layout {
            engine_precondition!(
                SOURCE,
                "'{}' was created with layout {:?} but used with {:?}",
                self.name,
                self.layout,
                layout.handle()
            );
        }
        match layout.descriptor_type(binding) {
            None => engine_precondition!(
                SOURCE,
                "'{}': binding {} does not exist in the layout",
                self.name,
                binding
            ),
            Some(ty) if !ty.is_buffer() => engine_precondition!(
                SOURCE,
                "'{}': binding {} is {:?}, not a buffer",
                self.name,
                binding,
                ty
            ),
            Some(_) => {}
        }
        self.write(binding, Descriptor::Buffer { buffer, offset, size });
        Ok(())
    }

    /// Point a sampler binding at `texture` sampled with `params`
    pub fn set_sampler(
        &mut self,
        layout: &DescriptorSetLayout,
        binding: DescriptorBinding,
        texture: TextureHandle,
        params: SamplerParams,
    ) -> Result<()> {
        if layout.handle() != self.layout {
            engine_precondition!(
                SOURCE,
                "'{}' was created with layout {:?} but used with {:?}",
                self.name,
                self.layout,
                layout.handle()
            );
        }
        match layout.descriptor_type(binding) {
            None => engine_precondition!(
                SOURCE,
                "'{}': binding {} does not exist in the layout",
                self.name,
                binding
            ),
            Some(ty) if !ty.is_sampler() => engine_precondition!(
                SOURCE,
                "'{}': binding {} is {:?}, not a sampler",
                self.name,
                binding,
                ty
            ),
            Some(_) => {}
        }
        self.write(binding, Descriptor::Sampler { texture, params });
        Ok(())
    }

    fn write(&mut self, binding: DescriptorBinding, descriptor: Descriptor) {
        let index = binding as usize;
        if self.committed && !self.dirty.test(index) && !self.set_after_commit_warning {
            self.set_after_commit_warning = true;
            engine_warn!(
                SOURCE,
                "'{}': binding {} modified after commit, the set may be in use by the GPU",
                self.name,
                binding
            );
        }
        self.descriptors[index] = descriptor;
        self.dirty.set(index);
        self.valid.set(index);
    }

    // ===== COMMIT =====

    /// Push dirty bindings to the backend (no-op when nothing changed)
    #[inline]
    pub fn commit(&mut self, layout: &DescriptorSetLayout, driver: &dyn DescriptorDriver) {
        if self.dirty.any() {
            self.commit_slow(layout, driver);
        }
    }

    /// Push every dirty binding in ascending order, then clear the dirty set
    pub fn commit_slow(&mut self, layout: &DescriptorSetLayout, driver: &dyn DescriptorDriver) {
        if self.terminated {
            engine_warn!(SOURCE, "'{}': commit after terminate() ignored", self.name);
            return;
        }
        if layout.handle() != self.layout {
            engine_error!(
                SOURCE,
                "'{}' was created with layout {:?}, commit with {:?} ignored",
                self.name,
                self.layout,
                layout.handle()
            );
            return;
        }

        if !self.set_undefined_parameter_warning {
            let missing = layout.valid_descriptors() & !self.valid;
            if missing.any() {
                self.set_undefined_parameter_warning = true;
                engine_warn!(
                    SOURCE,
                    "'{}': bindings {:?} are declared by the layout but were never set",
                    self.name,
                    missing
                );
            }
        }

        for index in self.dirty.iter() {
            let binding = index as DescriptorBinding;
            match self.descriptors[index] {
                Descriptor::Buffer { buffer, offset, size } => {
                    driver.update_descriptor_set_buffer(self.handle, binding, buffer, offset, size);
                }
                Descriptor::Sampler { texture, params } => {
                    driver.update_descriptor_set_texture(self.handle, binding, texture, params);
                }
                Descriptor::Empty => {}
            }
        }
        self.dirty.clear();
        self.committed = true;
    }

    // ===== BINDING =====

    /// Bind this set at `point`
    pub fn bind(&self, driver: &dyn DescriptorDriver, point: DescriptorSetBindingPoint) {
        driver.bind_descriptor_set(self.handle, point, &[]);
    }

    /// Bind this set at `point` with one offset per dynamic-offset buffer binding
    pub fn bind_with_offsets(
        &self,
        layout: &DescriptorSetLayout,
        driver: &dyn DescriptorDriver,
        point: DescriptorSetBindingPoint,
        dynamic_offsets: &[u32],
    ) -> Result<()> {
        if dynamic_offsets.len() != layout.dynamic_offset_count() {
            engine_precondition!(
                SOURCE,
                "'{}': {} dynamic offsets given, layout expects {}",
                self.name,
                dynamic_offsets.len(),
                layout.dynamic_offset_count()
            );
        }
        driver.bind_descriptor_set(self.handle, point, dynamic_offsets);
        Ok(())
    }

    /// Clear whatever set is bound at `point`
    pub fn unbind(driver: &dyn DescriptorDriver, point: DescriptorSetBindingPoint) {
        driver.bind_descriptor_set(DescriptorSetHandle::NULL, point, &[]);
    }

    // ===== LIFECYCLE =====

    /// Copy of this set with a fresh backend handle
    ///
    /// Every valid binding is marked dirty so the first commit of the copy
    /// pushes the full contents. `layout` must be the one this set was
    /// created with, under either error policy.
    pub fn duplicate(
        &self,
        name: &str,
        layout: &DescriptorSetLayout,
        driver: &dyn DescriptorDriver,
    ) -> Result<DescriptorSet> {
        if layout.handle() != self.layout {
            return Err(engine_precondition_err!(
                SOURCE,
                "'{}' was created with layout {:?}, cannot duplicate with {:?}",
                self.name,
                self.layout,
                layout.handle()
            ));
        }
        let mut copy = DescriptorSet::new(name, layout, driver)?;
        copy.descriptors = self.descriptors.clone();
        copy.valid = self.valid;
        copy.dirty = self.valid;
        Ok(copy)
    }

    /// Release the backend set; must be called exactly once before drop
    pub fn terminate(&mut self, driver: &dyn DescriptorDriver) {
        if self.terminated {
            return;
        }
        driver.destroy_descriptor_set(self.handle);
        self.handle = DescriptorSetHandle::NULL;
        self.terminated = true;
    }

    // ===== QUERIES =====

    pub fn handle(&self) -> DescriptorSetHandle {
        self.handle
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self, binding: DescriptorBinding) -> Option<&Descriptor> {
        self.descriptors.get(binding as usize)
    }

    /// Bindings that have been assigned at least once
    pub fn valid_descriptors(&self) -> Bitset64 {
        self.valid
    }

    /// Bindings written since the last commit
    pub fn dirty_descriptors(&self) -> Bitset64 {
        self.dirty
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl Drop for DescriptorSet {
    fn drop(&mut self) {
        if !self.terminated {
            engine_warn!(
                SOURCE,
                "'{}' dropped without terminate(), backend set {:?} leaked",
                self.name,
                self.handle
            );
        }
    }
}

#[cfg(test)]
#[path = "descriptor_set_tests.rs"]
mod tests;
