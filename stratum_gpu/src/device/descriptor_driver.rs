/// Driver commands used by descriptor sets

use crate::device::{
    BufferHandle, DescriptorSetHandle, DescriptorSetLayoutHandle, DriverResult, TextureHandle,
};
use crate::descriptor::{DescriptorBinding, DescriptorSetBindingPoint, DescriptorSetLayoutDesc, SamplerParams};

/// Backend side of descriptor set management
///
/// Update and bind commands are fire-and-forget; the backend records them
/// and applies them in submission order.
pub trait DescriptorDriver: Send + Sync {
    fn create_descriptor_set_layout(
        &self,
        desc: &DescriptorSetLayoutDesc,
    ) -> DriverResult<DescriptorSetLayoutHandle>;

    fn destroy_descriptor_set_layout(&self, layout: DescriptorSetLayoutHandle);

    fn create_descriptor_set(
        &self,
        layout: DescriptorSetLayoutHandle,
    ) -> DriverResult<DescriptorSetHandle>;

    fn destroy_descriptor_set(&self, set: DescriptorSetHandle);

    /// Point a buffer binding at `[offset, offset + size)` of `buffer`
    fn update_descriptor_set_buffer(
        &self,
        set: DescriptorSetHandle,
        binding: DescriptorBinding,
        buffer: BufferHandle,
        offset: u32,
        size: u32,
    );

    /// Point a sampler binding at `texture` sampled with `params`
    fn update_descriptor_set_texture(
        &self,
        set: DescriptorSetHandle,
        binding: DescriptorBinding,
        texture: TextureHandle,
        params: SamplerParams,
    );

    /// Bind `set` at `point`; a null set unbinds the point
    fn bind_descriptor_set(
        &self,
        set: DescriptorSetHandle,
        point: DescriptorSetBindingPoint,
        dynamic_offsets: &[u32],
    );
}
