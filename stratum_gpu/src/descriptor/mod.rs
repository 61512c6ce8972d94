pub mod sampler;
pub mod layout;
pub mod descriptor_set;

pub use sampler::{
    is_texture_compatible_with_descriptor, SamplerCompareFunc, SamplerCompareMode, SamplerFormat,
    SamplerMagFilter, SamplerMinFilter, SamplerParams, SamplerType, SamplerWrapMode, TextureType,
};
pub use layout::{
    DescriptorBinding, DescriptorFlags, DescriptorSetLayout, DescriptorSetLayoutBinding,
    DescriptorSetLayoutDesc, DescriptorType, ShaderStageFlags, MAX_DESCRIPTOR_BINDINGS,
    MAX_DESCRIPTOR_SET_COUNT,
};
pub use descriptor_set::{Descriptor, DescriptorSet, DescriptorSetBindingPoint};
