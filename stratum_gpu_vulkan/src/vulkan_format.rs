/// Conversions between the driver boundary types and `ash::vk`
///
/// Flag types share the Vulkan bit encoding, so most conversions are raw
/// bit copies. Enumerations are mapped explicitly; unknown Vulkan values map
/// to `PixelFormat::Undefined`, `ColorSpace::Other` or `None`.

use ash::vk;
use stratum_gpu::stratum::descriptor::{
    DescriptorSetLayoutBinding, DescriptorType, SamplerCompareFunc, SamplerMagFilter,
    SamplerMinFilter, SamplerWrapMode, ShaderStageFlags,
};
use stratum_gpu::stratum::device::{
    ColorSpace, CompositeAlpha, DriverError, Extent2D, ImageUsage, MemoryProperty, PixelFormat,
    PresentMode, SurfaceTransform,
};

// ============================================================================
// Driver status
// ============================================================================

/// Carry a failed `vk::Result` across the driver boundary
pub fn driver_error(result: vk::Result) -> DriverError {
    DriverError(result.as_raw())
}

// ============================================================================
// Pixel formats and color spaces
// ============================================================================

pub fn pixel_format_to_vk(format: PixelFormat) -> vk::Format {
    match format {
        PixelFormat::Undefined => vk::Format::UNDEFINED,
        PixelFormat::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
        PixelFormat::R8G8B8A8_SRGB => vk::Format::R8G8B8A8_SRGB,
        PixelFormat::B8G8R8A8_UNORM => vk::Format::B8G8R8A8_UNORM,
        PixelFormat::B8G8R8A8_SRGB => vk::Format::B8G8R8A8_SRGB,
        PixelFormat::A2B10G10R10_UNORM => vk::Format::A2B10G10R10_UNORM_PACK32,
        PixelFormat::R16G16B16A16_SFLOAT => vk::Format::R16G16B16A16_SFLOAT,
        PixelFormat::D16_UNORM => vk::Format::D16_UNORM,
        PixelFormat::X8_D24_UNORM => vk::Format::X8_D24_UNORM_PACK32,
        PixelFormat::D32_SFLOAT => vk::Format::D32_SFLOAT,
        PixelFormat::S8_UINT => vk::Format::S8_UINT,
        PixelFormat::D16_UNORM_S8_UINT => vk::Format::D16_UNORM_S8_UINT,
        PixelFormat::D24_UNORM_S8_UINT => vk::Format::D24_UNORM_S8_UINT,
        PixelFormat::D32_SFLOAT_S8_UINT => vk::Format::D32_SFLOAT_S8_UINT,
    }
}

pub fn vk_to_pixel_format(format: vk::Format) -> PixelFormat {
    match format {
        vk::Format::R8G8B8A8_UNORM => PixelFormat::R8G8B8A8_UNORM,
        vk::Format::R8G8B8A8_SRGB => PixelFormat::R8G8B8A8_SRGB,
        vk::Format::B8G8R8A8_UNORM => PixelFormat::B8G8R8A8_UNORM,
        vk::Format::B8G8R8A8_SRGB => PixelFormat::B8G8R8A8_SRGB,
        vk::Format::A2B10G10R10_UNORM_PACK32 => PixelFormat::A2B10G10R10_UNORM,
        vk::Format::R16G16B16A16_SFLOAT => PixelFormat::R16G16B16A16_SFLOAT,
        vk::Format::D16_UNORM => PixelFormat::D16_UNORM,
        vk::Format::X8_D24_UNORM_PACK32 => PixelFormat::X8_D24_UNORM,
        vk::Format::D32_SFLOAT => PixelFormat::D32_SFLOAT,
        vk::Format::S8_UINT => PixelFormat::S8_UINT,
        vk::Format::D16_UNORM_S8_UINT => PixelFormat::D16_UNORM_S8_UINT,
        vk::Format::D24_UNORM_S8_UINT => PixelFormat::D24_UNORM_S8_UINT,
        vk::Format::D32_SFLOAT_S8_UINT => PixelFormat::D32_SFLOAT_S8_UINT,
        _ => PixelFormat::Undefined,
    }
}

pub fn color_space_to_vk(color_space: ColorSpace) -> vk::ColorSpaceKHR {
    match color_space {
        ColorSpace::SrgbNonlinear => vk::ColorSpaceKHR::SRGB_NONLINEAR,
        ColorSpace::ExtendedSrgbLinear => vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT,
        ColorSpace::DisplayP3Nonlinear => vk::ColorSpaceKHR::DISPLAY_P3_NONLINEAR_EXT,
        ColorSpace::Other(raw) => vk::ColorSpaceKHR::from_raw(raw),
    }
}

pub fn vk_to_color_space(color_space: vk::ColorSpaceKHR) -> ColorSpace {
    match color_space {
        vk::ColorSpaceKHR::SRGB_NONLINEAR => ColorSpace::SrgbNonlinear,
        vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT => ColorSpace::ExtendedSrgbLinear,
        vk::ColorSpaceKHR::DISPLAY_P3_NONLINEAR_EXT => ColorSpace::DisplayP3Nonlinear,
        other => ColorSpace::Other(other.as_raw()),
    }
}

// ============================================================================
// Presentation
// ============================================================================

pub fn present_mode_to_vk(mode: PresentMode) -> vk::PresentModeKHR {
    match mode {
        PresentMode::Immediate => vk::PresentModeKHR::IMMEDIATE,
        PresentMode::Mailbox => vk::PresentModeKHR::MAILBOX,
        PresentMode::Fifo => vk::PresentModeKHR::FIFO,
        PresentMode::FifoRelaxed => vk::PresentModeKHR::FIFO_RELAXED,
    }
}

/// Shared-refresh and vendor present modes have no counterpart and map to `None`
pub fn vk_to_present_mode(mode: vk::PresentModeKHR) -> Option<PresentMode> {
    match mode {
        vk::PresentModeKHR::IMMEDIATE => Some(PresentMode::Immediate),
        vk::PresentModeKHR::MAILBOX => Some(PresentMode::Mailbox),
        vk::PresentModeKHR::FIFO => Some(PresentMode::Fifo),
        vk::PresentModeKHR::FIFO_RELAXED => Some(PresentMode::FifoRelaxed),
        _ => None,
    }
}

pub fn extent_to_vk(extent: Extent2D) -> vk::Extent2D {
    vk::Extent2D { width: extent.width, height: extent.height }
}

pub fn vk_to_extent(extent: vk::Extent2D) -> Extent2D {
    Extent2D::new(extent.width, extent.height)
}

// ============================================================================
// Flags (same bit encoding on both sides)
// ============================================================================

pub fn image_usage_to_vk(usage: ImageUsage) -> vk::ImageUsageFlags {
    vk::ImageUsageFlags::from_raw(usage.bits())
}

pub fn vk_to_memory_property(flags: vk::MemoryPropertyFlags) -> MemoryProperty {
    MemoryProperty::from_bits_truncate(flags.as_raw())
}

pub fn composite_alpha_to_vk(alpha: CompositeAlpha) -> vk::CompositeAlphaFlagsKHR {
    vk::CompositeAlphaFlagsKHR::from_raw(alpha.bits())
}

pub fn vk_to_composite_alpha(alpha: vk::CompositeAlphaFlagsKHR) -> CompositeAlpha {
    CompositeAlpha::from_bits_truncate(alpha.as_raw())
}

pub fn surface_transform_to_vk(transform: SurfaceTransform) -> vk::SurfaceTransformFlagsKHR {
    vk::SurfaceTransformFlagsKHR::from_raw(transform.bits())
}

pub fn vk_to_surface_transform(transform: vk::SurfaceTransformFlagsKHR) -> SurfaceTransform {
    SurfaceTransform::from_bits_truncate(transform.as_raw())
}

pub fn shader_stages_to_vk(stages: ShaderStageFlags) -> vk::ShaderStageFlags {
    let mut flags = vk::ShaderStageFlags::empty();
    if stages.contains(ShaderStageFlags::VERTEX) {
        flags |= vk::ShaderStageFlags::VERTEX;
    }
    if stages.contains(ShaderStageFlags::FRAGMENT) {
        flags |= vk::ShaderStageFlags::FRAGMENT;
    }
    if stages.contains(ShaderStageFlags::COMPUTE) {
        flags |= vk::ShaderStageFlags::COMPUTE;
    }
    flags
}

// ============================================================================
// Descriptors
// ============================================================================

/// Native descriptor type of a layout binding
///
/// Buffers declared with a dynamic offset use the `_DYNAMIC` variants.
pub fn descriptor_type_to_vk(binding: &DescriptorSetLayoutBinding) -> vk::DescriptorType {
    let dynamic = binding.has_dynamic_offset();
    match binding.descriptor_type {
        DescriptorType::UniformBuffer if dynamic => vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC,
        DescriptorType::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
        DescriptorType::ShaderStorageBuffer if dynamic => vk::DescriptorType::STORAGE_BUFFER_DYNAMIC,
        DescriptorType::ShaderStorageBuffer => vk::DescriptorType::STORAGE_BUFFER,
        DescriptorType::Sampler { .. } => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
        DescriptorType::InputAttachment => vk::DescriptorType::INPUT_ATTACHMENT,
    }
}

pub fn mag_filter_to_vk(filter: SamplerMagFilter) -> vk::Filter {
    match filter {
        SamplerMagFilter::Nearest => vk::Filter::NEAREST,
        SamplerMagFilter::Linear => vk::Filter::LINEAR,
    }
}

/// Minification filter and mipmap mode of a min filter
pub fn min_filter_to_vk(filter: SamplerMinFilter) -> (vk::Filter, vk::SamplerMipmapMode) {
    match filter {
        SamplerMinFilter::Nearest => (vk::Filter::NEAREST, vk::SamplerMipmapMode::NEAREST),
        SamplerMinFilter::Linear => (vk::Filter::LINEAR, vk::SamplerMipmapMode::NEAREST),
        SamplerMinFilter::NearestMipmapNearest => (vk::Filter::NEAREST, vk::SamplerMipmapMode::NEAREST),
        SamplerMinFilter::LinearMipmapNearest => (vk::Filter::LINEAR, vk::SamplerMipmapMode::NEAREST),
        SamplerMinFilter::NearestMipmapLinear => (vk::Filter::NEAREST, vk::SamplerMipmapMode::LINEAR),
        SamplerMinFilter::LinearMipmapLinear => (vk::Filter::LINEAR, vk::SamplerMipmapMode::LINEAR),
    }
}

pub fn wrap_mode_to_vk(mode: SamplerWrapMode) -> vk::SamplerAddressMode {
    match mode {
        SamplerWrapMode::ClampToEdge => vk::SamplerAddressMode::CLAMP_TO_EDGE,
        SamplerWrapMode::Repeat => vk::SamplerAddressMode::REPEAT,
        SamplerWrapMode::MirroredRepeat => vk::SamplerAddressMode::MIRRORED_REPEAT,
    }
}

pub fn compare_func_to_vk(func: SamplerCompareFunc) -> vk::CompareOp {
    match func {
        SamplerCompareFunc::LessEqual => vk::CompareOp::LESS_OR_EQUAL,
        SamplerCompareFunc::GreaterEqual => vk::CompareOp::GREATER_OR_EQUAL,
        SamplerCompareFunc::Less => vk::CompareOp::LESS,
        SamplerCompareFunc::Greater => vk::CompareOp::GREATER,
        SamplerCompareFunc::Equal => vk::CompareOp::EQUAL,
        SamplerCompareFunc::NotEqual => vk::CompareOp::NOT_EQUAL,
        SamplerCompareFunc::Always => vk::CompareOp::ALWAYS,
        SamplerCompareFunc::Never => vk::CompareOp::NEVER,
    }
}

#[cfg(test)]
#[path = "vulkan_format_tests.rs"]
mod tests;
