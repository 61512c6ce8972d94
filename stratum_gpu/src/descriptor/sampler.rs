/// Sampler parameters and texture/descriptor compatibility rules

// ============================================================================
// Sampler state
// ============================================================================

/// Magnification filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SamplerMagFilter {
    #[default]
    Nearest,
    Linear,
}

/// Minification filter, optionally with mipmap selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SamplerMinFilter {
    #[default]
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

impl SamplerMinFilter {
    pub fn uses_mipmaps(self) -> bool {
        !matches!(self, SamplerMinFilter::Nearest | SamplerMinFilter::Linear)
    }
}

/// Texture coordinate wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SamplerWrapMode {
    #[default]
    ClampToEdge,
    Repeat,
    MirroredRepeat,
}

/// Whether depth comparison is enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SamplerCompareMode {
    #[default]
    None,
    CompareToTexture,
}

/// Depth comparison function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SamplerCompareFunc {
    #[default]
    LessEqual,
    GreaterEqual,
    Less,
    Greater,
    Equal,
    NotEqual,
    Always,
    Never,
}

/// Full sampler state attached to a sampler descriptor
///
/// Small and hashable: backends cache native samplers keyed by this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SamplerParams {
    pub filter_mag: SamplerMagFilter,
    pub filter_min: SamplerMinFilter,
    pub wrap_s: SamplerWrapMode,
    pub wrap_t: SamplerWrapMode,
    pub wrap_r: SamplerWrapMode,
    /// log2 of the maximum anisotropy (0 disables anisotropic filtering)
    pub anisotropy_log2: u8,
    pub compare_mode: SamplerCompareMode,
    pub compare_func: SamplerCompareFunc,
}

impl SamplerParams {
    /// Trilinear filtering with repeat wrapping
    pub fn linear_repeat() -> Self {
        Self {
            filter_mag: SamplerMagFilter::Linear,
            filter_min: SamplerMinFilter::LinearMipmapLinear,
            wrap_s: SamplerWrapMode::Repeat,
            wrap_t: SamplerWrapMode::Repeat,
            wrap_r: SamplerWrapMode::Repeat,
            ..Default::default()
        }
    }

    /// Depth comparison sampler used for shadow maps
    pub fn shadow() -> Self {
        Self {
            filter_mag: SamplerMagFilter::Linear,
            filter_min: SamplerMinFilter::Linear,
            compare_mode: SamplerCompareMode::CompareToTexture,
            compare_func: SamplerCompareFunc::GreaterEqual,
            ..Default::default()
        }
    }

    pub fn max_anisotropy(&self) -> f32 {
        (1u32 << self.anisotropy_log2.min(4)) as f32
    }
}

// ============================================================================
// Texture / descriptor compatibility
// ============================================================================

/// Texel data type of a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureType {
    Float,
    Int,
    Uint,
    Depth,
    Stencil,
    DepthStencil,
}

/// Dimensionality of a sampler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerType {
    Sampler2D,
    Sampler2DArray,
    SamplerCubemap,
    SamplerExternal,
    Sampler3D,
    SamplerCubemapArray,
}

/// Data type a shader expects from a sampler descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerFormat {
    Float,
    Int,
    Uint,
    /// Shadow sampler performing depth comparison
    Shadow,
}

/// Check whether a texture can be bound to a sampler descriptor
///
/// The descriptor must be a sampler of the same dimensionality as
/// `sampler_type`, and its data type must accept the texture's texels.
/// Depth textures may be read either as plain floats or through a shadow
/// sampler; stencil is only readable as unsigned integers.
pub fn is_texture_compatible_with_descriptor(
    texture_type: TextureType,
    sampler_type: SamplerType,
    descriptor_type: super::DescriptorType,
) -> bool {
    let super::DescriptorType::Sampler { sampler, format } = descriptor_type else {
        return false;
    };
    if sampler != sampler_type {
        return false;
    }
    if sampler_type == SamplerType::SamplerExternal {
        return texture_type == TextureType::Float && format == SamplerFormat::Float;
    }
    match texture_type {
        TextureType::Float => format == SamplerFormat::Float,
        TextureType::Int => format == SamplerFormat::Int,
        TextureType::Uint => format == SamplerFormat::Uint,
        TextureType::Depth | TextureType::DepthStencil => {
            matches!(format, SamplerFormat::Float | SamplerFormat::Shadow)
        }
        TextureType::Stencil => format == SamplerFormat::Uint,
    }
}

#[cfg(test)]
#[path = "sampler_tests.rs"]
mod tests;
