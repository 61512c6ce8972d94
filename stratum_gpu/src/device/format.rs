/// Pixel formats understood by the swap chain layer

/// Pixel format of an image
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Undefined,
    R8G8B8A8_UNORM,
    R8G8B8A8_SRGB,
    B8G8R8A8_UNORM,
    B8G8R8A8_SRGB,
    A2B10G10R10_UNORM,
    R16G16B16A16_SFLOAT,
    D16_UNORM,
    X8_D24_UNORM,
    D32_SFLOAT,
    S8_UINT,
    D16_UNORM_S8_UINT,
    D24_UNORM_S8_UINT,
    D32_SFLOAT_S8_UINT,
}

impl PixelFormat {
    /// Whether the format has a depth aspect
    pub fn is_depth(self) -> bool {
        matches!(
            self,
            PixelFormat::D16_UNORM
                | PixelFormat::X8_D24_UNORM
                | PixelFormat::D32_SFLOAT
                | PixelFormat::D16_UNORM_S8_UINT
                | PixelFormat::D24_UNORM_S8_UINT
                | PixelFormat::D32_SFLOAT_S8_UINT
        )
    }

    /// Whether the format has a stencil aspect
    pub fn is_stencil(self) -> bool {
        matches!(
            self,
            PixelFormat::S8_UINT
                | PixelFormat::D16_UNORM_S8_UINT
                | PixelFormat::D24_UNORM_S8_UINT
                | PixelFormat::D32_SFLOAT_S8_UINT
        )
    }

    pub fn is_srgb(self) -> bool {
        matches!(self, PixelFormat::R8G8B8A8_SRGB | PixelFormat::B8G8R8A8_SRGB)
    }

    /// Bytes per texel (depth/stencil formats report their packed size)
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            PixelFormat::Undefined => 0,
            PixelFormat::S8_UINT => 1,
            PixelFormat::D16_UNORM => 2,
            PixelFormat::D16_UNORM_S8_UINT => 3,
            PixelFormat::R8G8B8A8_UNORM
            | PixelFormat::R8G8B8A8_SRGB
            | PixelFormat::B8G8R8A8_UNORM
            | PixelFormat::B8G8R8A8_SRGB
            | PixelFormat::A2B10G10R10_UNORM
            | PixelFormat::X8_D24_UNORM
            | PixelFormat::D32_SFLOAT
            | PixelFormat::D24_UNORM_S8_UINT => 4,
            PixelFormat::D32_SFLOAT_S8_UINT => 5,
            PixelFormat::R16G16B16A16_SFLOAT => 8,
        }
    }
}

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;
