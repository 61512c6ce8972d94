/// SamplerCache: VkSampler objects keyed by sampler parameters
///
/// Samplers are created on first use and live until the context shuts the
/// cache down. Typical scenes only need a handful of distinct parameter sets.

use ash::vk;
use rustc_hash::FxHashMap;
use stratum_gpu::stratum::descriptor::{SamplerCompareMode, SamplerParams};
use stratum_gpu::stratum::Result;
use stratum_gpu::engine_driver_err;
use crate::vulkan_format::{
    compare_func_to_vk, driver_error, mag_filter_to_vk, min_filter_to_vk, wrap_mode_to_vk,
};

const SOURCE: &str = "stratum::vulkan";

pub(crate) struct SamplerCache {
    cache: FxHashMap<SamplerParams, vk::Sampler>,
    anisotropy_supported: bool,
}

impl SamplerCache {
    pub(crate) fn new(anisotropy_supported: bool) -> Self {
        Self {
            cache: FxHashMap::default(),
            anisotropy_supported,
        }
    }

    /// Get or create the VkSampler for `params`
    pub(crate) fn get(&mut self, device: &ash::Device, params: SamplerParams) -> Result<vk::Sampler> {
        if let Some(&sampler) = self.cache.get(&params) {
            return Ok(sampler);
        }

        let create_info = self.create_info(&params);
        let sampler = unsafe { device.create_sampler(&create_info, None) }
            .map_err(|e| engine_driver_err!(SOURCE, "vkCreateSampler", driver_error(e)))?;
        self.cache.insert(params, sampler);
        Ok(sampler)
    }

    pub(crate) fn len(&self) -> usize {
        self.cache.len()
    }

    /// Destroy every cached sampler. Must run while the device is alive.
    pub(crate) fn shutdown(&mut self, device: &ash::Device) {
        for (_, sampler) in self.cache.drain() {
            unsafe { device.destroy_sampler(sampler, None) };
        }
    }

    fn create_info(&self, params: &SamplerParams) -> vk::SamplerCreateInfo<'static> {
        let (min, mipmap) = min_filter_to_vk(params.filter_min);
        let max_lod = if params.filter_min.uses_mipmaps() { vk::LOD_CLAMP_NONE } else { 0.25 };

        let mut create_info = vk::SamplerCreateInfo::default()
            .mag_filter(mag_filter_to_vk(params.filter_mag))
            .min_filter(min)
            .mipmap_mode(mipmap)
            .address_mode_u(wrap_mode_to_vk(params.wrap_s))
            .address_mode_v(wrap_mode_to_vk(params.wrap_t))
            .address_mode_w(wrap_mode_to_vk(params.wrap_r))
            .mip_lod_bias(0.0)
            .min_lod(0.0)
            .max_lod(max_lod)
            .border_color(vk::BorderColor::FLOAT_OPAQUE_BLACK)
            .unnormalized_coordinates(false);

        if params.compare_mode == SamplerCompareMode::CompareToTexture {
            create_info = create_info
                .compare_enable(true)
                .compare_op(compare_func_to_vk(params.compare_func));
        } else {
            create_info = create_info
                .compare_enable(false)
                .compare_op(vk::CompareOp::ALWAYS);
        }

        if self.anisotropy_supported && params.anisotropy_log2 > 0 {
            create_info = create_info
                .anisotropy_enable(true)
                .max_anisotropy(params.max_anisotropy());
        } else {
            create_info = create_info
                .anisotropy_enable(false)
                .max_anisotropy(1.0);
        }

        create_info
    }
}
