//! GPU tests for the Vulkan backend
//!
//! These tests run the driver traits against a real device through a
//! headless `VulkanContext`. All tests require a GPU and are marked with #[ignore].
//!
//! Run with: cargo test --test vulkan_device_tests -- --ignored

use std::sync::Arc;
use ash::vk;
use ash::vk::Handle;
use serial_test::serial;
use stratum_gpu::stratum::descriptor::{
    DescriptorSet, DescriptorSetBindingPoint, DescriptorSetLayout, DescriptorSetLayoutBinding,
    DescriptorSetLayoutDesc, SamplerFormat, SamplerParams, SamplerType, ShaderStageFlags,
};
use stratum_gpu::stratum::device::{
    select_memory_type, Device, Extent2D, ImageDesc, ImageUsage, MemoryProperty, PixelFormat,
    TextureHandle,
};
use stratum_gpu::stratum::swapchain::{
    create_image_and_memory, HeadlessSwapChain, ImageSyncData, SwapChain, SwapChainFlags,
    SwapChainStatus, HEADLESS_SWAPCHAIN_SIZE,
};
use stratum_gpu_vulkan::{VulkanConfig, VulkanContext};

fn create_context() -> Arc<VulkanContext> {
    Arc::new(VulkanContext::new(VulkanConfig::default(), &[]).unwrap())
}

fn sampled_layout(context: &VulkanContext) -> DescriptorSetLayout {
    DescriptorSetLayout::new(
        context,
        DescriptorSetLayoutDesc {
            bindings: vec![DescriptorSetLayoutBinding::sampler(
                0,
                SamplerType::Sampler2D,
                SamplerFormat::Float,
                ShaderStageFlags::FRAGMENT,
            )],
        },
    )
    .unwrap()
}

// ============================================================================
// CONTEXT
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_context_reports_capabilities() {
    let context = create_context();
    assert!(!context.memory_types().is_empty());
    assert!(context
        .memory_types()
        .iter()
        .any(|props| props.contains(MemoryProperty::DEVICE_LOCAL)));
    assert!(context.memory_types().iter().all(|props| !props.contains(MemoryProperty::PROTECTED)));
    assert!(context.depth_stencil_formats().iter().all(|f| f.is_depth()));
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_queue_wait_idle() {
    let context = create_context();
    assert!(context.queue_wait_idle().is_ok());
}

// ============================================================================
// IMAGES
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_create_attachment_image() {
    let context = create_context();
    let (image, memory) =
        create_image_and_memory(&*context, Extent2D::new(256, 128), PixelFormat::R8G8B8A8_UNORM, false)
            .unwrap();
    assert!(!image.is_null());
    assert!(!memory.is_null());

    let requirements = context.image_memory_requirements(image);
    assert!(requirements.size >= 256 * 128 * 4);

    context.destroy_image(image);
    context.free_memory(memory);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_semaphore_lifecycle() {
    let context = create_context();
    let semaphore = context.create_semaphore().unwrap();
    assert!(!semaphore.is_null());
    context.destroy_semaphore(semaphore);
}

// ============================================================================
// HEADLESS SWAP CHAIN
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_headless_swapchain_frame_loop() {
    let context = create_context();
    let mut chain =
        HeadlessSwapChain::new(Arc::clone(&context), Extent2D::new(320, 240), SwapChainFlags::SRGB_COLORSPACE)
            .unwrap();

    assert_eq!(chain.bundle().colors.len(), HEADLESS_SWAPCHAIN_SIZE);
    assert_eq!(chain.bundle().color_format, PixelFormat::R8G8B8A8_SRGB);
    assert!(chain.bundle().depth_format.is_depth());

    for frame in 0..6u32 {
        let mut sync = ImageSyncData::default();
        assert_eq!(chain.acquire(&mut sync).unwrap(), SwapChainStatus::Optimal);
        assert_eq!(sync.image_index, frame % HEADLESS_SWAPCHAIN_SIZE as u32);
        chain.present(sync.image_index, sync.image_ready_semaphore).unwrap();
    }

    chain.destroy();
    assert!(chain.bundle().colors.is_empty());
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_headless_swapchain_with_stencil() {
    let context = create_context();
    let has_stencil_format = context
        .depth_stencil_formats()
        .iter()
        .any(|f| f.is_depth() && f.is_stencil());
    let result = HeadlessSwapChain::new(
        Arc::clone(&context),
        Extent2D::new(64, 64),
        SwapChainFlags::HAS_STENCIL_BUFFER,
    );
    assert_eq!(result.is_ok(), has_stencil_format);
    if let Ok(chain) = result {
        assert!(chain.bundle().depth_format.is_stencil());
    }
}

// ============================================================================
// DESCRIPTORS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_descriptor_pool_grows() {
    let context = Arc::new(
        VulkanContext::new(
            VulkanConfig { descriptor_pool_max_sets: 2, ..VulkanConfig::default() },
            &[],
        )
        .unwrap(),
    );
    let layout = sampled_layout(&context);

    let mut sets: Vec<DescriptorSet> = (0..5)
        .map(|i| DescriptorSet::new(&format!("set_{}", i), &layout, &*context).unwrap())
        .collect();
    assert_eq!(context.live_descriptor_set_count(), 5);
    assert!(context.descriptor_pool_count() >= 3);

    for set in sets.iter_mut() {
        set.terminate(&*context);
    }
    assert_eq!(context.live_descriptor_set_count(), 0);
    layout.terminate(&*context);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_texture_update_and_deferred_bind() {
    let context = create_context();
    let device = context.device();

    // Sampled image + view
    let image = context
        .create_image(&ImageDesc {
            extent: Extent2D::new(16, 16),
            format: PixelFormat::R8G8B8A8_UNORM,
            usage: ImageUsage::SAMPLED,
            protected: false,
        })
        .unwrap();
    let requirements = context.image_memory_requirements(image);
    let type_index = select_memory_type(
        &context.memory_types(),
        requirements.memory_type_bits,
        MemoryProperty::DEVICE_LOCAL,
    )
    .unwrap();
    let memory = context.allocate_memory(requirements.size, type_index).unwrap();
    context.bind_image_memory(image, memory).unwrap();

    let view_info = vk::ImageViewCreateInfo::default()
        .image(vk::Image::from_raw(image.as_raw()))
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(vk::Format::R8G8B8A8_UNORM)
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        });
    let view = unsafe { device.create_image_view(&view_info, None) }.unwrap();

    let layout = sampled_layout(&context);
    let mut set = DescriptorSet::new("textured", &layout, &*context).unwrap();
    set.set_sampler(&layout, 0, TextureHandle::from_raw(view.as_raw()), SamplerParams::linear_repeat())
        .unwrap();
    set.commit(&layout, &*context);
    assert_eq!(context.sampler_count(), 1);

    // Same parameters reuse the cached sampler
    let mut other = DescriptorSet::new("textured_2", &layout, &*context).unwrap();
    other
        .set_sampler(&layout, 0, TextureHandle::from_raw(view.as_raw()), SamplerParams::linear_repeat())
        .unwrap();
    other.commit(&layout, &*context);
    assert_eq!(context.sampler_count(), 1);

    // Binding is deferred until a command buffer is flushed
    set.bind(&*context, DescriptorSetBindingPoint::PerMaterial);

    let pool_info = vk::CommandPoolCreateInfo::default().queue_family_index(context.graphics_queue_family());
    let pool = unsafe { device.create_command_pool(&pool_info, None) }.unwrap();
    let alloc_info = vk::CommandBufferAllocateInfo::default()
        .command_pool(pool)
        .level(vk::CommandBufferLevel::PRIMARY)
        .command_buffer_count(1);
    let cmd = unsafe { device.allocate_command_buffers(&alloc_info) }.unwrap()[0];

    let set_layouts = [
        vk::DescriptorSetLayout::from_raw(layout.handle().as_raw()),
        vk::DescriptorSetLayout::from_raw(layout.handle().as_raw()),
        vk::DescriptorSetLayout::from_raw(layout.handle().as_raw()),
    ];
    let pipeline_layout_info = vk::PipelineLayoutCreateInfo::default().set_layouts(&set_layouts);
    let pipeline_layout = unsafe { device.create_pipeline_layout(&pipeline_layout_info, None) }.unwrap();

    unsafe {
        device
            .begin_command_buffer(cmd, &vk::CommandBufferBeginInfo::default())
            .unwrap();
    }
    assert_eq!(context.flush_descriptor_bindings(cmd, pipeline_layout), 1);
    assert_eq!(context.flush_descriptor_bindings(cmd, pipeline_layout), 0);
    unsafe {
        device.end_command_buffer(cmd).unwrap();
        device.destroy_pipeline_layout(pipeline_layout, None);
        device.destroy_command_pool(pool, None);
    }

    set.terminate(&*context);
    other.terminate(&*context);
    layout.terminate(&*context);
    unsafe { device.destroy_image_view(view, None) };
    context.destroy_image(image);
    context.free_memory(memory);
}
