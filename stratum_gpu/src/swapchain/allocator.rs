/// Image + memory allocation for swap chain attachments

use crate::device::{
    select_memory_type, Device, DriverError, Extent2D, ImageDesc, ImageHandle, ImageUsage,
    MemoryHandle, MemoryProperty, PixelFormat,
};
use crate::error::{Error, Result};
use crate::{engine_driver_err, engine_error, engine_precondition_err};

const SOURCE: &str = "stratum::ResourceAllocator";

/// Create a 2D attachment image and bind freshly allocated device-local memory to it
///
/// Transfer source and destination usage are always requested so blits and
/// read-backs work on every swap chain image. Attachment usage (depth/stencil
/// or color) follows the format. Ownership of both handles passes to the
/// caller, which must destroy the image before freeing the memory.
pub fn create_image_and_memory<D: Device + ?Sized>(
    device: &D,
    extent: Extent2D,
    format: PixelFormat,
    is_protected: bool,
) -> Result<(ImageHandle, MemoryHandle)> {
    let attachment = if format.is_depth() {
        ImageUsage::DEPTH_STENCIL_ATTACHMENT
    } else {
        ImageUsage::COLOR_ATTACHMENT
    };
    let desc = ImageDesc {
        extent,
        format,
        usage: ImageUsage::TRANSFER_SRC | ImageUsage::TRANSFER_DST | attachment,
        protected: is_protected,
    };

    let image = device
        .create_image(&desc)
        .map_err(|e| engine_driver_err!(SOURCE, "vkCreateImage", e))?;

    let requirements = device.image_memory_requirements(image);
    let mut required = MemoryProperty::DEVICE_LOCAL;
    if is_protected {
        required |= MemoryProperty::PROTECTED;
    }

    let memory_type_index = match select_memory_type(
        &device.memory_types(),
        requirements.memory_type_bits,
        required,
    ) {
        Some(index) => index,
        None => {
            device.destroy_image(image);
            return Err(engine_precondition_err!(
                SOURCE,
                "unable to find a memory type that meets requirements (bits={:#x}, flags={:?})",
                requirements.memory_type_bits,
                required
            ));
        }
    };

    let memory = match device.allocate_memory(requirements.size, memory_type_index) {
        Ok(memory) => memory,
        Err(e) if e == DriverError::ERROR_OUT_OF_DEVICE_MEMORY || e == DriverError::ERROR_OUT_OF_HOST_MEMORY => {
            device.destroy_image(image);
            let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
            engine_error!(
                SOURCE,
                "Out of memory for {} {:?} attachment ({:.2} MB, error={})",
                extent,
                format,
                size_mb,
                e.0
            );
            return Err(Error::OutOfMemory);
        }
        Err(e) => {
            device.destroy_image(image);
            return Err(engine_driver_err!(SOURCE, "vkAllocateMemory", e));
        }
    };

    if let Err(e) = device.bind_image_memory(image, memory) {
        device.destroy_image(image);
        device.free_memory(memory);
        return Err(engine_driver_err!(SOURCE, "vkBindImageMemory", e));
    }

    Ok((image, memory))
}

/// Pick the first supported depth format, requiring a stencil aspect when asked
pub fn select_depth_format(formats: &[PixelFormat], has_stencil: bool) -> Result<PixelFormat> {
    formats
        .iter()
        .copied()
        .find(|f| f.is_depth() && (!has_stencil || f.is_stencil()))
        .ok_or_else(|| {
            engine_precondition_err!(
                SOURCE,
                "cannot find a suitable depth format (stencil={}) among {:?}",
                has_stencil,
                formats
            )
        })
}

#[cfg(test)]
#[path = "allocator_tests.rs"]
mod tests;
