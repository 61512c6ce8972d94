/// Vulkan debug messenger: forwards validation layer messages to the engine log
///
/// Compiled only with the `vulkan-validation` feature.

use ash::vk;
use std::ffi::CStr;
use stratum_gpu::stratum::log::LogSeverity;
use stratum_gpu::stratum::{Engine, Result};
use stratum_gpu::engine_driver_err;
use crate::vulkan_format::driver_error;

const SOURCE: &str = "stratum::vulkan";

/// Instance layer enabled alongside the messenger
pub(crate) const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Debug-utils loader and the messenger it created
pub(crate) struct DebugMessenger {
    loader: ash::ext::debug_utils::Instance,
    messenger: vk::DebugUtilsMessengerEXT,
}

impl DebugMessenger {
    pub(crate) fn new(entry: &ash::Entry, instance: &ash::Instance) -> Result<Self> {
        let loader = ash::ext::debug_utils::Instance::new(entry, instance);

        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                    | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                    | vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(vulkan_debug_callback));

        let messenger = unsafe { loader.create_debug_utils_messenger(&create_info, None) }
            .map_err(|e| engine_driver_err!(SOURCE, "vkCreateDebugUtilsMessengerEXT", driver_error(e)))?;

        Ok(Self { loader, messenger })
    }

    /// Must run before the instance is destroyed
    pub(crate) fn destroy(&mut self) {
        if self.messenger != vk::DebugUtilsMessengerEXT::null() {
            unsafe { self.loader.destroy_debug_utils_messenger(self.messenger, None) };
            self.messenger = vk::DebugUtilsMessengerEXT::null();
        }
    }
}

/// Engine severity of a validation message
pub(crate) fn map_severity(severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> LogSeverity {
    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        LogSeverity::Error
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        LogSeverity::Warn
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        LogSeverity::Debug
    } else {
        LogSeverity::Trace
    }
}

fn message_type_name(message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> &'static str {
    if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "Validation"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "Performance"
    } else {
        "General"
    }
}

unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() {
        return vk::FALSE;
    }
    let callback_data = &*p_callback_data;
    let message_id_name = if callback_data.p_message_id_name.is_null() {
        "Unknown".into()
    } else {
        CStr::from_ptr(callback_data.p_message_id_name).to_string_lossy()
    };
    let message = if callback_data.p_message.is_null() {
        "No message".into()
    } else {
        CStr::from_ptr(callback_data.p_message).to_string_lossy()
    };

    Engine::log(
        map_severity(message_severity),
        SOURCE,
        format!("[{}] {}: {}", message_type_name(message_type), message_id_name, message),
    );

    // Never abort the Vulkan call that triggered the message
    vk::FALSE
}
