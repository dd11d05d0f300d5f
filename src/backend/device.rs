// Vulkan Device - Logical device factory
//
// Creates the application's device handle from the selected physical device:
// - exactly one queue, priority 1.0, from the selected family
// - no optional features, no device extensions
// - the instance's layers again (older loaders validated per device)

use ash::vk;
use std::ffi::CString;

use super::selector::Selection;
use super::{Backend, BootstrapError};

/// Logical device handle plus its single queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalDevice {
    pub handle: vk::Device,
    pub queue: vk::Queue,
    pub queue_family_index: u32,
}

/// Create the logical device for `selection`.
pub fn create_logical_device<B: Backend>(
    backend: &mut B,
    selection: &Selection,
    requested_layers: &[CString],
) -> Result<LogicalDevice, BootstrapError> {
    let queue_priorities = [1.0];
    let queue_create_info = vk::DeviceQueueCreateInfo::builder()
        .queue_family_index(selection.queue_family_index)
        .queue_priorities(&queue_priorities)
        .build();

    // Nothing optional is enabled
    let features = vk::PhysicalDeviceFeatures::default();

    let layer_ptrs: Vec<_> = requested_layers.iter().map(|name| name.as_ptr()).collect();

    // Device layers are deprecated but still honoured by older loaders
    #[allow(deprecated)]
    let create_info = vk::DeviceCreateInfo::builder()
        .queue_create_infos(std::slice::from_ref(&queue_create_info))
        .enabled_layer_names(&layer_ptrs)
        .enabled_features(&features);

    let handle = backend
        .create_device(selection.physical_device, &create_info)
        .map_err(BootstrapError::DeviceCreation)?;

    let queue = backend.device_queue(handle, selection.queue_family_index, 0);

    log::info!(
        "Created a new Vulkan logical device on {} (queue family {})",
        selection.device_name,
        selection.queue_family_index
    );

    Ok(LogicalDevice {
        handle,
        queue,
        queue_family_index: selection.queue_family_index,
    })
}
