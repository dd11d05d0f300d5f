// Physical device selection
//
// Every queue family of every physical device is checked against a fixed
// requirement: the family supports graphics and the device supports both
// geometry and tessellation shaders. There is no scoring. Each matching pair
// overwrites the previous one, so the LAST match wins.

use ash::vk;

use super::capabilities::{enumerate_two_call, string_from_raw};
use super::{Backend, BootstrapError};

/// Optional features the selection looks at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceFeatures {
    pub geometry_shader: bool,
    pub tessellation_shader: bool,
}

impl From<&vk::PhysicalDeviceFeatures> for DeviceFeatures {
    fn from(features: &vk::PhysicalDeviceFeatures) -> Self {
        Self {
            geometry_shader: features.geometry_shader == vk::TRUE,
            tessellation_shader: features.tessellation_shader == vk::TRUE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilyInfo {
    pub index: u32,
    pub flags: vk::QueueFlags,
    pub queue_count: u32,
}

impl QueueFamilyInfo {
    pub fn supports_graphics(&self) -> bool {
        self.flags.contains(vk::QueueFlags::GRAPHICS)
    }

    pub fn supports_compute(&self) -> bool {
        self.flags.contains(vk::QueueFlags::COMPUTE)
    }
}

/// Snapshot of one physical device, queried fresh on every enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalDeviceInfo {
    pub handle: vk::PhysicalDevice,
    pub name: String,
    pub device_type: vk::PhysicalDeviceType,
    pub api_version: u32,
    pub features: DeviceFeatures,
    pub queue_families: Vec<QueueFamilyInfo>,
}

/// The chosen device and queue family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub physical_device: vk::PhysicalDevice,
    pub device_name: String,
    pub queue_family_index: u32,
}

/// The fixed requirement a (device, queue family) pair must meet.
pub fn meets_requirements(device: &PhysicalDeviceInfo, family: &QueueFamilyInfo) -> bool {
    device.features.geometry_shader && device.features.tessellation_shader && family.supports_graphics()
}

/// Enumerate physical devices and describe each of them.
pub fn enumerate_physical_devices<B: Backend>(
    backend: &B,
    instance: vk::Instance,
) -> Result<Vec<PhysicalDeviceInfo>, BootstrapError> {
    let handles = enumerate_two_call("vkEnumeratePhysicalDevices", |count, out| {
        backend.enumerate_physical_devices(instance, count, out)
    })?;
    log::info!("Vulkan API found [{}] physical device(s)", handles.len());

    Ok(handles
        .into_iter()
        .map(|handle| describe_device(backend, handle))
        .collect())
}

fn describe_device<B: Backend>(backend: &B, handle: vk::PhysicalDevice) -> PhysicalDeviceInfo {
    let properties = backend.physical_device_properties(handle);
    let features = backend.physical_device_features(handle);

    let queue_families: Vec<_> = backend
        .queue_family_properties(handle)
        .iter()
        .zip(0u32..)
        .map(|(props, index)| QueueFamilyInfo {
            index,
            flags: props.queue_flags,
            queue_count: props.queue_count,
        })
        .collect();

    PhysicalDeviceInfo {
        handle,
        name: string_from_raw(&properties.device_name),
        device_type: properties.device_type,
        api_version: properties.api_version,
        features: DeviceFeatures::from(&features),
        queue_families,
    }
}

/// Select a device and queue family with the fixed requirement.
pub fn select(devices: &[PhysicalDeviceInfo]) -> Option<Selection> {
    select_with(devices, meets_requirements)
}

/// Select with a custom predicate. The last matching pair wins; `None`
/// means nothing matched.
pub fn select_with<P>(devices: &[PhysicalDeviceInfo], predicate: P) -> Option<Selection>
where
    P: Fn(&PhysicalDeviceInfo, &QueueFamilyInfo) -> bool,
{
    let mut selection = None;

    for device in devices {
        log::info!("\t{} ({:?})", device.name, device.device_type);
        log::info!("\t\tsupports geometry shader:\t{}", device.features.geometry_shader);
        log::info!("\t\tsupports tessellation shader:\t{}", device.features.tessellation_shader);
        log::debug!(
            "\t\tAPI version: {}.{}.{}",
            vk::api_version_major(device.api_version),
            vk::api_version_minor(device.api_version),
            vk::api_version_patch(device.api_version)
        );
        log::info!("\t[{}] queue families", device.queue_families.len());

        for family in &device.queue_families {
            log::debug!("\tqueue-family: {} ({} queue(s))", family.index, family.queue_count);
            log::debug!("\t\tsupports graphics:\t{}", family.supports_graphics());
            log::debug!("\t\tsupports compute:\t{}", family.supports_compute());

            if predicate(device, family) {
                selection = Some(Selection {
                    physical_device: device.handle,
                    device_name: device.name.clone(),
                    queue_family_index: family.index,
                });
            }
        }
    }

    match &selection {
        Some(selected) => log::info!(
            "Selected GPU: {} (queue family {})",
            selected.device_name,
            selected.queue_family_index
        ),
        None => log::warn!("No physical device meets the requirements"),
    }

    selection
}
