// In-memory backend for tests
//
// Reports a configurable set of layers, extensions and physical devices,
// rejects instance creation the way the loader does when a requested name is
// missing, and records every create/destroy call in order.

use ash::prelude::VkResult;
use ash::vk::{self, Handle};
use std::cell::Cell;
use std::ffi::{c_char, CStr};

use super::Backend;

/// hwnd value the fake Win32 entry point refuses
pub const REJECTED_HWND: isize = 0xdead;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateInstance {
        application_name: String,
        layers: Vec<String>,
        extensions: Vec<String>,
    },
    CreateDebugMessenger,
    CreateDevice {
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
        queue_priorities: Vec<f32>,
        layers: Vec<String>,
        extension_count: u32,
        features_enabled: bool,
    },
    DestroyDevice,
    DestroySurface,
    DestroyDebugMessenger,
    DestroyInstance,
}

#[derive(Debug, Clone)]
pub struct MockDevice {
    name: String,
    geometry_shader: bool,
    tessellation_shader: bool,
    queue_families: Vec<vk::QueueFlags>,
}

impl MockDevice {
    /// A device without optional features or queue families
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            geometry_shader: false,
            tessellation_shader: false,
            queue_families: Vec::new(),
        }
    }

    /// Geometry + tessellation support and a single graphics queue family
    pub fn capable(name: &str) -> Self {
        Self {
            geometry_shader: true,
            tessellation_shader: true,
            queue_families: vec![vk::QueueFlags::GRAPHICS],
            ..Self::new(name)
        }
    }

    pub fn queue_families(mut self, families: &[vk::QueueFlags]) -> Self {
        self.queue_families = families.to_vec();
        self
    }
}

#[derive(Debug, Default)]
pub struct MockBackend {
    layers: Vec<String>,
    extensions: Vec<String>,
    devices: Vec<MockDevice>,
    hidden_layers: Cell<u32>,
    device_enumeration_failure: Option<vk::Result>,
    messenger_failure: Option<vk::Result>,
    device_failure: Option<vk::Result>,
    no_surface_entry_points: bool,
    surface_support: Option<VkResult<bool>>,
    pub calls: Vec<Call>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instance_handle() -> vk::Instance {
        vk::Instance::from_raw(0x1000)
    }

    pub fn physical_device_handle(index: usize) -> vk::PhysicalDevice {
        vk::PhysicalDevice::from_raw(0x2000 + index as u64)
    }

    pub fn with_layers(mut self, names: &[&str]) -> Self {
        self.layers = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_extensions(mut self, names: &[&str]) -> Self {
        self.extensions = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_device(mut self, device: MockDevice) -> Self {
        self.devices.push(device);
        self
    }

    /// Hide `count` layers from the first count query only.
    pub fn with_layer_growth(self, count: u32) -> Self {
        self.hidden_layers.set(count);
        self
    }

    pub fn with_device_enumeration_failure(mut self, code: vk::Result) -> Self {
        self.device_enumeration_failure = Some(code);
        self
    }

    pub fn with_messenger_failure(mut self, code: vk::Result) -> Self {
        self.messenger_failure = Some(code);
        self
    }

    pub fn with_device_failure(mut self, code: vk::Result) -> Self {
        self.device_failure = Some(code);
        self
    }

    pub fn without_surface_entry_points(mut self) -> Self {
        self.no_surface_entry_points = true;
        self
    }

    /// Answer for presentation support queries; `Ok(true)` when unset
    pub fn with_surface_support(mut self, support: VkResult<bool>) -> Self {
        self.surface_support = Some(support);
        self
    }

    fn device(&self, handle: vk::PhysicalDevice) -> Option<&MockDevice> {
        let index = handle.as_raw().checked_sub(0x2000)? as usize;
        self.devices.get(index)
    }
}

fn write_name(dst: &mut [c_char], name: &str) {
    let len = name.len().min(dst.len() - 1);
    for (d, s) in dst.iter_mut().zip(&name.as_bytes()[..len]) {
        *d = *s as c_char;
    }
    dst[len] = 0;
}

/// Copy a name list out of a create info.
unsafe fn read_names(names: *const *const c_char, count: u32) -> Vec<String> {
    if count == 0 || names.is_null() {
        return Vec::new();
    }
    std::slice::from_raw_parts(names, count as usize)
        .iter()
        .map(|&name| CStr::from_ptr(name).to_string_lossy().into_owned())
        .collect()
}

/// Shared count-then-fill behaviour for in-memory lists
fn fill<T: Copy>(items: &[T], count: &mut u32, out: Option<&mut [T]>) -> vk::Result {
    match out {
        None => {
            *count = items.len() as u32;
            vk::Result::SUCCESS
        }
        Some(buffer) => {
            let written = buffer.len().min(items.len());
            buffer[..written].copy_from_slice(&items[..written]);
            *count = written as u32;
            if written < items.len() {
                vk::Result::INCOMPLETE
            } else {
                vk::Result::SUCCESS
            }
        }
    }
}

unsafe extern "system" fn fake_create_win32_surface(
    _instance: vk::Instance,
    p_create_info: *const vk::Win32SurfaceCreateInfoKHR,
    _p_allocator: *const vk::AllocationCallbacks,
    p_surface: *mut vk::SurfaceKHR,
) -> vk::Result {
    if (*p_create_info).hwnd as isize == REJECTED_HWND {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }
    *p_surface = vk::SurfaceKHR::from_raw(0x5000);
    vk::Result::SUCCESS
}

unsafe extern "system" fn fake_create_xlib_surface(
    _instance: vk::Instance,
    _p_create_info: *const vk::XlibSurfaceCreateInfoKHR,
    _p_allocator: *const vk::AllocationCallbacks,
    p_surface: *mut vk::SurfaceKHR,
) -> vk::Result {
    *p_surface = vk::SurfaceKHR::from_raw(0x5001);
    vk::Result::SUCCESS
}

impl Backend for MockBackend {
    fn enumerate_layers(
        &self,
        count: &mut u32,
        out: Option<&mut [vk::LayerProperties]>,
    ) -> vk::Result {
        let all: Vec<_> = self
            .layers
            .iter()
            .map(|name| {
                let mut props = vk::LayerProperties::default();
                write_name(&mut props.layer_name, name);
                write_name(&mut props.description, "mock layer");
                props
            })
            .collect();

        if out.is_none() {
            let hidden = self.hidden_layers.replace(0) as usize;
            let visible = all.len().saturating_sub(hidden);
            return fill(&all[..visible], count, None);
        }
        fill(&all, count, out)
    }

    fn enumerate_extensions(
        &self,
        count: &mut u32,
        out: Option<&mut [vk::ExtensionProperties]>,
    ) -> vk::Result {
        let all: Vec<_> = self
            .extensions
            .iter()
            .map(|name| {
                let mut props = vk::ExtensionProperties::default();
                write_name(&mut props.extension_name, name);
                props.spec_version = 1;
                props
            })
            .collect();
        fill(&all, count, out)
    }

    fn create_instance(&mut self, info: &vk::InstanceCreateInfo) -> VkResult<vk::Instance> {
        let (layers, extensions, application_name) = unsafe {
            let app = &*info.p_application_info;
            (
                read_names(info.pp_enabled_layer_names, info.enabled_layer_count),
                read_names(info.pp_enabled_extension_names, info.enabled_extension_count),
                CStr::from_ptr(app.p_application_name).to_string_lossy().into_owned(),
            )
        };

        if layers.iter().any(|name| !self.layers.contains(name)) {
            return Err(vk::Result::ERROR_LAYER_NOT_PRESENT);
        }
        if extensions.iter().any(|name| !self.extensions.contains(name)) {
            return Err(vk::Result::ERROR_EXTENSION_NOT_PRESENT);
        }

        self.calls.push(Call::CreateInstance {
            application_name,
            layers,
            extensions,
        });
        Ok(Self::instance_handle())
    }

    fn create_debug_messenger(
        &mut self,
        _instance: vk::Instance,
        info: &vk::DebugUtilsMessengerCreateInfoEXT,
    ) -> VkResult<vk::DebugUtilsMessengerEXT> {
        assert!(info.pfn_user_callback.is_some());
        if let Some(code) = self.messenger_failure {
            return Err(code);
        }
        self.calls.push(Call::CreateDebugMessenger);
        Ok(vk::DebugUtilsMessengerEXT::from_raw(0x3000))
    }

    fn enumerate_physical_devices(
        &self,
        _instance: vk::Instance,
        count: &mut u32,
        out: Option<&mut [vk::PhysicalDevice]>,
    ) -> vk::Result {
        if let Some(code) = self.device_enumeration_failure {
            return code;
        }
        let handles: Vec<_> = (0..self.devices.len())
            .map(Self::physical_device_handle)
            .collect();
        fill(&handles, count, out)
    }

    fn physical_device_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceProperties {
        let mut props = vk::PhysicalDeviceProperties::default();
        if let Some(device) = self.device(physical_device) {
            write_name(&mut props.device_name, &device.name);
            props.device_type = vk::PhysicalDeviceType::DISCRETE_GPU;
            props.api_version = vk::API_VERSION_1_0;
        }
        props
    }

    fn physical_device_features(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceFeatures {
        let mut features = vk::PhysicalDeviceFeatures::default();
        if let Some(device) = self.device(physical_device) {
            features.geometry_shader = device.geometry_shader.into();
            features.tessellation_shader = device.tessellation_shader.into();
        }
        features
    }

    fn queue_family_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Vec<vk::QueueFamilyProperties> {
        self.device(physical_device)
            .map(|device| {
                device
                    .queue_families
                    .iter()
                    .map(|&queue_flags| vk::QueueFamilyProperties {
                        queue_flags,
                        queue_count: 1,
                        ..Default::default()
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn create_device(
        &mut self,
        physical_device: vk::PhysicalDevice,
        info: &vk::DeviceCreateInfo,
    ) -> VkResult<vk::Device> {
        if let Some(code) = self.device_failure {
            return Err(code);
        }

        let call = unsafe {
            let queue = &*info.p_queue_create_infos;
            let priorities =
                std::slice::from_raw_parts(queue.p_queue_priorities, queue.queue_count as usize);
            let features = &*info.p_enabled_features;
            Call::CreateDevice {
                physical_device,
                queue_family_index: queue.queue_family_index,
                queue_priorities: priorities.to_vec(),
                layers: read_names(info.pp_enabled_layer_names, info.enabled_layer_count),
                extension_count: info.enabled_extension_count,
                features_enabled: features.geometry_shader == vk::TRUE
                    || features.tessellation_shader == vk::TRUE
                    || features.sampler_anisotropy == vk::TRUE,
            }
        };
        assert_eq!(info.queue_create_info_count, 1);

        self.calls.push(call);
        Ok(vk::Device::from_raw(0x4000))
    }

    fn device_queue(&self, _device: vk::Device, queue_family_index: u32, index: u32) -> vk::Queue {
        vk::Queue::from_raw(0x4100 + ((queue_family_index as u64) << 4) + index as u64)
    }

    fn instance_proc_addr(&self, _instance: vk::Instance, name: &CStr) -> vk::PFN_vkVoidFunction {
        if self.no_surface_entry_points {
            return None;
        }
        unsafe {
            match name.to_bytes() {
                b"vkCreateWin32SurfaceKHR" => {
                    let f: vk::PFN_vkCreateWin32SurfaceKHR = fake_create_win32_surface;
                    Some(std::mem::transmute::<_, unsafe extern "system" fn()>(f))
                }
                b"vkCreateXlibSurfaceKHR" => {
                    let f: vk::PFN_vkCreateXlibSurfaceKHR = fake_create_xlib_surface;
                    Some(std::mem::transmute::<_, unsafe extern "system" fn()>(f))
                }
                _ => None,
            }
        }
    }

    fn surface_support(
        &self,
        _physical_device: vk::PhysicalDevice,
        _queue_family_index: u32,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<bool> {
        self.surface_support.unwrap_or(Ok(true))
    }

    fn destroy_device(&mut self, _device: vk::Device) {
        self.calls.push(Call::DestroyDevice);
    }

    fn destroy_surface(&mut self, _instance: vk::Instance, _surface: vk::SurfaceKHR) {
        self.calls.push(Call::DestroySurface);
    }

    fn destroy_debug_messenger(
        &mut self,
        _instance: vk::Instance,
        _messenger: vk::DebugUtilsMessengerEXT,
    ) {
        self.calls.push(Call::DestroyDebugMessenger);
    }

    fn destroy_instance(&mut self, _instance: vk::Instance) {
        self.calls.push(Call::DestroyInstance);
    }
}
