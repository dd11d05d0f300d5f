// Vulkan backend - ash implementation of `Backend`
//
// Holds the loader entry plus the function tables ash loads for the one
// instance and the one device this program creates. The tables are dropped
// together with the handle they belong to.

use ash::extensions::{ext::DebugUtils, khr};
use ash::prelude::VkResult;
use ash::{vk, Entry};
use std::ffi::CStr;
use std::ptr;

use super::{Backend, BootstrapError};

pub struct VulkanBackend {
    entry: Entry,
    instance: Option<ash::Instance>,
    device: Option<ash::Device>,
    surface_loader: Option<khr::Surface>,
    debug_utils: Option<DebugUtils>,
}

impl VulkanBackend {
    /// Load the Vulkan library
    pub fn load() -> Result<Self, BootstrapError> {
        let entry = unsafe { Entry::load() }
            .map_err(|err| BootstrapError::LibraryLoad(err.to_string()))?;

        Ok(Self {
            entry,
            instance: None,
            device: None,
            surface_loader: None,
            debug_utils: None,
        })
    }
}

impl Backend for VulkanBackend {
    fn enumerate_layers(
        &self,
        count: &mut u32,
        out: Option<&mut [vk::LayerProperties]>,
    ) -> vk::Result {
        let ptr = out.map_or(ptr::null_mut(), |buffer| buffer.as_mut_ptr());
        unsafe { (self.entry.fp_v1_0().enumerate_instance_layer_properties)(count, ptr) }
    }

    fn enumerate_extensions(
        &self,
        count: &mut u32,
        out: Option<&mut [vk::ExtensionProperties]>,
    ) -> vk::Result {
        let ptr = out.map_or(ptr::null_mut(), |buffer| buffer.as_mut_ptr());
        unsafe {
            (self.entry.fp_v1_0().enumerate_instance_extension_properties)(ptr::null(), count, ptr)
        }
    }

    fn create_instance(&mut self, info: &vk::InstanceCreateInfo) -> VkResult<vk::Instance> {
        let instance = unsafe { self.entry.create_instance(info, None) }?;
        let handle = instance.handle();

        self.surface_loader = Some(khr::Surface::new(&self.entry, &instance));
        self.instance = Some(instance);
        Ok(handle)
    }

    fn create_debug_messenger(
        &mut self,
        _instance: vk::Instance,
        info: &vk::DebugUtilsMessengerCreateInfoEXT,
    ) -> VkResult<vk::DebugUtilsMessengerEXT> {
        let instance = self
            .instance
            .as_ref()
            .ok_or(vk::Result::ERROR_INITIALIZATION_FAILED)?;
        let debug_utils = DebugUtils::new(&self.entry, instance);

        let messenger = unsafe { debug_utils.create_debug_utils_messenger(info, None) }?;
        self.debug_utils = Some(debug_utils);
        Ok(messenger)
    }

    fn enumerate_physical_devices(
        &self,
        instance: vk::Instance,
        count: &mut u32,
        out: Option<&mut [vk::PhysicalDevice]>,
    ) -> vk::Result {
        let Some(loaded) = self.instance.as_ref() else {
            return vk::Result::ERROR_INITIALIZATION_FAILED;
        };
        let ptr = out.map_or(ptr::null_mut(), |buffer| buffer.as_mut_ptr());
        unsafe { (loaded.fp_v1_0().enumerate_physical_devices)(instance, count, ptr) }
    }

    fn physical_device_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceProperties {
        self.instance
            .as_ref()
            .map(|instance| unsafe { instance.get_physical_device_properties(physical_device) })
            .unwrap_or_default()
    }

    fn physical_device_features(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceFeatures {
        self.instance
            .as_ref()
            .map(|instance| unsafe { instance.get_physical_device_features(physical_device) })
            .unwrap_or_default()
    }

    fn queue_family_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Vec<vk::QueueFamilyProperties> {
        self.instance
            .as_ref()
            .map(|instance| unsafe {
                instance.get_physical_device_queue_family_properties(physical_device)
            })
            .unwrap_or_default()
    }

    fn create_device(
        &mut self,
        physical_device: vk::PhysicalDevice,
        info: &vk::DeviceCreateInfo,
    ) -> VkResult<vk::Device> {
        let instance = self
            .instance
            .as_ref()
            .ok_or(vk::Result::ERROR_INITIALIZATION_FAILED)?;

        let device = unsafe { instance.create_device(physical_device, info, None) }?;
        let handle = device.handle();
        self.device = Some(device);
        Ok(handle)
    }

    fn device_queue(&self, _device: vk::Device, queue_family_index: u32, index: u32) -> vk::Queue {
        self.device
            .as_ref()
            .map(|device| unsafe { device.get_device_queue(queue_family_index, index) })
            .unwrap_or_default()
    }

    fn instance_proc_addr(&self, instance: vk::Instance, name: &CStr) -> vk::PFN_vkVoidFunction {
        unsafe { self.entry.get_instance_proc_addr(instance, name.as_ptr()) }
    }

    fn surface_support(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
        surface: vk::SurfaceKHR,
    ) -> VkResult<bool> {
        let loader = self
            .surface_loader
            .as_ref()
            .ok_or(vk::Result::ERROR_INITIALIZATION_FAILED)?;
        unsafe {
            loader.get_physical_device_surface_support(physical_device, queue_family_index, surface)
        }
    }

    fn destroy_device(&mut self, _device: vk::Device) {
        if let Some(device) = self.device.take() {
            unsafe { device.destroy_device(None) };
        }
    }

    fn destroy_surface(&mut self, _instance: vk::Instance, surface: vk::SurfaceKHR) {
        if let Some(loader) = self.surface_loader.as_ref() {
            unsafe { loader.destroy_surface(surface, None) };
        }
    }

    fn destroy_debug_messenger(
        &mut self,
        _instance: vk::Instance,
        messenger: vk::DebugUtilsMessengerEXT,
    ) {
        if let Some(debug_utils) = self.debug_utils.take() {
            unsafe { debug_utils.destroy_debug_utils_messenger(messenger, None) };
        }
    }

    fn destroy_instance(&mut self, _instance: vk::Instance) {
        self.surface_loader = None;
        self.debug_utils = None;
        if let Some(instance) = self.instance.take() {
            unsafe { instance.destroy_instance(None) };
        }
    }
}
