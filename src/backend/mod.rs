// Backend module - Vulkan bootstrap layer
//
// Design: every call into Vulkan goes through the `Backend` trait. The real
// implementation (`VulkanBackend`) is a thin wrapper around ash; tests drive
// the same bootstrap logic through an in-memory mock.
//
// Acquisition order (teardown runs it backwards):
//   capabilities -> instance -> physical device selection -> logical device -> surface

pub mod bootstrap;
pub mod capabilities;
pub mod device;
pub mod error;
pub mod instance;
pub mod result;
pub mod selector;
pub mod surface;
pub mod vulkan;

#[cfg(test)]
pub mod mock;

use ash::prelude::VkResult;
use ash::vk;
use std::ffi::CStr;

pub use bootstrap::GraphicsBootstrap;
pub use error::BootstrapError;
pub use instance::{AppInfo, InstanceRequest};
pub use surface::NativeWindow;
pub use vulkan::VulkanBackend;

/// The Vulkan primitives the bootstrap needs.
///
/// Enumeration methods follow the two-call protocol: `out == None` queries
/// the count, `Some(buffer)` fills at most `buffer.len()` records and writes
/// the number actually filled back into `count`.
pub trait Backend {
    fn enumerate_layers(
        &self,
        count: &mut u32,
        out: Option<&mut [vk::LayerProperties]>,
    ) -> vk::Result;

    fn enumerate_extensions(
        &self,
        count: &mut u32,
        out: Option<&mut [vk::ExtensionProperties]>,
    ) -> vk::Result;

    fn create_instance(&mut self, info: &vk::InstanceCreateInfo) -> VkResult<vk::Instance>;

    fn create_debug_messenger(
        &mut self,
        instance: vk::Instance,
        info: &vk::DebugUtilsMessengerCreateInfoEXT,
    ) -> VkResult<vk::DebugUtilsMessengerEXT>;

    fn enumerate_physical_devices(
        &self,
        instance: vk::Instance,
        count: &mut u32,
        out: Option<&mut [vk::PhysicalDevice]>,
    ) -> vk::Result;

    fn physical_device_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceProperties;

    fn physical_device_features(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceFeatures;

    fn queue_family_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Vec<vk::QueueFamilyProperties>;

    fn create_device(
        &mut self,
        physical_device: vk::PhysicalDevice,
        info: &vk::DeviceCreateInfo,
    ) -> VkResult<vk::Device>;

    fn device_queue(&self, device: vk::Device, queue_family_index: u32, index: u32) -> vk::Queue;

    /// `vkGetInstanceProcAddr`
    fn instance_proc_addr(&self, instance: vk::Instance, name: &CStr) -> vk::PFN_vkVoidFunction;

    fn surface_support(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
        surface: vk::SurfaceKHR,
    ) -> VkResult<bool>;

    fn destroy_device(&mut self, device: vk::Device);

    fn destroy_surface(&mut self, instance: vk::Instance, surface: vk::SurfaceKHR);

    fn destroy_debug_messenger(
        &mut self,
        instance: vk::Instance,
        messenger: vk::DebugUtilsMessengerEXT,
    );

    fn destroy_instance(&mut self, instance: vk::Instance);
}
