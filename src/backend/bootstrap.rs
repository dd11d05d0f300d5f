// Graphics bootstrap - owns every handle the startup sequence acquires
//
// Each handle lives in its own Option. A step refuses to run before the
// handle it depends on exists, and teardown destroys whatever is present,
// newest first, taking each Option so nothing is destroyed twice.

use ash::vk;

use super::device::{create_logical_device, LogicalDevice};
use super::instance::{create_context, AppInfo, Context, InstanceRequest};
use super::selector::{enumerate_physical_devices, select, Selection};
use super::surface::{create_surface, NativeWindow};
use super::{Backend, BootstrapError};

pub struct GraphicsBootstrap<B: Backend> {
    backend: B,
    context: Option<Context>,
    selection: Option<Selection>,
    device: Option<LogicalDevice>,
    surface: Option<vk::SurfaceKHR>,
}

impl<B: Backend> GraphicsBootstrap<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            context: None,
            selection: None,
            device: None,
            surface: None,
        }
    }

    /// Run the full startup sequence.
    ///
    /// The surface step only runs when a window is given. The first failure
    /// stops the sequence; handles acquired so far stay owned and are
    /// released by `shutdown`.
    pub fn initialize(
        &mut self,
        app: &AppInfo,
        request: &InstanceRequest,
        window: Option<&NativeWindow>,
    ) -> Result<(), BootstrapError> {
        log::info!("Initializing Vulkan...");

        self.create_context(app, request)?;
        if self.select_device()?.is_none() {
            return Err(BootstrapError::NoSuitableDevice);
        }
        self.create_logical_device()?;
        if let Some(window) = window {
            self.bind_surface(window)?;
        }

        log::info!("Vulkan initialized successfully!");
        Ok(())
    }

    pub fn create_context(
        &mut self,
        app: &AppInfo,
        request: &InstanceRequest,
    ) -> Result<vk::Instance, BootstrapError> {
        if self.context.is_some() {
            return Err(BootstrapError::AlreadyCreated("instance"));
        }

        let context = create_context(&mut self.backend, app, request)?;
        let handle = context.handle;
        self.context = Some(context);
        Ok(handle)
    }

    /// Pick the physical device and queue family.
    ///
    /// Returns the retained selection, `None` when nothing qualifies. Each
    /// call re-enumerates and replaces the previous selection.
    pub fn select_device(&mut self) -> Result<Option<&Selection>, BootstrapError> {
        let instance = self.instance_handle()?;
        if self.device.is_some() {
            return Err(BootstrapError::AlreadyCreated("logical device"));
        }

        log::info!("Selecting a physical device for Vulkan");
        let devices = enumerate_physical_devices(&self.backend, instance)?;
        self.selection = select(&devices);
        Ok(self.selection.as_ref())
    }

    pub fn create_logical_device(&mut self) -> Result<&LogicalDevice, BootstrapError> {
        let context = self
            .context
            .as_ref()
            .ok_or(BootstrapError::MissingDependency("instance"))?;
        if self.device.is_some() {
            return Err(BootstrapError::AlreadyCreated("logical device"));
        }
        let selection = self
            .selection
            .as_ref()
            .ok_or(BootstrapError::NoSuitableDevice)?;

        // Device layers mirror the instance request
        let layers: Vec<_> = context
            .enabled_layers
            .iter()
            .filter_map(|name| std::ffi::CString::new(name.as_str()).ok())
            .collect();

        let device = create_logical_device(&mut self.backend, selection, &layers)?;
        Ok(self.device.insert(device))
    }

    /// Create the window surface.
    ///
    /// Also reports whether the selected queue family can present to it.
    pub fn bind_surface(&mut self, window: &NativeWindow) -> Result<vk::SurfaceKHR, BootstrapError> {
        let instance = self.instance_handle()?;
        if self.surface.is_some() {
            return Err(BootstrapError::AlreadyCreated("surface"));
        }

        let surface = create_surface(&self.backend, instance, window)?;
        self.surface = Some(surface);

        if let (Some(selection), Some(_)) = (&self.selection, &self.device) {
            match self.backend.surface_support(
                selection.physical_device,
                selection.queue_family_index,
                surface,
            ) {
                Ok(true) => {}
                Ok(false) => log::warn!(
                    "Queue family {} cannot present to the window surface",
                    selection.queue_family_index
                ),
                Err(code) => log::warn!(
                    "Surface support query failed: {}",
                    super::result::describe(code)
                ),
            }
        }

        Ok(surface)
    }

    /// Release everything in reverse acquisition order.
    ///
    /// Safe to call at any point and any number of times.
    pub fn shutdown(&mut self) {
        let Some(context) = self.context.take() else {
            return;
        };

        if let Some(device) = self.device.take() {
            self.backend.destroy_device(device.handle);
            log::debug!("Destroyed logical device");
        }
        if let Some(surface) = self.surface.take() {
            self.backend.destroy_surface(context.handle, surface);
            log::debug!("Destroyed window surface");
        }
        if let Some(messenger) = context.debug_messenger {
            self.backend.destroy_debug_messenger(context.handle, messenger);
        }
        self.selection = None;

        self.backend.destroy_instance(context.handle);
        log::info!("vkDestroyInstance succeeded");
    }

    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn logical_device(&self) -> Option<&LogicalDevice> {
        self.device.as_ref()
    }

    pub fn surface(&self) -> Option<vk::SurfaceKHR> {
        self.surface
    }

    #[cfg(test)]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn instance_handle(&self) -> Result<vk::Instance, BootstrapError> {
        self.context
            .as_ref()
            .map(|context| context.handle)
            .ok_or(BootstrapError::MissingDependency("instance"))
    }
}

impl<B: Backend> Drop for GraphicsBootstrap<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
