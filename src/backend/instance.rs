// Vulkan Instance - Context factory
//
// Responsibilities:
// - Decide which layers/extensions to request (compile-time debug gate)
// - Log what the loader offers and what we ask for
// - Create the instance, plus the debug messenger when debug utils are on

use ash::vk;
use std::ffi::{CStr, CString};

use super::capabilities::{list_extensions, list_layers};
use super::surface::SurfacePlatform;
use super::{Backend, BootstrapError};

/// Validation layers and debug extensions are requested only in debug builds.
pub const DEBUG_MODE: bool = cfg!(debug_assertions);

pub const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Application description passed to `vkCreateInstance`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfo {
    pub application_name: String,
    pub application_version: u32,
    pub engine_name: String,
    pub engine_version: u32,
    pub api_version: u32,
}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            application_name: "Vulkan Sandbox".to_string(),
            application_version: vk::make_api_version(0, 1, 0, 0),
            engine_name: "Vulkan Sandbox Engine".to_string(),
            engine_version: vk::make_api_version(0, 1, 0, 0),
            api_version: vk::API_VERSION_1_0,
        }
    }
}

/// Layers and extensions requested at instance creation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceRequest {
    pub layers: Vec<CString>,
    pub extensions: Vec<CString>,
}

impl InstanceRequest {
    /// Build the request for a given debug setting and surface platform.
    ///
    /// Debug adds the validation layer and debug utils. A surface platform
    /// adds `VK_KHR_surface` plus the platform's own surface extension, in
    /// release builds too: without them no surface could ever be created.
    /// Only a headless release build requests nothing at all.
    pub fn new(debug: bool, surface: Option<SurfacePlatform>) -> Self {
        let mut request = Self::default();

        if debug {
            request.layers.push(VALIDATION_LAYER.to_owned());
            request
                .extensions
                .push(ash::extensions::ext::DebugUtils::name().to_owned());
        }

        if let Some(platform) = surface {
            request
                .extensions
                .push(ash::extensions::khr::Surface::name().to_owned());
            request.extensions.push(platform.extension_name().to_owned());
        }

        request
    }

    /// The request this build uses.
    pub fn for_build(surface: Option<SurfacePlatform>) -> Self {
        Self::new(DEBUG_MODE, surface)
    }

    pub fn wants_debug_utils(&self) -> bool {
        let debug_utils = ash::extensions::ext::DebugUtils::name();
        self.extensions.iter().any(|ext| ext.as_c_str() == debug_utils)
    }
}

/// A live instance and everything created alongside it
#[derive(Debug)]
pub struct Context {
    pub handle: vk::Instance,
    pub debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
    pub enabled_layers: Vec<String>,
    pub enabled_extensions: Vec<String>,
}

/// Create the instance (and debug messenger when requested).
///
/// Enumerates and logs available layers/extensions first. Any rejection is
/// returned as an error; there is no fallback request.
pub fn create_context<B: Backend>(
    backend: &mut B,
    app: &AppInfo,
    request: &InstanceRequest,
) -> Result<Context, BootstrapError> {
    let layers = list_layers(backend)?;
    log::info!("Found [{}] supported Vulkan layer(s):", layers.len());
    for layer in &layers {
        log::info!("\t{}", layer.name);
        log::debug!(
            "\t\t{} (spec {}, impl {})",
            layer.description,
            layer.spec_version,
            layer.implementation_version
        );
    }

    let extensions = list_extensions(backend)?;
    log::info!("Found [{}] supported Vulkan extension(s):", extensions.len());
    for extension in &extensions {
        log::info!("\t{}", extension.name);
        log::debug!("\t\tspec version {}", extension.spec_version);
    }

    let enabled_layers = names(&request.layers);
    let enabled_extensions = names(&request.extensions);

    log::info!("Enabled [{}] validation layers:", enabled_layers.len());
    for name in &enabled_layers {
        log::info!("\t{}", name);
        if !layers.iter().any(|layer| &layer.name == name) {
            log::warn!("Requested layer {} was not reported by the loader", name);
        }
    }
    log::info!("Enabled [{}] extensions:", enabled_extensions.len());
    for name in &enabled_extensions {
        log::info!("\t{}", name);
        if !extensions.iter().any(|ext| &ext.name == name) {
            log::warn!("Requested extension {} was not reported by the loader", name);
        }
    }

    let app_name = cstring(&app.application_name);
    let engine_name = cstring(&app.engine_name);
    let app_info = vk::ApplicationInfo::builder()
        .application_name(&app_name)
        .application_version(app.application_version)
        .engine_name(&engine_name)
        .engine_version(app.engine_version)
        .api_version(app.api_version);

    let layer_ptrs: Vec<_> = request.layers.iter().map(|name| name.as_ptr()).collect();
    let extension_ptrs: Vec<_> = request.extensions.iter().map(|name| name.as_ptr()).collect();

    let create_info = vk::InstanceCreateInfo::builder()
        .application_info(&app_info)
        .enabled_layer_names(&layer_ptrs)
        .enabled_extension_names(&extension_ptrs);

    let handle = backend
        .create_instance(&create_info)
        .map_err(BootstrapError::ContextCreation)?;
    log::info!("Created a new Vulkan instance for {}", app.application_name);

    let mut context = Context {
        handle,
        debug_messenger: None,
        enabled_layers,
        enabled_extensions,
    };

    if request.wants_debug_utils() {
        match create_debug_messenger(backend, handle) {
            Ok(messenger) => context.debug_messenger = Some(messenger),
            Err(err) => {
                // The instance is live; release it before reporting.
                backend.destroy_instance(handle);
                return Err(err);
            }
        }
    }

    Ok(context)
}

fn create_debug_messenger<B: Backend>(
    backend: &mut B,
    instance: vk::Instance,
) -> Result<vk::DebugUtilsMessengerEXT, BootstrapError> {
    let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(debug_callback));

    let messenger = backend
        .create_debug_messenger(instance, &create_info)
        .map_err(BootstrapError::DebugMessengerCreation)?;
    log::debug!("Debug messenger installed");
    Ok(messenger)
}

fn names(list: &[CString]) -> Vec<String> {
    list.iter()
        .map(|name| name.to_string_lossy().into_owned())
        .collect()
}

// Interior NULs are stripped; Vulkan cannot carry them anyway.
fn cstring(text: &str) -> CString {
    CString::new(text.replace('\0', "")).unwrap_or_default()
}

// Debug callback for validation layers
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    _message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _p_user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() || (*p_callback_data).p_message.is_null() {
        return vk::FALSE;
    }
    let message = CStr::from_ptr((*p_callback_data).p_message);

    match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            log::error!("[Vulkan] {}", message.to_string_lossy());
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            log::warn!("[Vulkan] {}", message.to_string_lossy());
        }
        _ => {
            log::debug!("[Vulkan] {}", message.to_string_lossy());
        }
    }

    vk::FALSE
}
