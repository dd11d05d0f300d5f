// Bootstrap errors
//
// Every failure is fatal for the bootstrap. The backend code returns these
// upward and only main decides to terminate.

use ash::vk;
use thiserror::Error;

use super::result::describe;

/// A failed bootstrap step.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BootstrapError {
    /// The Vulkan loader library could not be opened
    #[error("Failed to load Vulkan library: {0}. Is Vulkan installed?")]
    LibraryLoad(String),

    /// A count or fill call of a two-call enumeration was rejected
    #[error("{call} failed: {}", describe_code(.code))]
    Enumeration { call: &'static str, code: vk::Result },

    #[error("vkCreateInstance failed: {}", describe_code(.0))]
    ContextCreation(vk::Result),

    #[error("vkCreateDebugUtilsMessengerEXT failed: {}", describe_code(.0))]
    DebugMessengerCreation(vk::Result),

    /// No physical device and queue family satisfied the requirements
    #[error("No physical device with a graphics queue and geometry + tessellation shader support")]
    NoSuitableDevice,

    #[error("vkCreateDevice failed: {}", describe_code(.0))]
    DeviceCreation(vk::Result),

    /// The platform surface entry point could not be resolved
    #[error("vkGetInstanceProcAddr failed: unable to find {0}.")]
    EntryPointResolution(&'static str),

    #[error("{entry_point} failed: {}", describe_code(.code))]
    SurfaceCreation {
        entry_point: &'static str,
        code: vk::Result,
    },

    #[error("Unsupported window handle type")]
    UnsupportedWindow,

    /// A step ran before the handle it depends on existed
    #[error("Cannot continue bootstrap: {0} has not been created")]
    MissingDependency(&'static str),

    #[error("Cannot continue bootstrap: {0} was already created")]
    AlreadyCreated(&'static str),
}

fn describe_code(code: &vk::Result) -> String {
    describe(*code)
}

impl BootstrapError {
    /// Backend result code behind this error, if any.
    pub fn code(&self) -> Option<vk::Result> {
        match self {
            Self::Enumeration { code, .. } | Self::SurfaceCreation { code, .. } => Some(*code),
            Self::ContextCreation(code)
            | Self::DebugMessengerCreation(code)
            | Self::DeviceCreation(code) => Some(*code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_uses_description() {
        let err = BootstrapError::ContextCreation(vk::Result::ERROR_LAYER_NOT_PRESENT);
        assert_eq!(
            err.to_string(),
            "vkCreateInstance failed: A requested layer is not present or could not be loaded."
        );
        assert_eq!(err.code(), Some(vk::Result::ERROR_LAYER_NOT_PRESENT));
    }

    #[test]
    fn test_enumeration_message_names_call() {
        let err = BootstrapError::Enumeration {
            call: "vkEnumeratePhysicalDevices",
            code: vk::Result::ERROR_OUT_OF_HOST_MEMORY,
        };
        assert_eq!(
            err.to_string(),
            "vkEnumeratePhysicalDevices failed: A host memory allocation has failed."
        );
    }

    #[test]
    fn test_entry_point_message() {
        let err = BootstrapError::EntryPointResolution("vkCreateWin32SurfaceKHR");
        assert_eq!(
            err.to_string(),
            "vkGetInstanceProcAddr failed: unable to find vkCreateWin32SurfaceKHR."
        );
        assert_eq!(err.code(), None);
    }
}
