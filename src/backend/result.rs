// Result code descriptions
//
// Maps Vulkan result codes onto the fixed, human-readable strings printed
// when a bootstrap step fails.

use ash::vk;

/// Human-readable description of a Vulkan result code.
///
/// Codes outside the table render with the raw numeric value inlined.
pub fn describe(result: vk::Result) -> String {
    let text = match result {
        vk::Result::SUCCESS => "Command successfully completed.",
        vk::Result::INCOMPLETE => "A return array was too small for the result.",
        vk::Result::ERROR_OUT_OF_HOST_MEMORY => "A host memory allocation has failed.",
        vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => "A device memory allocation has failed.",
        vk::Result::ERROR_INITIALIZATION_FAILED => {
            "Initialization of an object could not be completed."
        }
        vk::Result::ERROR_LAYER_NOT_PRESENT => {
            "A requested layer is not present or could not be loaded."
        }
        vk::Result::ERROR_EXTENSION_NOT_PRESENT => "A requested extension is not supported.",
        vk::Result::ERROR_INCOMPATIBLE_DRIVER => {
            "The requested version of Vulkan is not supported by the driver."
        }
        other => return format!("An unknown result code [{}] occurred.", other.as_raw()),
    };
    text.to_string()
}
