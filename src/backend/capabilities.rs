// Capability enumeration - instance layers and extensions
//
// Both queries are callable before an instance exists. They use Vulkan's
// count-then-fill protocol: ask for the count with no buffer, then ask again
// with a buffer of that size.
//
// The set may grow between the two calls (the second call then reports
// VK_INCOMPLETE). We log that and keep what we got; there is no retry loop,
// so a set that keeps growing is never fully observed.

use ash::vk;
use std::ffi::c_char;

use super::{Backend, BootstrapError};

/// An instance layer reported by the loader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerInfo {
    pub name: String,
    pub description: String,
    pub spec_version: u32,
    pub implementation_version: u32,
}

/// An instance extension reported by the loader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionInfo {
    pub name: String,
    pub spec_version: u32,
}

/// Run a two-call enumeration.
///
/// `call` receives the in/out count and an optional output buffer, exactly
/// like the underlying `vkEnumerate*` function.
pub fn enumerate_two_call<T, F>(call_name: &'static str, mut call: F) -> Result<Vec<T>, BootstrapError>
where
    T: Default + Clone,
    F: FnMut(&mut u32, Option<&mut [T]>) -> vk::Result,
{
    let mut count = 0u32;
    let result = call(&mut count, None);
    if result != vk::Result::SUCCESS {
        return Err(BootstrapError::Enumeration { call: call_name, code: result });
    }

    let requested = count;
    let mut items = vec![T::default(); requested as usize];
    let result = call(&mut count, Some(items.as_mut_slice()));
    match result {
        vk::Result::SUCCESS => {}
        vk::Result::INCOMPLETE => {
            log::info!(
                "{} returned more entries than the [{}] counted; using the first [{}]",
                call_name,
                requested,
                count
            );
        }
        code => return Err(BootstrapError::Enumeration { call: call_name, code }),
    }

    items.truncate(count.min(requested) as usize);
    Ok(items)
}

/// List the instance layers available on this machine.
pub fn list_layers<B: Backend>(backend: &B) -> Result<Vec<LayerInfo>, BootstrapError> {
    let raw = enumerate_two_call("vkEnumerateInstanceLayerProperties", |count, out| {
        backend.enumerate_layers(count, out)
    })?;

    Ok(raw
        .iter()
        .map(|props| LayerInfo {
            name: string_from_raw(&props.layer_name),
            description: string_from_raw(&props.description),
            spec_version: props.spec_version,
            implementation_version: props.implementation_version,
        })
        .collect())
}

/// List the instance extensions available on this machine.
pub fn list_extensions<B: Backend>(backend: &B) -> Result<Vec<ExtensionInfo>, BootstrapError> {
    let raw = enumerate_two_call("vkEnumerateInstanceExtensionProperties", |count, out| {
        backend.enumerate_extensions(count, out)
    })?;

    Ok(raw
        .iter()
        .map(|props| ExtensionInfo {
            name: string_from_raw(&props.extension_name),
            spec_version: props.spec_version,
        })
        .collect())
}

/// Read a fixed-size, NUL-terminated Vulkan string field.
pub(crate) fn string_from_raw(raw: &[c_char]) -> String {
    let bytes: Vec<u8> = raw
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}
