// Window surface - binds the instance to a native window
//
// The platform creation function is not linked statically: it is looked up
// with vkGetInstanceProcAddr and only exists if the instance enabled the
// matching surface extension.

use ash::vk;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use std::ffi::{c_void, CStr};
use std::ptr;

use super::{Backend, BootstrapError};

/// Window systems we can create a surface for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfacePlatform {
    Win32,
    Xlib,
    Xcb,
    Wayland,
}

impl SurfacePlatform {
    /// Instance extension that provides the creation function
    pub fn extension_name(self) -> &'static CStr {
        match self {
            Self::Win32 => ash::extensions::khr::Win32Surface::name(),
            Self::Xlib => ash::extensions::khr::XlibSurface::name(),
            Self::Xcb => ash::extensions::khr::XcbSurface::name(),
            Self::Wayland => ash::extensions::khr::WaylandSurface::name(),
        }
    }

    pub fn entry_point(self) -> &'static CStr {
        match self {
            Self::Win32 => c"vkCreateWin32SurfaceKHR",
            Self::Xlib => c"vkCreateXlibSurfaceKHR",
            Self::Xcb => c"vkCreateXcbSurfaceKHR",
            Self::Wayland => c"vkCreateWaylandSurfaceKHR",
        }
    }

    fn entry_point_name(self) -> &'static str {
        match self {
            Self::Win32 => "vkCreateWin32SurfaceKHR",
            Self::Xlib => "vkCreateXlibSurfaceKHR",
            Self::Xcb => "vkCreateXcbSurfaceKHR",
            Self::Wayland => "vkCreateWaylandSurfaceKHR",
        }
    }
}

/// Native handles handed over by the windowing side.
///
/// Each variant carries one window handle and the module/display handle the
/// platform needs alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeWindow {
    Win32 { hinstance: isize, hwnd: isize },
    Xlib { display: *mut c_void, window: std::ffi::c_ulong },
    Xcb { connection: *mut c_void, window: u32 },
    Wayland { display: *mut c_void, surface: *mut c_void },
}

impl NativeWindow {
    /// Convert raw-window-handle handles into a surface source.
    pub fn from_raw(
        display: RawDisplayHandle,
        window: RawWindowHandle,
    ) -> Result<Self, BootstrapError> {
        match (display, window) {
            (_, RawWindowHandle::Win32(handle)) => Ok(Self::Win32 {
                // winit always fills hinstance; a missing one means the current module
                hinstance: handle.hinstance.map(|h| h.get()).unwrap_or(0),
                hwnd: handle.hwnd.get(),
            }),
            (RawDisplayHandle::Xlib(display), RawWindowHandle::Xlib(handle)) => {
                let display = display
                    .display
                    .ok_or(BootstrapError::UnsupportedWindow)?;
                Ok(Self::Xlib {
                    display: display.as_ptr(),
                    window: handle.window,
                })
            }
            (RawDisplayHandle::Xcb(display), RawWindowHandle::Xcb(handle)) => {
                let connection = display
                    .connection
                    .ok_or(BootstrapError::UnsupportedWindow)?;
                Ok(Self::Xcb {
                    connection: connection.as_ptr(),
                    window: handle.window.get(),
                })
            }
            (RawDisplayHandle::Wayland(display), RawWindowHandle::Wayland(handle)) => {
                Ok(Self::Wayland {
                    display: display.display.as_ptr(),
                    surface: handle.surface.as_ptr(),
                })
            }
            _ => Err(BootstrapError::UnsupportedWindow),
        }
    }

    pub fn platform(&self) -> SurfacePlatform {
        match self {
            Self::Win32 { .. } => SurfacePlatform::Win32,
            Self::Xlib { .. } => SurfacePlatform::Xlib,
            Self::Xcb { .. } => SurfacePlatform::Xcb,
            Self::Wayland { .. } => SurfacePlatform::Wayland,
        }
    }
}

/// Create a presentation surface for `window`.
///
/// The caller must keep the native window alive until the surface is
/// destroyed.
pub fn create_surface<B: Backend>(
    backend: &B,
    instance: vk::Instance,
    window: &NativeWindow,
) -> Result<vk::SurfaceKHR, BootstrapError> {
    let platform = window.platform();
    let entry_point = platform.entry_point_name();

    // Explicitly load the platform creation function
    let function = backend
        .instance_proc_addr(instance, platform.entry_point())
        .ok_or(BootstrapError::EntryPointResolution(entry_point))?;

    let mut surface = vk::SurfaceKHR::null();

    // SAFETY: `function` was resolved by name, so it has the signature of
    // that entry point. The create infos only borrow the window handles.
    let result = unsafe {
        match *window {
            NativeWindow::Win32 { hinstance, hwnd } => {
                let create: vk::PFN_vkCreateWin32SurfaceKHR = std::mem::transmute(function);
                let create_info = vk::Win32SurfaceCreateInfoKHR::builder()
                    .hinstance(hinstance as vk::HINSTANCE)
                    .hwnd(hwnd as vk::HWND);
                create(instance, &*create_info, ptr::null(), &mut surface)
            }
            NativeWindow::Xlib { display, window } => {
                let create: vk::PFN_vkCreateXlibSurfaceKHR = std::mem::transmute(function);
                let create_info = vk::XlibSurfaceCreateInfoKHR::builder()
                    .dpy(display as *mut vk::Display)
                    .window(window as vk::Window);
                create(instance, &*create_info, ptr::null(), &mut surface)
            }
            NativeWindow::Xcb { connection, window } => {
                let create: vk::PFN_vkCreateXcbSurfaceKHR = std::mem::transmute(function);
                let create_info = vk::XcbSurfaceCreateInfoKHR::builder()
                    .connection(connection as *mut vk::xcb_connection_t)
                    .window(window as vk::xcb_window_t);
                create(instance, &*create_info, ptr::null(), &mut surface)
            }
            NativeWindow::Wayland { display, surface: wl_surface } => {
                let create: vk::PFN_vkCreateWaylandSurfaceKHR = std::mem::transmute(function);
                let create_info = vk::WaylandSurfaceCreateInfoKHR::builder()
                    .display(display as *mut vk::wl_display)
                    .surface(wl_surface as *mut vk::wl_surface);
                create(instance, &*create_info, ptr::null(), &mut surface)
            }
        }
    };

    if result != vk::Result::SUCCESS {
        return Err(BootstrapError::SurfaceCreation { entry_point, code: result });
    }

    log::info!("Created a new window surface for the application");
    Ok(surface)
}
