// =============================================================================
// VULKAN SANDBOX - Instance / device / surface bootstrap
// =============================================================================
//
// Brings Vulkan up to the point where rendering could start, and no further.
//
// STARTUP SEQUENCE:
// 1. Enumerate instance layers and extensions
// 2. Create the instance (validation + debug utils in debug builds)
// 3. Select a physical device and graphics queue family
// 4. Create the logical device and fetch its queue
// 5. Create the window surface (skipped when headless)
//
// Teardown runs the sequence backwards. Any failure prints its cause, tears
// down what exists, and exits with a failure status.
//
// =============================================================================

mod backend;
mod config;

use anyhow::{Context, Result};
use backend::{BootstrapError, GraphicsBootstrap, InstanceRequest, NativeWindow, VulkanBackend};
use config::Config;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::process::ExitCode;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowAttributes, WindowId},
};

// =============================================================================
// ENTRY POINT
// =============================================================================

fn main() -> ExitCode {
    // Load configuration from config.toml
    let (config, origin) = Config::load();

    // Initialize logging, then report how the config was loaded
    init_logging(&config);
    origin.log();
    log::debug!("Config: {:?}", config);
    log::info!("Starting Vulkan sandbox");
    log::info!(
        "Debug mode: {}",
        if backend::instance::DEBUG_MODE { "on" } else { "off" }
    );

    let outcome = if config.window.headless {
        run_headless(&config)
    } else {
        run_windowed(config)
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_failure(&err);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &Config) {
    env_logger::Builder::from_default_env()
        .filter_level(config.log_level())
        .init();
}

/// Print the fatal cause where the user sees it
fn report_failure(err: &anyhow::Error) {
    log::error!("{:#}", err);
    if let Some(code) = err.downcast_ref::<BootstrapError>().and_then(BootstrapError::code) {
        log::debug!("Vulkan result code: {}", code.as_raw());
    }
    println!("{:#}", err);
}

fn log_summary(bootstrap: &GraphicsBootstrap<VulkanBackend>) {
    if let Some(context) = bootstrap.context() {
        log::info!(
            "Instance ready ({} layer(s), {} extension(s))",
            context.enabled_layers.len(),
            context.enabled_extensions.len()
        );
    }
    if let (Some(selection), Some(device)) = (bootstrap.selection(), bootstrap.logical_device()) {
        log::info!(
            "Device: {} / queue family {} / queue {:?}",
            selection.device_name,
            device.queue_family_index,
            device.queue
        );
    }
    if let Some(surface) = bootstrap.surface() {
        log::info!("Surface: {:?}", surface);
    }
}

/// Bootstrap without a window or surface, then tear down.
fn run_headless(config: &Config) -> Result<()> {
    log::info!("Running headless");

    let mut bootstrap = GraphicsBootstrap::new(VulkanBackend::load()?);
    let result = bootstrap.initialize(&config.app_info(), &InstanceRequest::for_build(None), None);
    if result.is_ok() {
        log_summary(&bootstrap);
    }
    bootstrap.shutdown();

    Ok(result?)
}

fn run_windowed(config: Config) -> Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    app.shutdown();
    match app.failure.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

// =============================================================================
// APPLICATION STATE
// =============================================================================

/// Window plus the Vulkan handles bound to it.
///
/// IMPORTANT: Field order matters for Drop! The bootstrap (and with it the
/// surface) must go before the window it points into.
struct App {
    config: Config,
    bootstrap: Option<GraphicsBootstrap<VulkanBackend>>,
    window: Option<Window>,
    /// First fatal error; the event loop exits as soon as it is set
    failure: Option<anyhow::Error>,
}

impl App {
    fn new(config: Config) -> Self {
        Self {
            config,
            bootstrap: None,
            window: None,
            failure: None,
        }
    }

    fn create_window(&self, event_loop: &ActiveEventLoop) -> Result<Window> {
        let attributes = WindowAttributes::default()
            .with_title(self.config.window.title.clone())
            .with_inner_size(LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));

        event_loop
            .create_window(attributes)
            .context("Failed to create window")
    }

    /// Run the whole bootstrap against `window`.
    ///
    /// The bootstrap is stored before initialization so that a partial
    /// failure still gets torn down.
    fn init_vulkan(&mut self, window: &Window) -> Result<()> {
        let display_handle = window
            .display_handle()
            .context("Failed to get display handle")?
            .as_raw();
        let window_handle = window
            .window_handle()
            .context("Failed to get window handle")?
            .as_raw();
        let native = NativeWindow::from_raw(display_handle, window_handle)?;

        let request = InstanceRequest::for_build(Some(native.platform()));
        let app_info = self.config.app_info();

        let bootstrap = self
            .bootstrap
            .insert(GraphicsBootstrap::new(VulkanBackend::load()?));
        bootstrap.initialize(&app_info, &request, Some(&native))?;
        log_summary(bootstrap);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        if self.failure.is_none() {
            self.failure = Some(err);
        }
        event_loop.exit();
    }

    /// Tear down Vulkan first, then close the window.
    fn shutdown(&mut self) {
        if let Some(mut bootstrap) = self.bootstrap.take() {
            bootstrap.shutdown();
        }
        self.window = None;
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.failure.is_some() {
            return;
        }

        let window = match self.create_window(event_loop) {
            Ok(window) => window,
            Err(err) => return self.fail(event_loop, err),
        };

        if let Err(err) = self.init_vulkan(&window) {
            // Surface (if any) is released before the window drops
            if let Some(mut bootstrap) = self.bootstrap.take() {
                bootstrap.shutdown();
            }
            return self.fail(event_loop, err);
        }

        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested");
                event_loop.exit();
            }
            WindowEvent::Destroyed => event_loop.exit(),
            _ => {}
        }
    }
}
