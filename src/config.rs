// =============================================================================
// CONFIGURATION - Load settings from config.toml
// =============================================================================
//
// This module handles loading and parsing configuration from config.toml.
// Provides sensible defaults if config file is missing or has errors.
//
// The debug-mode switch (validation layers) is NOT configurable here: it is
// fixed at compile time, see `backend::instance::DEBUG_MODE`.

use anyhow::{Context, Result};
use ash::vk;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::backend::AppInfo;

/// Root configuration structure
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub application: ApplicationConfig,
    pub window: WindowConfig,
    pub logging: LoggingConfig,
}

/// Values passed to vkCreateInstance as application info
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    pub name: String,
    pub engine_name: String,
    /// [major, minor, patch]
    pub version: [u32; 3],
    pub engine_version: [u32; 3],
    pub api_version: [u32; 3],
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "Vulkan Sandbox".to_string(),
            engine_name: "Vulkan Sandbox Engine".to_string(),
            version: [1, 0, 0],
            engine_version: [1, 0, 0],
            api_version: [1, 0, 0],
        }
    }
}

/// Window settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Skip the window and the surface entirely
    pub headless: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Winapi - Sandbox".to_string(),
            width: 800,
            height: 600,
            headless: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Where the active configuration came from.
///
/// Loading happens before the logger exists, so `main` logs this afterwards.
#[derive(Debug)]
pub enum ConfigOrigin {
    File(PathBuf),
    Missing(PathBuf),
    /// The file exists but could not be used; defaults are active
    Invalid { path: PathBuf, reason: String },
}

impl ConfigOrigin {
    pub fn log(&self) {
        match self {
            Self::File(path) => log::info!("Loaded configuration from {:?}", path),
            Self::Missing(path) => {
                log::info!("Config file not found at {:?}, using defaults", path)
            }
            Self::Invalid { path, reason } => log::warn!(
                "Failed to load {:?}: {}. Using defaults.",
                path,
                reason
            ),
        }
    }
}

impl Config {
    /// Load config.toml, falling back to defaults if missing or broken
    pub fn load() -> (Self, ConfigOrigin) {
        Self::load_or_default("config.toml")
    }

    pub fn load_or_default<P: AsRef<Path>>(path: P) -> (Self, ConfigOrigin) {
        let path = path.as_ref();

        if !path.exists() {
            return (Config::default(), ConfigOrigin::Missing(path.to_path_buf()));
        }

        match Self::load_from_path(path) {
            Ok(config) => (config, ConfigOrigin::File(path.to_path_buf())),
            Err(e) => (
                Config::default(),
                ConfigOrigin::Invalid {
                    path: path.to_path_buf(),
                    reason: format!("{:#}", e),
                },
            ),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        Self::parse(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Application info for instance creation
    pub fn app_info(&self) -> AppInfo {
        let app = &self.application;
        AppInfo {
            application_name: app.name.clone(),
            application_version: version(app.version),
            engine_name: app.engine_name.clone(),
            engine_version: version(app.engine_version),
            api_version: version(app.api_version),
        }
    }

    /// Get log level as a `log` filter
    pub fn log_level(&self) -> log::LevelFilter {
        log::LevelFilter::from_str(&self.logging.level).unwrap_or_else(|_| {
            // Logging is not up yet when this runs
            eprintln!(
                "Unknown log level '{}', defaulting to info",
                self.logging.level
            );
            log::LevelFilter::Info
        })
    }
}

fn version([major, minor, patch]: [u32; 3]) -> u32 {
    vk::make_api_version(0, major, minor, patch)
}
