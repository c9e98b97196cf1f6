use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "NULLDRV_CONFIG";

/// Top-level driver configuration, loaded from nulldrv.toml.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NulldrvConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub swapchain: SwapchainConfig,
    #[serde(default)]
    pub faults: FaultConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// tracing filter directive used when NULLDRV_LOG is unset
    #[serde(default = "default_filter")]
    pub filter: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Name reported in VkPhysicalDeviceProperties
    #[serde(default = "default_device_name")]
    pub name: String,
    #[serde(default)]
    pub vendor_id: u32,
    #[serde(default)]
    pub device_id: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapchainConfig {
    /// Images backing every swapchain (at least 1)
    #[serde(default = "default_image_count")]
    pub image_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaultConfig {
    /// Fail the allocation that follows this many successful ones
    pub fail_allocation_after: Option<u64>,
}

impl Default for NulldrvConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            device: DeviceConfig::default(),
            swapchain: SwapchainConfig::default(),
            faults: FaultConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: default_device_name(),
            vendor_id: 0,
            device_id: 0,
        }
    }
}

impl Default for SwapchainConfig {
    fn default() -> Self {
        Self {
            image_count: default_image_count(),
        }
    }
}

impl NulldrvConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, CoreError> {
        let config: NulldrvConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load configuration if the file exists. A missing file is `Ok(None)`;
    /// an unreadable or invalid one is an error.
    pub fn load_optional(path: &Path) -> Result<Option<Self>, CoreError> {
        match Self::load(path) {
            Ok(config) => Ok(Some(config)),
            Err(CoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Render the configuration back to TOML.
    pub fn to_toml_string(&self) -> Result<String, CoreError> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<(), CoreError> {
        if self.swapchain.image_count == 0 {
            return Err(CoreError::ConfigError(
                "swapchain.image_count must be at least 1".to_string(),
            ));
        }
        if self.device.name.len() >= 256 {
            return Err(CoreError::ConfigError(
                "device.name must be shorter than 256 bytes".to_string(),
            ));
        }
        Ok(())
    }
}

/// Returns the config file path the driver reads.
/// Search order:
/// 1. `NULLDRV_CONFIG`, when set
/// 2. System-wide config: `%PROGRAMDATA%\nulldrv\nulldrv.toml` (Windows) or `/etc/nulldrv/nulldrv.toml`
/// 3. Local fallback: `./nulldrv.toml`
pub fn default_config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    #[cfg(windows)]
    {
        let programdata = std::env::var("PROGRAMDATA")
            .unwrap_or_else(|_| r"C:\ProgramData".to_string());
        let system_path = PathBuf::from(programdata).join("nulldrv").join("nulldrv.toml");
        if system_path.exists() {
            return system_path;
        }
    }
    #[cfg(not(windows))]
    {
        let system_path = Path::new("/etc/nulldrv/nulldrv.toml");
        if system_path.exists() {
            return system_path.to_path_buf();
        }
    }
    PathBuf::from("nulldrv.toml")
}

fn default_filter() -> String {
    "off".to_string()
}

fn default_device_name() -> String {
    "nulldrv".to_string()
}

fn default_image_count() -> u32 {
    2
}
