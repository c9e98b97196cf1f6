//! Vulkan loader ICD manifest.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Manifest schema version the loader understands.
pub const FILE_FORMAT_VERSION: &str = "1.0.0";

/// Vulkan API version the driver implements, as the manifest spells it.
pub const API_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcdManifest {
    pub file_format_version: String,
    #[serde(rename = "ICD")]
    pub icd: IcdEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcdEntry {
    pub library_path: String,
    pub api_version: String,
}

impl IcdManifest {
    pub fn new(library_path: &Path) -> Self {
        Self {
            file_format_version: FILE_FORMAT_VERSION.to_string(),
            icd: IcdEntry {
                library_path: library_path.display().to_string(),
                api_version: API_VERSION.to_string(),
            },
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// The driver library next to the running executable, where cargo puts it.
pub fn default_library_path() -> PathBuf {
    let name = nulldrv_common::platform::driver_library_name();
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(name)))
        .unwrap_or_else(|| PathBuf::from(name))
}
