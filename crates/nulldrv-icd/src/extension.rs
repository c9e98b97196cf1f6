//! Extensions the null driver exposes, and the formats it can present.

use std::ffi::CStr;

use ash::vk;

use crate::error::DriverError;
use crate::util::write_c_string;

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    KhrSwapchain = 0,
}

pub struct ExtensionEntry {
    pub extension: Extension,
    pub name: &'static CStr,
    pub spec_version: u32,
}

/// Indexed by `Extension` ordinal.
pub static EXTENSIONS: [ExtensionEntry; 1] = [ExtensionEntry {
    extension: Extension::KhrSwapchain,
    name: c"VK_KHR_swapchain",
    spec_version: 70,
}];

pub static PRESENTABLE_FORMATS: [vk::Format; 1] = [vk::Format::B8G8R8A8_UNORM];

impl Extension {
    pub fn name(self) -> &'static CStr {
        EXTENSIONS[self as usize].name
    }
}

/// Resolve an extension by its exact name.
pub fn lookup(name: &CStr) -> Option<Extension> {
    EXTENSIONS
        .iter()
        .find(|entry| entry.name == name)
        .map(|entry| entry.extension)
}

/// The extensions enabled on a device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtensionSet(u32);

impl ExtensionSet {
    /// Resolve every requested name, failing on the first unknown one.
    pub fn resolve(names: &[&CStr]) -> Result<Self, DriverError> {
        let mut set = Self::default();
        for name in names {
            match lookup(name) {
                Some(extension) => set.insert(extension),
                None => {
                    return Err(DriverError::ExtensionNotPresent(
                        name.to_string_lossy().into_owned(),
                    ))
                }
            }
        }
        Ok(set)
    }

    pub fn insert(&mut self, extension: Extension) {
        self.0 |= 1 << extension as u32;
    }

    pub fn contains(self, extension: Extension) -> bool {
        self.0 & (1 << extension as u32) != 0
    }
}

/// The extension table as `VkExtensionProperties`.
pub fn properties() -> Vec<vk::ExtensionProperties> {
    EXTENSIONS
        .iter()
        .map(|entry| {
            let mut props = vk::ExtensionProperties::default();
            write_c_string(entry.name.to_bytes(), &mut props.extension_name);
            props.spec_version = entry.spec_version;
            props
        })
        .collect()
}
