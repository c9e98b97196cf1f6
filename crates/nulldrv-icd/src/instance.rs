//! Vulkan instance and enumeration functions.

use std::ffi::c_char;

use ash::vk;
use ash::vk::Handle;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::DriverError;
use crate::extension;
use crate::object::{self, NullObject, ObjectKind, Owned};
use crate::physical_device::PhysicalDevice;
use crate::util::{self, read_string_array};

pub struct Instance {
    gpu: Mutex<Option<Owned<PhysicalDevice>>>,
}

impl NullObject for Instance {
    const KIND: ObjectKind = ObjectKind::Instance;
}

impl Instance {
    pub fn new() -> Self {
        Self {
            gpu: Mutex::new(None),
        }
    }

    /// The instance's only physical device, created on first enumeration
    /// and kept until the instance is destroyed.
    pub fn physical_device(
        &self,
        instance: vk::Instance,
    ) -> Result<vk::PhysicalDevice, DriverError> {
        let mut gpu = self.gpu.lock();
        if let Some(existing) = gpu.as_ref() {
            return Ok(existing.handle());
        }
        let created = Owned::new(object::header_ptr(instance), PhysicalDevice::new())?;
        let handle = created.handle();
        *gpu = Some(created);
        Ok(handle)
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/// Create the bootstrap object every other call hangs off.
pub fn create_instance() -> Result<Owned<Instance>, DriverError> {
    crate::config();
    Owned::new(None, Instance::new())
}

#[no_mangle]
pub unsafe extern "system" fn vkCreateInstance(
    p_create_info: *const vk::InstanceCreateInfo<'_>,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
    p_instance: *mut vk::Instance,
) -> vk::Result {
    if p_create_info.is_null() || p_instance.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }

    let ci = &*p_create_info;
    let enabled = read_string_array(ci.pp_enabled_extension_names, ci.enabled_extension_count);
    debug!(extensions = ?enabled, "vkCreateInstance");

    match create_instance() {
        Ok(instance) => {
            *p_instance = instance.into_handle();
            vk::Result::SUCCESS
        }
        Err(e) => e.into(),
    }
}

#[no_mangle]
pub unsafe extern "system" fn vkDestroyInstance(
    instance: vk::Instance,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
) {
    object::destroy::<Instance>(instance);
}

#[no_mangle]
pub unsafe extern "system" fn vkEnumeratePhysicalDevices(
    instance: vk::Instance,
    p_physical_device_count: *mut u32,
    p_physical_devices: *mut vk::PhysicalDevice,
) -> vk::Result {
    if p_physical_device_count.is_null() || instance.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }

    let inst = object::decode::<Instance>(instance);
    match inst.body.physical_device(instance) {
        Ok(gpu) => util::enumerate(&[gpu], p_physical_device_count, p_physical_devices),
        Err(e) => e.into(),
    }
}

#[no_mangle]
pub unsafe extern "system" fn vkEnumerateInstanceExtensionProperties(
    _p_layer_name: *const c_char,
    p_property_count: *mut u32,
    p_properties: *mut vk::ExtensionProperties,
) -> vk::Result {
    util::enumerate(&extension::properties(), p_property_count, p_properties)
}

#[no_mangle]
pub unsafe extern "system" fn vkEnumerateInstanceLayerProperties(
    p_property_count: *mut u32,
    p_properties: *mut vk::LayerProperties,
) -> vk::Result {
    util::enumerate(&[], p_property_count, p_properties)
}

#[no_mangle]
pub unsafe extern "system" fn vkEnumerateInstanceVersion(p_api_version: *mut u32) -> vk::Result {
    if p_api_version.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }
    *p_api_version = vk::API_VERSION_1_0;
    vk::Result::SUCCESS
}
