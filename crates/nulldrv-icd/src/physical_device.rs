//! Physical device queries.
//!
//! The null GPU reports a single queue family, a single host-visible memory
//! type and zeroed limits. Format support is uniform: every format can be
//! sampled with either tiling and none can be used as a buffer.

use std::ffi::c_char;

use ash::vk;

use crate::extension;
use crate::object::{NullObject, ObjectKind};
use crate::util::{self, write_c_string};

/// Size reported for the single memory heap.
pub const HEAP_SIZE: vk::DeviceSize = 1 << 30;

pub const QUEUE_FAMILY_FLAGS: vk::QueueFlags =
    vk::QueueFlags::from_raw(vk::QueueFlags::GRAPHICS.as_raw() | vk::QueueFlags::SPARSE_BINDING.as_raw());

pub const MEMORY_TYPE_FLAGS: vk::MemoryPropertyFlags = vk::MemoryPropertyFlags::from_raw(
    vk::MemoryPropertyFlags::DEVICE_LOCAL.as_raw()
        | vk::MemoryPropertyFlags::HOST_VISIBLE.as_raw()
        | vk::MemoryPropertyFlags::HOST_COHERENT.as_raw(),
);

pub struct PhysicalDevice;

impl NullObject for PhysicalDevice {
    const KIND: ObjectKind = ObjectKind::PhysicalDevice;
}

impl PhysicalDevice {
    pub fn new() -> Self {
        Self
    }

    pub fn properties() -> vk::PhysicalDeviceProperties {
        let config = &crate::config().device;
        let mut props = vk::PhysicalDeviceProperties {
            api_version: vk::API_VERSION_1_0,
            driver_version: 0,
            vendor_id: config.vendor_id,
            device_id: config.device_id,
            device_type: vk::PhysicalDeviceType::OTHER,
            ..Default::default()
        };
        write_c_string(config.name.as_bytes(), &mut props.device_name);
        props
    }

    pub fn format_properties() -> vk::FormatProperties {
        vk::FormatProperties {
            linear_tiling_features: vk::FormatFeatureFlags::SAMPLED_IMAGE,
            optimal_tiling_features: vk::FormatFeatureFlags::SAMPLED_IMAGE,
            buffer_features: vk::FormatFeatureFlags::empty(),
        }
    }

    pub fn queue_families() -> [vk::QueueFamilyProperties; 1] {
        [vk::QueueFamilyProperties {
            queue_flags: QUEUE_FAMILY_FLAGS,
            queue_count: 1,
            timestamp_valid_bits: 0,
            min_image_transfer_granularity: vk::Extent3D {
                width: 1,
                height: 1,
                depth: 1,
            },
        }]
    }

    pub fn memory_properties() -> vk::PhysicalDeviceMemoryProperties {
        let mut props = vk::PhysicalDeviceMemoryProperties {
            memory_type_count: 1,
            memory_heap_count: 1,
            ..Default::default()
        };
        props.memory_types[0] = vk::MemoryType {
            property_flags: MEMORY_TYPE_FLAGS,
            heap_index: 0,
        };
        props.memory_heaps[0] = vk::MemoryHeap {
            size: HEAP_SIZE,
            flags: vk::MemoryHeapFlags::DEVICE_LOCAL,
        };
        props
    }
}

impl Default for PhysicalDevice {
    fn default() -> Self {
        Self::new()
    }
}

#[no_mangle]
pub unsafe extern "system" fn vkGetPhysicalDeviceProperties(
    _physical_device: vk::PhysicalDevice,
    p_properties: *mut vk::PhysicalDeviceProperties,
) {
    if p_properties.is_null() {
        return;
    }
    *p_properties = PhysicalDevice::properties();
}

#[no_mangle]
pub unsafe extern "system" fn vkGetPhysicalDeviceProperties2(
    _physical_device: vk::PhysicalDevice,
    p_properties: *mut vk::PhysicalDeviceProperties2<'_>,
) {
    if p_properties.is_null() {
        return;
    }
    (*p_properties).properties = PhysicalDevice::properties();
}

#[no_mangle]
pub unsafe extern "system" fn vkGetPhysicalDeviceFeatures(
    _physical_device: vk::PhysicalDevice,
    p_features: *mut vk::PhysicalDeviceFeatures,
) {
    if p_features.is_null() {
        return;
    }
    *p_features = vk::PhysicalDeviceFeatures::default();
}

#[no_mangle]
pub unsafe extern "system" fn vkGetPhysicalDeviceFeatures2(
    _physical_device: vk::PhysicalDevice,
    p_features: *mut vk::PhysicalDeviceFeatures2<'_>,
) {
    if p_features.is_null() {
        return;
    }
    (*p_features).features = vk::PhysicalDeviceFeatures::default();
}

#[no_mangle]
pub unsafe extern "system" fn vkGetPhysicalDeviceFormatProperties(
    _physical_device: vk::PhysicalDevice,
    _format: vk::Format,
    p_format_properties: *mut vk::FormatProperties,
) {
    if p_format_properties.is_null() {
        return;
    }
    *p_format_properties = PhysicalDevice::format_properties();
}

#[no_mangle]
pub unsafe extern "system" fn vkGetPhysicalDeviceFormatProperties2(
    _physical_device: vk::PhysicalDevice,
    _format: vk::Format,
    p_format_properties: *mut vk::FormatProperties2<'_>,
) {
    if p_format_properties.is_null() {
        return;
    }
    (*p_format_properties).format_properties = PhysicalDevice::format_properties();
}

#[no_mangle]
pub unsafe extern "system" fn vkGetPhysicalDeviceImageFormatProperties(
    _physical_device: vk::PhysicalDevice,
    _format: vk::Format,
    image_type: vk::ImageType,
    _tiling: vk::ImageTiling,
    _usage: vk::ImageUsageFlags,
    _flags: vk::ImageCreateFlags,
    p_image_format_properties: *mut vk::ImageFormatProperties,
) -> vk::Result {
    if p_image_format_properties.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }
    let depth = if image_type == vk::ImageType::TYPE_3D { 2048 } else { 1 };
    *p_image_format_properties = vk::ImageFormatProperties {
        max_extent: vk::Extent3D {
            width: 16384,
            height: 16384,
            depth,
        },
        max_mip_levels: 15,
        max_array_layers: 2048,
        sample_counts: vk::SampleCountFlags::TYPE_1,
        max_resource_size: 1 << 31,
    };
    vk::Result::SUCCESS
}

#[no_mangle]
pub unsafe extern "system" fn vkGetPhysicalDeviceQueueFamilyProperties(
    _physical_device: vk::PhysicalDevice,
    p_queue_family_property_count: *mut u32,
    p_queue_family_properties: *mut vk::QueueFamilyProperties,
) {
    let _ = util::enumerate(
        &PhysicalDevice::queue_families(),
        p_queue_family_property_count,
        p_queue_family_properties,
    );
}

#[no_mangle]
pub unsafe extern "system" fn vkGetPhysicalDeviceQueueFamilyProperties2(
    _physical_device: vk::PhysicalDevice,
    p_queue_family_property_count: *mut u32,
    p_queue_family_properties: *mut vk::QueueFamilyProperties2<'_>,
) {
    if p_queue_family_property_count.is_null() {
        return;
    }
    let families = PhysicalDevice::queue_families();
    if p_queue_family_properties.is_null() {
        *p_queue_family_property_count = families.len() as u32;
        return;
    }
    let count = std::cmp::min(*p_queue_family_property_count as usize, families.len());
    for (i, family) in families.iter().take(count).enumerate() {
        (*p_queue_family_properties.add(i)).queue_family_properties = *family;
    }
    *p_queue_family_property_count = count as u32;
}

#[no_mangle]
pub unsafe extern "system" fn vkGetPhysicalDeviceMemoryProperties(
    _physical_device: vk::PhysicalDevice,
    p_memory_properties: *mut vk::PhysicalDeviceMemoryProperties,
) {
    if p_memory_properties.is_null() {
        return;
    }
    *p_memory_properties = PhysicalDevice::memory_properties();
}

#[no_mangle]
pub unsafe extern "system" fn vkGetPhysicalDeviceMemoryProperties2(
    _physical_device: vk::PhysicalDevice,
    p_memory_properties: *mut vk::PhysicalDeviceMemoryProperties2<'_>,
) {
    if p_memory_properties.is_null() {
        return;
    }
    (*p_memory_properties).memory_properties = PhysicalDevice::memory_properties();
}

#[no_mangle]
pub unsafe extern "system" fn vkGetPhysicalDeviceSparseImageFormatProperties(
    _physical_device: vk::PhysicalDevice,
    _format: vk::Format,
    _image_type: vk::ImageType,
    _samples: vk::SampleCountFlags,
    _usage: vk::ImageUsageFlags,
    _tiling: vk::ImageTiling,
    p_property_count: *mut u32,
    p_properties: *mut vk::SparseImageFormatProperties,
) {
    let _ = util::enumerate(&[], p_property_count, p_properties);
}

#[no_mangle]
pub unsafe extern "system" fn vkEnumerateDeviceExtensionProperties(
    _physical_device: vk::PhysicalDevice,
    _p_layer_name: *const c_char,
    p_property_count: *mut u32,
    p_properties: *mut vk::ExtensionProperties,
) -> vk::Result {
    util::enumerate(&extension::properties(), p_property_count, p_properties)
}

#[no_mangle]
pub unsafe extern "system" fn vkEnumerateDeviceLayerProperties(
    _physical_device: vk::PhysicalDevice,
    p_property_count: *mut u32,
    p_properties: *mut vk::LayerProperties,
) -> vk::Result {
    util::enumerate(&[], p_property_count, p_properties)
}
