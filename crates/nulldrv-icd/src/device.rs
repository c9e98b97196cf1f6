//! Device creation, queues and queue submission.

use std::ffi::CStr;
use std::ptr::NonNull;
use std::sync::Arc;

use ash::vk;
use ash::vk::Handle;
use tracing::{debug, warn};

use crate::descriptor::DescriptorBackend;
use crate::error::DriverError;
use crate::extension::ExtensionSet;
use crate::heap;
use crate::object::{self, NullObject, ObjectKind, Owned, Record};
use crate::util::{read_string_array, slice_or_empty};

/// Queue families the null GPU exposes.
pub const QUEUE_FAMILY_COUNT: usize = 1;

pub struct Device {
    pub extensions: ExtensionSet,
    /// One queue slot per family; the first request for a family fills it.
    pub queues: [Option<Owned<Queue>>; QUEUE_FAMILY_COUNT],
    pub descriptor_backend: Arc<DescriptorBackend>,
}

impl NullObject for Device {
    const KIND: ObjectKind = ObjectKind::Device;
}

impl Device {
    pub fn queue(&self, family_index: u32) -> Option<&Owned<Queue>> {
        self.queues.get(family_index as usize)?.as_ref()
    }
}

pub struct Queue {
    /// Owning device, not owned.
    pub device: NonNull<Record<Device>>,
    pub family_index: u32,
}

impl NullObject for Queue {
    const KIND: ObjectKind = ObjectKind::Queue;
}

/// A `VkDeviceQueueCreateInfo` reduced to what device creation looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueRequest {
    pub family_index: u32,
    pub priority_count: u32,
}

/// Build a device with the requested extensions and queues.
///
/// Unknown extension names fail with `ExtensionNotPresent` before anything
/// is allocated. A request creates a queue only if it carries exactly one
/// priority and its family has no queue yet; later requests for the same
/// family are ignored. Any failure drops the partially built device, which
/// releases every queue and the descriptor backend created so far.
pub fn create_device(
    extension_names: &[&CStr],
    queue_requests: &[QueueRequest],
) -> Result<Owned<Device>, DriverError> {
    let extensions = ExtensionSet::resolve(extension_names)?;
    let descriptor_backend = heap::shared(DescriptorBackend::default())?;

    let mut device = Owned::new(
        None,
        Device {
            extensions,
            queues: Default::default(),
            descriptor_backend,
        },
    )?;

    for request in queue_requests {
        let family = request.family_index as usize;
        if family >= QUEUE_FAMILY_COUNT {
            return Err(DriverError::InitializationFailed(format!(
                "queue family {} out of range",
                request.family_index
            )));
        }
        if request.priority_count != 1 || device.body.queues[family].is_some() {
            debug!(family, priority_count = request.priority_count, "queue request ignored");
            continue;
        }
        let queue = Owned::new(
            Some(device.header_ptr()),
            Queue {
                device: device.as_ptr(),
                family_index: request.family_index,
            },
        )?;
        device.body.queues[family] = Some(queue);
    }

    Ok(device)
}

#[no_mangle]
pub unsafe extern "system" fn vkCreateDevice(
    _physical_device: vk::PhysicalDevice,
    p_create_info: *const vk::DeviceCreateInfo<'_>,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
    p_device: *mut vk::Device,
) -> vk::Result {
    if p_create_info.is_null() || p_device.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }

    let ci = &*p_create_info;
    let extension_names =
        read_string_array(ci.pp_enabled_extension_names, ci.enabled_extension_count);
    let queue_requests: Vec<QueueRequest> =
        slice_or_empty(ci.p_queue_create_infos, ci.queue_create_info_count)
            .iter()
            .map(|qci| QueueRequest {
                family_index: qci.queue_family_index,
                priority_count: qci.queue_count,
            })
            .collect();

    match create_device(&extension_names, &queue_requests) {
        Ok(device) => {
            *p_device = device.into_handle();
            vk::Result::SUCCESS
        }
        Err(e) => {
            warn!("vkCreateDevice failed: {e}");
            e.into()
        }
    }
}

#[no_mangle]
pub unsafe extern "system" fn vkDestroyDevice(
    device: vk::Device,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
) {
    object::destroy::<Device>(device);
}

#[no_mangle]
pub unsafe extern "system" fn vkGetDeviceQueue(
    device: vk::Device,
    queue_family_index: u32,
    _queue_index: u32,
    p_queue: *mut vk::Queue,
) {
    if p_queue.is_null() || device.is_null() {
        return;
    }
    let dev = object::decode::<Device>(device);
    *p_queue = match dev.body.queue(queue_family_index) {
        Some(queue) => queue.handle(),
        None => {
            warn!(queue_family_index, "no queue was created for this family");
            vk::Queue::null()
        }
    };
}

#[no_mangle]
pub unsafe extern "system" fn vkDeviceWaitIdle(_device: vk::Device) -> vk::Result {
    vk::Result::SUCCESS
}

#[no_mangle]
pub unsafe extern "system" fn vkQueueSubmit(
    _queue: vk::Queue,
    _submit_count: u32,
    _p_submits: *const vk::SubmitInfo<'_>,
    _fence: vk::Fence,
) -> vk::Result {
    vk::Result::SUCCESS
}

#[no_mangle]
pub unsafe extern "system" fn vkQueueWaitIdle(_queue: vk::Queue) -> vk::Result {
    vk::Result::SUCCESS
}

#[no_mangle]
pub unsafe extern "system" fn vkQueueBindSparse(
    _queue: vk::Queue,
    _bind_info_count: u32,
    _p_bind_info: *const vk::BindSparseInfo<'_>,
    _fence: vk::Fence,
) -> vk::Result {
    vk::Result::SUCCESS
}
