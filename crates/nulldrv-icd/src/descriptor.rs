//! Descriptor set layouts, pools and sets.

use std::ptr::NonNull;
use std::sync::Arc;

use ash::vk;
use ash::vk::Handle;
use parking_lot::Mutex;

use crate::device::Device;
use crate::error::DriverError;
use crate::object::{self, NullObject, ObjectKind, Owned, Record};
use crate::util::slice_or_empty;

/// Per-device state that descriptor updates go through. Shared by every set
/// allocated under the device; the null driver writes no descriptors, so
/// its update methods are no-ops.
#[derive(Debug, Default)]
pub struct DescriptorBackend;

impl DescriptorBackend {
    pub fn write(&self, _set: &Record<DescriptorSet>, _write: &vk::WriteDescriptorSet<'_>) {}

    pub fn copy(&self, _set: &Record<DescriptorSet>, _copy: &vk::CopyDescriptorSet<'_>) {}
}

pub struct DescriptorSetLayout {
    pub binding_count: u32,
}

impl NullObject for DescriptorSetLayout {
    const KIND: ObjectKind = ObjectKind::DescriptorSetLayout;
}

pub struct DescriptorPool {
    /// Owning device, not owned.
    pub device: NonNull<Record<Device>>,
    pub max_sets: u32,
    sets: Mutex<Vec<Owned<DescriptorSet>>>,
}

impl NullObject for DescriptorPool {
    const KIND: ObjectKind = ObjectKind::DescriptorPool;
}

impl DescriptorPool {
    /// Allocate one set per layout. Either every set is created or none is.
    pub fn allocate(
        &self,
        context: Option<NonNull<object::ObjectHeader>>,
        layouts: &[vk::DescriptorSetLayout],
    ) -> Result<Vec<vk::DescriptorSet>, DriverError> {
        // SAFETY: a pool never outlives the device it was created from.
        let backend = unsafe { self.device.as_ref() }.body.descriptor_backend.clone();

        let created = layouts
            .iter()
            .map(|&layout| {
                Owned::new(
                    context,
                    DescriptorSet {
                        backend: backend.clone(),
                        layout,
                    },
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let handles: Vec<vk::DescriptorSet> = created.iter().map(|set| set.handle()).collect();
        self.sets.lock().extend(created);
        Ok(handles)
    }

    /// Release the given sets. Handles that this pool did not allocate are
    /// ignored.
    pub fn free(&self, sets: &[vk::DescriptorSet]) {
        let raws: Vec<u64> = sets.iter().map(|set| set.as_raw()).collect();
        self.sets.lock().retain(|set| !raws.contains(&set.raw()));
    }

    pub fn reset(&self) {
        self.sets.lock().clear();
    }

    pub fn live_sets(&self) -> usize {
        self.sets.lock().len()
    }
}

pub struct DescriptorSet {
    pub backend: Arc<DescriptorBackend>,
    pub layout: vk::DescriptorSetLayout,
}

impl NullObject for DescriptorSet {
    const KIND: ObjectKind = ObjectKind::DescriptorSet;
}

#[no_mangle]
pub unsafe extern "system" fn vkCreateDescriptorSetLayout(
    device: vk::Device,
    p_create_info: *const vk::DescriptorSetLayoutCreateInfo<'_>,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
    p_set_layout: *mut vk::DescriptorSetLayout,
) -> vk::Result {
    if p_create_info.is_null() || p_set_layout.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }
    let ci = &*p_create_info;
    let layout = DescriptorSetLayout {
        binding_count: ci.binding_count,
    };
    match Owned::new(object::header_ptr(device), layout) {
        Ok(layout) => {
            *p_set_layout = layout.into_handle();
            vk::Result::SUCCESS
        }
        Err(e) => e.into(),
    }
}

#[no_mangle]
pub unsafe extern "system" fn vkDestroyDescriptorSetLayout(
    _device: vk::Device,
    descriptor_set_layout: vk::DescriptorSetLayout,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
) {
    object::destroy::<DescriptorSetLayout>(descriptor_set_layout);
}

#[no_mangle]
pub unsafe extern "system" fn vkCreateDescriptorPool(
    device: vk::Device,
    p_create_info: *const vk::DescriptorPoolCreateInfo<'_>,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
    p_descriptor_pool: *mut vk::DescriptorPool,
) -> vk::Result {
    if p_create_info.is_null() || p_descriptor_pool.is_null() || device.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }
    let ci = &*p_create_info;
    let dev = object::decode::<Device>(device);
    let pool = DescriptorPool {
        device: NonNull::from(dev),
        max_sets: ci.max_sets,
        sets: Mutex::new(Vec::new()),
    };
    match Owned::new(object::header_ptr(device), pool) {
        Ok(pool) => {
            *p_descriptor_pool = pool.into_handle();
            vk::Result::SUCCESS
        }
        Err(e) => e.into(),
    }
}

#[no_mangle]
pub unsafe extern "system" fn vkDestroyDescriptorPool(
    _device: vk::Device,
    descriptor_pool: vk::DescriptorPool,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
) {
    object::destroy::<DescriptorPool>(descriptor_pool);
}

#[no_mangle]
pub unsafe extern "system" fn vkResetDescriptorPool(
    _device: vk::Device,
    descriptor_pool: vk::DescriptorPool,
    _flags: vk::DescriptorPoolResetFlags,
) -> vk::Result {
    if descriptor_pool.is_null() {
        return vk::Result::SUCCESS;
    }
    object::decode::<DescriptorPool>(descriptor_pool).body.reset();
    vk::Result::SUCCESS
}

#[no_mangle]
pub unsafe extern "system" fn vkAllocateDescriptorSets(
    device: vk::Device,
    p_allocate_info: *const vk::DescriptorSetAllocateInfo<'_>,
    p_descriptor_sets: *mut vk::DescriptorSet,
) -> vk::Result {
    if p_allocate_info.is_null() || p_descriptor_sets.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }
    let ai = &*p_allocate_info;
    if ai.descriptor_pool.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }
    let count = ai.descriptor_set_count as usize;
    let layouts = slice_or_empty(ai.p_set_layouts, ai.descriptor_set_count);
    let pool = object::decode::<DescriptorPool>(ai.descriptor_pool);

    match pool.body.allocate(object::header_ptr(device), layouts) {
        Ok(sets) => {
            std::ptr::copy_nonoverlapping(sets.as_ptr(), p_descriptor_sets, sets.len());
            vk::Result::SUCCESS
        }
        Err(e) => {
            for i in 0..count {
                *p_descriptor_sets.add(i) = vk::DescriptorSet::null();
            }
            e.into()
        }
    }
}

#[no_mangle]
pub unsafe extern "system" fn vkFreeDescriptorSets(
    _device: vk::Device,
    descriptor_pool: vk::DescriptorPool,
    descriptor_set_count: u32,
    p_descriptor_sets: *const vk::DescriptorSet,
) -> vk::Result {
    if descriptor_pool.is_null() {
        return vk::Result::SUCCESS;
    }
    let sets = slice_or_empty(p_descriptor_sets, descriptor_set_count);
    object::decode::<DescriptorPool>(descriptor_pool).body.free(sets);
    vk::Result::SUCCESS
}

#[no_mangle]
pub unsafe extern "system" fn vkUpdateDescriptorSets(
    _device: vk::Device,
    descriptor_write_count: u32,
    p_descriptor_writes: *const vk::WriteDescriptorSet<'_>,
    descriptor_copy_count: u32,
    p_descriptor_copies: *const vk::CopyDescriptorSet<'_>,
) {
    for write in slice_or_empty(p_descriptor_writes, descriptor_write_count) {
        if write.dst_set.is_null() {
            continue;
        }
        let set = object::decode::<DescriptorSet>(write.dst_set);
        set.body.backend.write(set, write);
    }
    for copy in slice_or_empty(p_descriptor_copies, descriptor_copy_count) {
        if copy.dst_set.is_null() {
            continue;
        }
        let set = object::decode::<DescriptorSet>(copy.dst_set);
        set.body.backend.copy(set, copy);
    }
}
