//! Memory, buffer and buffer view functions.

use std::os::raw::c_void;

use ash::vk;
use ash::vk::Handle;
use parking_lot::Mutex;
use tracing::warn;

use crate::error::{to_vk_result, DriverError};
use crate::heap;
use crate::object::{
    self, NullObject, ObjectKind, Owned, StorageBacked, STORAGE_ALIGNMENT,
    STORAGE_MEMORY_TYPE_BITS,
};

/// A device memory allocation, backed by zeroed host bytes so that mapped
/// pointers are always writable.
pub struct DeviceMemory {
    bo: Mutex<Vec<u8>>,
    pub memory_type_index: u32,
}

impl NullObject for DeviceMemory {
    const KIND: ObjectKind = ObjectKind::DeviceMemory;
}

impl DeviceMemory {
    pub fn new(size: vk::DeviceSize, memory_type_index: u32) -> Result<Self, DriverError> {
        Ok(Self {
            bo: Mutex::new(heap::alloc_bytes(size)?),
            memory_type_index,
        })
    }

    pub fn size(&self) -> vk::DeviceSize {
        self.bo.lock().len() as vk::DeviceSize
    }

    /// Pointer to `offset` within the backing store. `size` may be
    /// `VK_WHOLE_SIZE`; a range that leaves the allocation fails.
    pub fn map(&self, offset: vk::DeviceSize, size: vk::DeviceSize) -> Result<*mut c_void, DriverError> {
        let mut bo = self.bo.lock();
        let len = bo.len() as vk::DeviceSize;
        let end = if size == vk::WHOLE_SIZE {
            Some(len)
        } else {
            offset.checked_add(size)
        };
        match end {
            Some(end) if offset <= len && end <= len && !bo.is_empty() => {
                // SAFETY: `offset` is within the allocation.
                Ok(unsafe { bo.as_mut_ptr().add(offset as usize) } as *mut c_void)
            }
            _ => Err(DriverError::MemoryMapFailed),
        }
    }
}

pub struct Buffer {
    pub size: vk::DeviceSize,
    pub usage: vk::BufferUsageFlags,
}

impl NullObject for Buffer {
    const KIND: ObjectKind = ObjectKind::Buffer;
}

impl StorageBacked for Buffer {
    fn memory_requirements(&self) -> vk::MemoryRequirements {
        vk::MemoryRequirements {
            size: self.size,
            alignment: STORAGE_ALIGNMENT,
            memory_type_bits: STORAGE_MEMORY_TYPE_BITS,
        }
    }
}

pub struct BufferView {
    pub buffer: vk::Buffer,
    pub format: vk::Format,
    pub offset: vk::DeviceSize,
    pub range: vk::DeviceSize,
}

impl NullObject for BufferView {
    const KIND: ObjectKind = ObjectKind::BufferView;
}

// ── vkAllocateMemory ────────────────────────────────────────

#[no_mangle]
pub unsafe extern "system" fn vkAllocateMemory(
    device: vk::Device,
    p_allocate_info: *const vk::MemoryAllocateInfo<'_>,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
    p_memory: *mut vk::DeviceMemory,
) -> vk::Result {
    if p_allocate_info.is_null() || p_memory.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }

    let ai = &*p_allocate_info;
    let result = DeviceMemory::new(ai.allocation_size, ai.memory_type_index)
        .and_then(|memory| Owned::new(object::header_ptr(device), memory));

    to_vk_result(result.map(|memory| *p_memory = memory.into_handle()))
}

#[no_mangle]
pub unsafe extern "system" fn vkFreeMemory(
    _device: vk::Device,
    memory: vk::DeviceMemory,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
) {
    object::destroy::<DeviceMemory>(memory);
}

#[no_mangle]
pub unsafe extern "system" fn vkMapMemory(
    _device: vk::Device,
    memory: vk::DeviceMemory,
    offset: vk::DeviceSize,
    size: vk::DeviceSize,
    _flags: vk::MemoryMapFlags,
    pp_data: *mut *mut c_void,
) -> vk::Result {
    if pp_data.is_null() {
        return vk::Result::ERROR_MEMORY_MAP_FAILED;
    }
    if memory.is_null() {
        *pp_data = std::ptr::null_mut();
        return vk::Result::ERROR_MEMORY_MAP_FAILED;
    }

    let mem = object::decode::<DeviceMemory>(memory);
    match mem.body.map(offset, size) {
        Ok(ptr) => {
            *pp_data = ptr;
            vk::Result::SUCCESS
        }
        Err(e) => {
            warn!(offset, size, allocation = mem.body.size(), "vkMapMemory out of range");
            *pp_data = std::ptr::null_mut();
            e.into()
        }
    }
}

#[no_mangle]
pub unsafe extern "system" fn vkUnmapMemory(_device: vk::Device, _memory: vk::DeviceMemory) {}

#[no_mangle]
pub unsafe extern "system" fn vkFlushMappedMemoryRanges(
    _device: vk::Device,
    _memory_range_count: u32,
    _p_memory_ranges: *const vk::MappedMemoryRange<'_>,
) -> vk::Result {
    vk::Result::SUCCESS
}

#[no_mangle]
pub unsafe extern "system" fn vkInvalidateMappedMemoryRanges(
    _device: vk::Device,
    _memory_range_count: u32,
    _p_memory_ranges: *const vk::MappedMemoryRange<'_>,
) -> vk::Result {
    vk::Result::SUCCESS
}

#[no_mangle]
pub unsafe extern "system" fn vkGetDeviceMemoryCommitment(
    _device: vk::Device,
    memory: vk::DeviceMemory,
    p_committed_memory_in_bytes: *mut vk::DeviceSize,
) {
    if p_committed_memory_in_bytes.is_null() || memory.is_null() {
        return;
    }
    *p_committed_memory_in_bytes = object::decode::<DeviceMemory>(memory).body.size();
}

// ── Buffers ─────────────────────────────────────────────────

#[no_mangle]
pub unsafe extern "system" fn vkCreateBuffer(
    device: vk::Device,
    p_create_info: *const vk::BufferCreateInfo<'_>,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
    p_buffer: *mut vk::Buffer,
) -> vk::Result {
    if p_create_info.is_null() || p_buffer.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }

    let ci = &*p_create_info;
    let buffer = Buffer {
        size: ci.size,
        usage: ci.usage,
    };
    to_vk_result(
        Owned::with_storage(object::header_ptr(device), buffer)
            .map(|buffer| *p_buffer = buffer.into_handle()),
    )
}

#[no_mangle]
pub unsafe extern "system" fn vkDestroyBuffer(
    _device: vk::Device,
    buffer: vk::Buffer,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
) {
    object::destroy::<Buffer>(buffer);
}

#[no_mangle]
pub unsafe extern "system" fn vkGetBufferMemoryRequirements(
    _device: vk::Device,
    buffer: vk::Buffer,
    p_memory_requirements: *mut vk::MemoryRequirements,
) {
    if p_memory_requirements.is_null() {
        return;
    }
    match object::memory_requirements(buffer, ObjectKind::Buffer) {
        Ok(reqs) => *p_memory_requirements = reqs,
        Err(e) => warn!("vkGetBufferMemoryRequirements: {e}"),
    }
}

#[no_mangle]
pub unsafe extern "system" fn vkBindBufferMemory(
    _device: vk::Device,
    _buffer: vk::Buffer,
    _memory: vk::DeviceMemory,
    _memory_offset: vk::DeviceSize,
) -> vk::Result {
    vk::Result::SUCCESS
}

#[no_mangle]
pub unsafe extern "system" fn vkCreateBufferView(
    device: vk::Device,
    p_create_info: *const vk::BufferViewCreateInfo<'_>,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
    p_view: *mut vk::BufferView,
) -> vk::Result {
    if p_create_info.is_null() || p_view.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }

    let ci = &*p_create_info;
    let view = BufferView {
        buffer: ci.buffer,
        format: ci.format,
        offset: ci.offset,
        range: ci.range,
    };
    to_vk_result(
        Owned::new(object::header_ptr(device), view).map(|view| *p_view = view.into_handle()),
    )
}

#[no_mangle]
pub unsafe extern "system" fn vkDestroyBufferView(
    _device: vk::Device,
    buffer_view: vk::BufferView,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
) {
    object::destroy::<BufferView>(buffer_view);
}
