//! Fences, semaphores, events and query pools.
//!
//! Every operation the driver was asked to do has already finished, so all
//! status and wait queries report success immediately.

use std::os::raw::c_void;

use ash::vk;

use crate::error::to_vk_result;
use crate::object::{self, NullObject, ObjectKind, Owned};

pub struct Fence {
    pub flags: vk::FenceCreateFlags,
}

impl NullObject for Fence {
    const KIND: ObjectKind = ObjectKind::Fence;
}

pub struct Semaphore;

impl NullObject for Semaphore {
    const KIND: ObjectKind = ObjectKind::Semaphore;
}

pub struct Event;

impl NullObject for Event {
    const KIND: ObjectKind = ObjectKind::Event;
}

pub struct QueryPool {
    pub query_type: vk::QueryType,
    pub query_count: u32,
}

impl NullObject for QueryPool {
    const KIND: ObjectKind = ObjectKind::QueryPool;
}

// ── Fences ──────────────────────────────────────────────────

#[no_mangle]
pub unsafe extern "system" fn vkCreateFence(
    device: vk::Device,
    p_create_info: *const vk::FenceCreateInfo<'_>,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
    p_fence: *mut vk::Fence,
) -> vk::Result {
    if p_create_info.is_null() || p_fence.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }
    let fence = Fence {
        flags: (*p_create_info).flags,
    };
    to_vk_result(
        Owned::new(object::header_ptr(device), fence).map(|fence| *p_fence = fence.into_handle()),
    )
}

#[no_mangle]
pub unsafe extern "system" fn vkDestroyFence(
    _device: vk::Device,
    fence: vk::Fence,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
) {
    object::destroy::<Fence>(fence);
}

#[no_mangle]
pub unsafe extern "system" fn vkResetFences(
    _device: vk::Device,
    _fence_count: u32,
    _p_fences: *const vk::Fence,
) -> vk::Result {
    vk::Result::SUCCESS
}

#[no_mangle]
pub unsafe extern "system" fn vkGetFenceStatus(_device: vk::Device, _fence: vk::Fence) -> vk::Result {
    vk::Result::SUCCESS
}

#[no_mangle]
pub unsafe extern "system" fn vkWaitForFences(
    _device: vk::Device,
    _fence_count: u32,
    _p_fences: *const vk::Fence,
    _wait_all: vk::Bool32,
    _timeout: u64,
) -> vk::Result {
    vk::Result::SUCCESS
}

// ── Semaphores ──────────────────────────────────────────────

#[no_mangle]
pub unsafe extern "system" fn vkCreateSemaphore(
    device: vk::Device,
    p_create_info: *const vk::SemaphoreCreateInfo<'_>,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
    p_semaphore: *mut vk::Semaphore,
) -> vk::Result {
    if p_create_info.is_null() || p_semaphore.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }
    to_vk_result(
        Owned::new(object::header_ptr(device), Semaphore)
            .map(|semaphore| *p_semaphore = semaphore.into_handle()),
    )
}

#[no_mangle]
pub unsafe extern "system" fn vkDestroySemaphore(
    _device: vk::Device,
    semaphore: vk::Semaphore,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
) {
    object::destroy::<Semaphore>(semaphore);
}

// ── Events ──────────────────────────────────────────────────

#[no_mangle]
pub unsafe extern "system" fn vkCreateEvent(
    device: vk::Device,
    p_create_info: *const vk::EventCreateInfo<'_>,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
    p_event: *mut vk::Event,
) -> vk::Result {
    if p_create_info.is_null() || p_event.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }
    to_vk_result(
        Owned::new(object::header_ptr(device), Event).map(|event| *p_event = event.into_handle()),
    )
}

#[no_mangle]
pub unsafe extern "system" fn vkDestroyEvent(
    _device: vk::Device,
    event: vk::Event,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
) {
    object::destroy::<Event>(event);
}

#[no_mangle]
pub unsafe extern "system" fn vkGetEventStatus(_device: vk::Device, _event: vk::Event) -> vk::Result {
    vk::Result::SUCCESS
}

#[no_mangle]
pub unsafe extern "system" fn vkSetEvent(_device: vk::Device, _event: vk::Event) -> vk::Result {
    vk::Result::SUCCESS
}

#[no_mangle]
pub unsafe extern "system" fn vkResetEvent(_device: vk::Device, _event: vk::Event) -> vk::Result {
    vk::Result::SUCCESS
}

// ── Query pools ─────────────────────────────────────────────

#[no_mangle]
pub unsafe extern "system" fn vkCreateQueryPool(
    device: vk::Device,
    p_create_info: *const vk::QueryPoolCreateInfo<'_>,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
    p_query_pool: *mut vk::QueryPool,
) -> vk::Result {
    if p_create_info.is_null() || p_query_pool.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }
    let ci = &*p_create_info;
    let pool = QueryPool {
        query_type: ci.query_type,
        query_count: ci.query_count,
    };
    to_vk_result(
        Owned::new(object::header_ptr(device), pool)
            .map(|pool| *p_query_pool = pool.into_handle()),
    )
}

#[no_mangle]
pub unsafe extern "system" fn vkDestroyQueryPool(
    _device: vk::Device,
    query_pool: vk::QueryPool,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
) {
    object::destroy::<QueryPool>(query_pool);
}

#[no_mangle]
pub unsafe extern "system" fn vkGetQueryPoolResults(
    _device: vk::Device,
    _query_pool: vk::QueryPool,
    _first_query: u32,
    _query_count: u32,
    _data_size: usize,
    _p_data: *mut c_void,
    _stride: vk::DeviceSize,
    _flags: vk::QueryResultFlags,
) -> vk::Result {
    vk::Result::SUCCESS
}
