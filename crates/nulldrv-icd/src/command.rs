//! Command pools, command buffers and command recording.
//!
//! Command buffers are real dispatchable records owned by their pool;
//! recording into them is accepted and discarded.

use std::os::raw::c_void;

use ash::vk;
use ash::vk::Handle;
use parking_lot::Mutex;

use crate::error::{to_vk_result, DriverError};
use crate::object::{self, NullObject, ObjectHeader, ObjectKind, Owned};
use crate::util::slice_or_empty;

pub struct CommandPool {
    pub queue_family_index: u32,
    pub flags: vk::CommandPoolCreateFlags,
    buffers: Mutex<Vec<Owned<CommandBuffer>>>,
}

impl NullObject for CommandPool {
    const KIND: ObjectKind = ObjectKind::CommandPool;
}

impl CommandPool {
    pub fn new(queue_family_index: u32, flags: vk::CommandPoolCreateFlags) -> Self {
        Self {
            queue_family_index,
            flags,
            buffers: Mutex::new(Vec::new()),
        }
    }

    /// Allocate `count` command buffers, all or nothing.
    pub fn allocate(
        &self,
        context: Option<std::ptr::NonNull<ObjectHeader>>,
        level: vk::CommandBufferLevel,
        count: u32,
    ) -> Result<Vec<vk::CommandBuffer>, DriverError> {
        let created = (0..count)
            .map(|_| Owned::new(context, CommandBuffer { level }))
            .collect::<Result<Vec<_>, _>>()?;
        let handles: Vec<vk::CommandBuffer> = created.iter().map(|cmd| cmd.handle()).collect();
        self.buffers.lock().extend(created);
        Ok(handles)
    }

    pub fn free(&self, command_buffers: &[vk::CommandBuffer]) {
        let raws: Vec<u64> = command_buffers.iter().map(|cmd| cmd.as_raw()).collect();
        self.buffers.lock().retain(|cmd| !raws.contains(&cmd.raw()));
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.lock().len()
    }
}

pub struct CommandBuffer {
    pub level: vk::CommandBufferLevel,
}

impl NullObject for CommandBuffer {
    const KIND: ObjectKind = ObjectKind::CommandBuffer;
}

// ── Command pools ───────────────────────────────────────────

#[no_mangle]
pub unsafe extern "system" fn vkCreateCommandPool(
    device: vk::Device,
    p_create_info: *const vk::CommandPoolCreateInfo<'_>,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
    p_command_pool: *mut vk::CommandPool,
) -> vk::Result {
    if p_create_info.is_null() || p_command_pool.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }
    let ci = &*p_create_info;
    let pool = CommandPool::new(ci.queue_family_index, ci.flags);
    to_vk_result(
        Owned::new(object::header_ptr(device), pool)
            .map(|pool| *p_command_pool = pool.into_handle()),
    )
}

#[no_mangle]
pub unsafe extern "system" fn vkDestroyCommandPool(
    _device: vk::Device,
    command_pool: vk::CommandPool,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
) {
    object::destroy::<CommandPool>(command_pool);
}

#[no_mangle]
pub unsafe extern "system" fn vkResetCommandPool(
    _device: vk::Device,
    _command_pool: vk::CommandPool,
    _flags: vk::CommandPoolResetFlags,
) -> vk::Result {
    vk::Result::SUCCESS
}

// ── Command buffers ─────────────────────────────────────────

#[no_mangle]
pub unsafe extern "system" fn vkAllocateCommandBuffers(
    device: vk::Device,
    p_allocate_info: *const vk::CommandBufferAllocateInfo<'_>,
    p_command_buffers: *mut vk::CommandBuffer,
) -> vk::Result {
    if p_allocate_info.is_null() || p_command_buffers.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }
    let ai = &*p_allocate_info;
    if ai.command_pool.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }

    let pool = object::decode::<CommandPool>(ai.command_pool);
    match pool
        .body
        .allocate(object::header_ptr(device), ai.level, ai.command_buffer_count)
    {
        Ok(buffers) => {
            std::ptr::copy_nonoverlapping(buffers.as_ptr(), p_command_buffers, buffers.len());
            vk::Result::SUCCESS
        }
        Err(e) => {
            for i in 0..ai.command_buffer_count as usize {
                *p_command_buffers.add(i) = vk::CommandBuffer::null();
            }
            e.into()
        }
    }
}

#[no_mangle]
pub unsafe extern "system" fn vkFreeCommandBuffers(
    _device: vk::Device,
    command_pool: vk::CommandPool,
    command_buffer_count: u32,
    p_command_buffers: *const vk::CommandBuffer,
) {
    if command_pool.is_null() {
        return;
    }
    let buffers = slice_or_empty(p_command_buffers, command_buffer_count);
    object::decode::<CommandPool>(command_pool).body.free(buffers);
}

#[no_mangle]
pub unsafe extern "system" fn vkBeginCommandBuffer(
    _command_buffer: vk::CommandBuffer,
    _p_begin_info: *const vk::CommandBufferBeginInfo<'_>,
) -> vk::Result {
    vk::Result::SUCCESS
}

#[no_mangle]
pub unsafe extern "system" fn vkEndCommandBuffer(_command_buffer: vk::CommandBuffer) -> vk::Result {
    vk::Result::SUCCESS
}

#[no_mangle]
pub unsafe extern "system" fn vkResetCommandBuffer(
    _command_buffer: vk::CommandBuffer,
    _flags: vk::CommandBufferResetFlags,
) -> vk::Result {
    vk::Result::SUCCESS
}

// ── Recording ───────────────────────────────────────────────

#[no_mangle]
pub unsafe extern "system" fn vkCmdBindPipeline(
    _command_buffer: vk::CommandBuffer,
    _pipeline_bind_point: vk::PipelineBindPoint,
    _pipeline: vk::Pipeline,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdSetViewport(
    _command_buffer: vk::CommandBuffer,
    _first_viewport: u32,
    _viewport_count: u32,
    _p_viewports: *const vk::Viewport,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdSetScissor(
    _command_buffer: vk::CommandBuffer,
    _first_scissor: u32,
    _scissor_count: u32,
    _p_scissors: *const vk::Rect2D,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdSetLineWidth(_command_buffer: vk::CommandBuffer, _line_width: f32) {}

#[no_mangle]
pub unsafe extern "system" fn vkCmdSetDepthBias(
    _command_buffer: vk::CommandBuffer,
    _depth_bias_constant_factor: f32,
    _depth_bias_clamp: f32,
    _depth_bias_slope_factor: f32,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdSetBlendConstants(
    _command_buffer: vk::CommandBuffer,
    _blend_constants: *const [f32; 4],
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdSetDepthBounds(
    _command_buffer: vk::CommandBuffer,
    _min_depth_bounds: f32,
    _max_depth_bounds: f32,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdSetStencilCompareMask(
    _command_buffer: vk::CommandBuffer,
    _face_mask: vk::StencilFaceFlags,
    _compare_mask: u32,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdSetStencilWriteMask(
    _command_buffer: vk::CommandBuffer,
    _face_mask: vk::StencilFaceFlags,
    _write_mask: u32,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdSetStencilReference(
    _command_buffer: vk::CommandBuffer,
    _face_mask: vk::StencilFaceFlags,
    _reference: u32,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdBindDescriptorSets(
    _command_buffer: vk::CommandBuffer,
    _pipeline_bind_point: vk::PipelineBindPoint,
    _layout: vk::PipelineLayout,
    _first_set: u32,
    _descriptor_set_count: u32,
    _p_descriptor_sets: *const vk::DescriptorSet,
    _dynamic_offset_count: u32,
    _p_dynamic_offsets: *const u32,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdBindIndexBuffer(
    _command_buffer: vk::CommandBuffer,
    _buffer: vk::Buffer,
    _offset: vk::DeviceSize,
    _index_type: vk::IndexType,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdBindVertexBuffers(
    _command_buffer: vk::CommandBuffer,
    _first_binding: u32,
    _binding_count: u32,
    _p_buffers: *const vk::Buffer,
    _p_offsets: *const vk::DeviceSize,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdDraw(
    _command_buffer: vk::CommandBuffer,
    _vertex_count: u32,
    _instance_count: u32,
    _first_vertex: u32,
    _first_instance: u32,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdDrawIndexed(
    _command_buffer: vk::CommandBuffer,
    _index_count: u32,
    _instance_count: u32,
    _first_index: u32,
    _vertex_offset: i32,
    _first_instance: u32,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdDrawIndirect(
    _command_buffer: vk::CommandBuffer,
    _buffer: vk::Buffer,
    _offset: vk::DeviceSize,
    _draw_count: u32,
    _stride: u32,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdDrawIndexedIndirect(
    _command_buffer: vk::CommandBuffer,
    _buffer: vk::Buffer,
    _offset: vk::DeviceSize,
    _draw_count: u32,
    _stride: u32,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdDispatch(
    _command_buffer: vk::CommandBuffer,
    _group_count_x: u32,
    _group_count_y: u32,
    _group_count_z: u32,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdDispatchIndirect(
    _command_buffer: vk::CommandBuffer,
    _buffer: vk::Buffer,
    _offset: vk::DeviceSize,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdCopyBuffer(
    _command_buffer: vk::CommandBuffer,
    _src_buffer: vk::Buffer,
    _dst_buffer: vk::Buffer,
    _region_count: u32,
    _p_regions: *const vk::BufferCopy,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdCopyImage(
    _command_buffer: vk::CommandBuffer,
    _src_image: vk::Image,
    _src_image_layout: vk::ImageLayout,
    _dst_image: vk::Image,
    _dst_image_layout: vk::ImageLayout,
    _region_count: u32,
    _p_regions: *const vk::ImageCopy,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdBlitImage(
    _command_buffer: vk::CommandBuffer,
    _src_image: vk::Image,
    _src_image_layout: vk::ImageLayout,
    _dst_image: vk::Image,
    _dst_image_layout: vk::ImageLayout,
    _region_count: u32,
    _p_regions: *const vk::ImageBlit,
    _filter: vk::Filter,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdCopyBufferToImage(
    _command_buffer: vk::CommandBuffer,
    _src_buffer: vk::Buffer,
    _dst_image: vk::Image,
    _dst_image_layout: vk::ImageLayout,
    _region_count: u32,
    _p_regions: *const vk::BufferImageCopy,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdCopyImageToBuffer(
    _command_buffer: vk::CommandBuffer,
    _src_image: vk::Image,
    _src_image_layout: vk::ImageLayout,
    _dst_buffer: vk::Buffer,
    _region_count: u32,
    _p_regions: *const vk::BufferImageCopy,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdUpdateBuffer(
    _command_buffer: vk::CommandBuffer,
    _dst_buffer: vk::Buffer,
    _dst_offset: vk::DeviceSize,
    _data_size: vk::DeviceSize,
    _p_data: *const c_void,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdFillBuffer(
    _command_buffer: vk::CommandBuffer,
    _dst_buffer: vk::Buffer,
    _dst_offset: vk::DeviceSize,
    _size: vk::DeviceSize,
    _data: u32,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdClearColorImage(
    _command_buffer: vk::CommandBuffer,
    _image: vk::Image,
    _image_layout: vk::ImageLayout,
    _p_color: *const vk::ClearColorValue,
    _range_count: u32,
    _p_ranges: *const vk::ImageSubresourceRange,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdClearDepthStencilImage(
    _command_buffer: vk::CommandBuffer,
    _image: vk::Image,
    _image_layout: vk::ImageLayout,
    _p_depth_stencil: *const vk::ClearDepthStencilValue,
    _range_count: u32,
    _p_ranges: *const vk::ImageSubresourceRange,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdClearAttachments(
    _command_buffer: vk::CommandBuffer,
    _attachment_count: u32,
    _p_attachments: *const vk::ClearAttachment,
    _rect_count: u32,
    _p_rects: *const vk::ClearRect,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdResolveImage(
    _command_buffer: vk::CommandBuffer,
    _src_image: vk::Image,
    _src_image_layout: vk::ImageLayout,
    _dst_image: vk::Image,
    _dst_image_layout: vk::ImageLayout,
    _region_count: u32,
    _p_regions: *const vk::ImageResolve,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdSetEvent(
    _command_buffer: vk::CommandBuffer,
    _event: vk::Event,
    _stage_mask: vk::PipelineStageFlags,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdResetEvent(
    _command_buffer: vk::CommandBuffer,
    _event: vk::Event,
    _stage_mask: vk::PipelineStageFlags,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdWaitEvents(
    _command_buffer: vk::CommandBuffer,
    _event_count: u32,
    _p_events: *const vk::Event,
    _src_stage_mask: vk::PipelineStageFlags,
    _dst_stage_mask: vk::PipelineStageFlags,
    _memory_barrier_count: u32,
    _p_memory_barriers: *const vk::MemoryBarrier<'_>,
    _buffer_memory_barrier_count: u32,
    _p_buffer_memory_barriers: *const vk::BufferMemoryBarrier<'_>,
    _image_memory_barrier_count: u32,
    _p_image_memory_barriers: *const vk::ImageMemoryBarrier<'_>,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdPipelineBarrier(
    _command_buffer: vk::CommandBuffer,
    _src_stage_mask: vk::PipelineStageFlags,
    _dst_stage_mask: vk::PipelineStageFlags,
    _dependency_flags: vk::DependencyFlags,
    _memory_barrier_count: u32,
    _p_memory_barriers: *const vk::MemoryBarrier<'_>,
    _buffer_memory_barrier_count: u32,
    _p_buffer_memory_barriers: *const vk::BufferMemoryBarrier<'_>,
    _image_memory_barrier_count: u32,
    _p_image_memory_barriers: *const vk::ImageMemoryBarrier<'_>,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdBeginQuery(
    _command_buffer: vk::CommandBuffer,
    _query_pool: vk::QueryPool,
    _query: u32,
    _flags: vk::QueryControlFlags,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdEndQuery(
    _command_buffer: vk::CommandBuffer,
    _query_pool: vk::QueryPool,
    _query: u32,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdResetQueryPool(
    _command_buffer: vk::CommandBuffer,
    _query_pool: vk::QueryPool,
    _first_query: u32,
    _query_count: u32,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdWriteTimestamp(
    _command_buffer: vk::CommandBuffer,
    _pipeline_stage: vk::PipelineStageFlags,
    _query_pool: vk::QueryPool,
    _query: u32,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdCopyQueryPoolResults(
    _command_buffer: vk::CommandBuffer,
    _query_pool: vk::QueryPool,
    _first_query: u32,
    _query_count: u32,
    _dst_buffer: vk::Buffer,
    _dst_offset: vk::DeviceSize,
    _stride: vk::DeviceSize,
    _flags: vk::QueryResultFlags,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdPushConstants(
    _command_buffer: vk::CommandBuffer,
    _layout: vk::PipelineLayout,
    _stage_flags: vk::ShaderStageFlags,
    _offset: u32,
    _size: u32,
    _p_values: *const c_void,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdBeginRenderPass(
    _command_buffer: vk::CommandBuffer,
    _p_render_pass_begin: *const vk::RenderPassBeginInfo<'_>,
    _contents: vk::SubpassContents,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdNextSubpass(
    _command_buffer: vk::CommandBuffer,
    _contents: vk::SubpassContents,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkCmdEndRenderPass(_command_buffer: vk::CommandBuffer) {}

#[no_mangle]
pub unsafe extern "system" fn vkCmdExecuteCommands(
    _command_buffer: vk::CommandBuffer,
    _command_buffer_count: u32,
    _p_command_buffers: *const vk::CommandBuffer,
) {
}
