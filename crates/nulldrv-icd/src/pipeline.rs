//! Shader modules, pipeline caches, pipeline layouts and pipelines.
//!
//! Nothing is compiled. Pipeline creation mints one record per create info
//! and reports success, or releases every record it made and nulls the
//! output array.

use std::os::raw::c_void;
use std::ptr::NonNull;

use ash::vk;

use crate::error::{to_vk_result, DriverError};
use crate::object::{self, NullObject, ObjectHeader, ObjectKind, Owned};

pub struct ShaderModule {
    pub code_size: usize,
}

impl NullObject for ShaderModule {
    const KIND: ObjectKind = ObjectKind::ShaderModule;
}

pub struct PipelineCache;

impl NullObject for PipelineCache {
    const KIND: ObjectKind = ObjectKind::PipelineCache;
}

pub struct PipelineLayout {
    pub set_layouts: Vec<vk::DescriptorSetLayout>,
    pub push_constant_range_count: u32,
}

impl NullObject for PipelineLayout {
    const KIND: ObjectKind = ObjectKind::PipelineLayout;
}

pub struct Pipeline {
    pub bind_point: vk::PipelineBindPoint,
    pub layout: vk::PipelineLayout,
}

impl NullObject for Pipeline {
    const KIND: ObjectKind = ObjectKind::Pipeline;
}

/// Create one pipeline per entry of `layouts`, all or nothing.
pub fn create_pipelines(
    context: Option<NonNull<ObjectHeader>>,
    bind_point: vk::PipelineBindPoint,
    layouts: impl Iterator<Item = vk::PipelineLayout>,
) -> Result<Vec<vk::Pipeline>, DriverError> {
    let created = layouts
        .map(|layout| Owned::new(context, Pipeline { bind_point, layout }))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(created.into_iter().map(|pipeline| pipeline.into_handle()).collect())
}

unsafe fn write_pipelines(
    result: Result<Vec<vk::Pipeline>, DriverError>,
    count: u32,
    p_pipelines: *mut vk::Pipeline,
) -> vk::Result {
    match result {
        Ok(pipelines) => {
            std::ptr::copy_nonoverlapping(pipelines.as_ptr(), p_pipelines, pipelines.len());
            vk::Result::SUCCESS
        }
        Err(e) => {
            for i in 0..count as usize {
                *p_pipelines.add(i) = vk::Pipeline::null();
            }
            e.into()
        }
    }
}

// ── Shader modules ──────────────────────────────────────────

#[no_mangle]
pub unsafe extern "system" fn vkCreateShaderModule(
    device: vk::Device,
    p_create_info: *const vk::ShaderModuleCreateInfo<'_>,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
    p_shader_module: *mut vk::ShaderModule,
) -> vk::Result {
    if p_create_info.is_null() || p_shader_module.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }
    let module = ShaderModule {
        code_size: (*p_create_info).code_size,
    };
    to_vk_result(
        Owned::new(object::header_ptr(device), module)
            .map(|module| *p_shader_module = module.into_handle()),
    )
}

#[no_mangle]
pub unsafe extern "system" fn vkDestroyShaderModule(
    _device: vk::Device,
    shader_module: vk::ShaderModule,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
) {
    object::destroy::<ShaderModule>(shader_module);
}

// ── Pipeline caches ─────────────────────────────────────────

#[no_mangle]
pub unsafe extern "system" fn vkCreatePipelineCache(
    device: vk::Device,
    p_create_info: *const vk::PipelineCacheCreateInfo<'_>,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
    p_pipeline_cache: *mut vk::PipelineCache,
) -> vk::Result {
    if p_create_info.is_null() || p_pipeline_cache.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }
    to_vk_result(
        Owned::new(object::header_ptr(device), PipelineCache)
            .map(|cache| *p_pipeline_cache = cache.into_handle()),
    )
}

#[no_mangle]
pub unsafe extern "system" fn vkDestroyPipelineCache(
    _device: vk::Device,
    pipeline_cache: vk::PipelineCache,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
) {
    object::destroy::<PipelineCache>(pipeline_cache);
}

/// Cache contents cannot be serialized.
#[no_mangle]
pub unsafe extern "system" fn vkGetPipelineCacheData(
    _device: vk::Device,
    _pipeline_cache: vk::PipelineCache,
    _p_data_size: *mut usize,
    _p_data: *mut c_void,
) -> vk::Result {
    vk::Result::ERROR_INITIALIZATION_FAILED
}

#[no_mangle]
pub unsafe extern "system" fn vkMergePipelineCaches(
    _device: vk::Device,
    _dst_cache: vk::PipelineCache,
    _src_cache_count: u32,
    _p_src_caches: *const vk::PipelineCache,
) -> vk::Result {
    vk::Result::ERROR_INITIALIZATION_FAILED
}

// ── Pipeline layouts ────────────────────────────────────────

#[no_mangle]
pub unsafe extern "system" fn vkCreatePipelineLayout(
    device: vk::Device,
    p_create_info: *const vk::PipelineLayoutCreateInfo<'_>,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
    p_pipeline_layout: *mut vk::PipelineLayout,
) -> vk::Result {
    if p_create_info.is_null() || p_pipeline_layout.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }
    let ci = &*p_create_info;
    let layout = PipelineLayout {
        set_layouts: crate::util::slice_or_empty(ci.p_set_layouts, ci.set_layout_count).to_vec(),
        push_constant_range_count: ci.push_constant_range_count,
    };
    to_vk_result(
        Owned::new(object::header_ptr(device), layout)
            .map(|layout| *p_pipeline_layout = layout.into_handle()),
    )
}

#[no_mangle]
pub unsafe extern "system" fn vkDestroyPipelineLayout(
    _device: vk::Device,
    pipeline_layout: vk::PipelineLayout,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
) {
    object::destroy::<PipelineLayout>(pipeline_layout);
}

// ── Pipelines ───────────────────────────────────────────────

#[no_mangle]
pub unsafe extern "system" fn vkCreateGraphicsPipelines(
    device: vk::Device,
    _pipeline_cache: vk::PipelineCache,
    create_info_count: u32,
    p_create_infos: *const vk::GraphicsPipelineCreateInfo<'_>,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
    p_pipelines: *mut vk::Pipeline,
) -> vk::Result {
    if p_pipelines.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }
    let infos = crate::util::slice_or_empty(p_create_infos, create_info_count);
    let result = create_pipelines(
        object::header_ptr(device),
        vk::PipelineBindPoint::GRAPHICS,
        infos.iter().map(|ci| ci.layout),
    );
    write_pipelines(result, create_info_count, p_pipelines)
}

#[no_mangle]
pub unsafe extern "system" fn vkCreateComputePipelines(
    device: vk::Device,
    _pipeline_cache: vk::PipelineCache,
    create_info_count: u32,
    p_create_infos: *const vk::ComputePipelineCreateInfo<'_>,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
    p_pipelines: *mut vk::Pipeline,
) -> vk::Result {
    if p_pipelines.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }
    let infos = crate::util::slice_or_empty(p_create_infos, create_info_count);
    let result = create_pipelines(
        object::header_ptr(device),
        vk::PipelineBindPoint::COMPUTE,
        infos.iter().map(|ci| ci.layout),
    );
    write_pipelines(result, create_info_count, p_pipelines)
}

#[no_mangle]
pub unsafe extern "system" fn vkDestroyPipeline(
    _device: vk::Device,
    pipeline: vk::Pipeline,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
) {
    object::destroy::<Pipeline>(pipeline);
}
