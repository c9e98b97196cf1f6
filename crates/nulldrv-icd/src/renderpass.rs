//! Render passes and framebuffers.

use ash::vk;

use crate::error::to_vk_result;
use crate::object::{self, NullObject, ObjectKind, Owned};

pub struct RenderPass {
    pub attachment_count: u32,
    pub subpass_count: u32,
}

impl NullObject for RenderPass {
    const KIND: ObjectKind = ObjectKind::RenderPass;
}

pub struct Framebuffer {
    pub render_pass: vk::RenderPass,
    pub attachments: Vec<vk::ImageView>,
    pub width: u32,
    pub height: u32,
    pub layers: u32,
}

impl NullObject for Framebuffer {
    const KIND: ObjectKind = ObjectKind::Framebuffer;
}

#[no_mangle]
pub unsafe extern "system" fn vkCreateRenderPass(
    device: vk::Device,
    p_create_info: *const vk::RenderPassCreateInfo<'_>,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
    p_render_pass: *mut vk::RenderPass,
) -> vk::Result {
    if p_create_info.is_null() || p_render_pass.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }
    let ci = &*p_create_info;
    let render_pass = RenderPass {
        attachment_count: ci.attachment_count,
        subpass_count: ci.subpass_count,
    };
    to_vk_result(
        Owned::new(object::header_ptr(device), render_pass)
            .map(|render_pass| *p_render_pass = render_pass.into_handle()),
    )
}

#[no_mangle]
pub unsafe extern "system" fn vkDestroyRenderPass(
    _device: vk::Device,
    render_pass: vk::RenderPass,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
) {
    object::destroy::<RenderPass>(render_pass);
}

#[no_mangle]
pub unsafe extern "system" fn vkCreateFramebuffer(
    device: vk::Device,
    p_create_info: *const vk::FramebufferCreateInfo<'_>,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
    p_framebuffer: *mut vk::Framebuffer,
) -> vk::Result {
    if p_create_info.is_null() || p_framebuffer.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }
    let ci = &*p_create_info;
    let framebuffer = Framebuffer {
        render_pass: ci.render_pass,
        attachments: crate::util::slice_or_empty(ci.p_attachments, ci.attachment_count).to_vec(),
        width: ci.width,
        height: ci.height,
        layers: ci.layers,
    };
    to_vk_result(
        Owned::new(object::header_ptr(device), framebuffer)
            .map(|framebuffer| *p_framebuffer = framebuffer.into_handle()),
    )
}

#[no_mangle]
pub unsafe extern "system" fn vkDestroyFramebuffer(
    _device: vk::Device,
    framebuffer: vk::Framebuffer,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
) {
    object::destroy::<Framebuffer>(framebuffer);
}

#[no_mangle]
pub unsafe extern "system" fn vkGetRenderAreaGranularity(
    _device: vk::Device,
    _render_pass: vk::RenderPass,
    p_granularity: *mut vk::Extent2D,
) {
    if p_granularity.is_null() {
        return;
    }
    *p_granularity = vk::Extent2D {
        width: 1,
        height: 1,
    };
}
