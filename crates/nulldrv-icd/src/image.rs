//! Image, image view and sampler functions.

use ash::vk;
use tracing::warn;

use crate::error::to_vk_result;
use crate::format;
use crate::object::{
    self, NullObject, ObjectKind, Owned, StorageBacked, STORAGE_ALIGNMENT,
    STORAGE_MEMORY_TYPE_BITS,
};
use crate::util;

pub struct Image {
    pub image_type: vk::ImageType,
    pub format: vk::Format,
    pub extent: vk::Extent3D,
    pub mip_levels: u32,
    pub array_layers: u32,
    pub usage: vk::ImageUsageFlags,
    pub samples: vk::SampleCountFlags,
    /// Bytes of backing storage, computed once from the fields above.
    pub total_size: vk::DeviceSize,
}

impl NullObject for Image {
    const KIND: ObjectKind = ObjectKind::Image;
}

impl StorageBacked for Image {
    fn memory_requirements(&self) -> vk::MemoryRequirements {
        vk::MemoryRequirements {
            size: self.total_size,
            alignment: STORAGE_ALIGNMENT,
            memory_type_bits: STORAGE_MEMORY_TYPE_BITS,
        }
    }
}

impl Image {
    pub fn new(
        image_type: vk::ImageType,
        format: vk::Format,
        extent: vk::Extent3D,
        mip_levels: u32,
        array_layers: u32,
        usage: vk::ImageUsageFlags,
        samples: vk::SampleCountFlags,
    ) -> Self {
        let total_size = format::image_size(format, extent, mip_levels, array_layers, samples);
        Self {
            image_type,
            format,
            extent,
            mip_levels,
            array_layers,
            usage,
            samples,
            total_size,
        }
    }

    pub fn from_create_info(ci: &vk::ImageCreateInfo<'_>) -> Self {
        Self::new(
            ci.image_type,
            ci.format,
            ci.extent,
            ci.mip_levels,
            ci.array_layers,
            ci.usage,
            ci.samples,
        )
    }
}

pub struct ImageView {
    pub image: vk::Image,
    pub view_type: vk::ImageViewType,
    pub format: vk::Format,
}

impl NullObject for ImageView {
    const KIND: ObjectKind = ObjectKind::ImageView;
}

pub struct Sampler {
    pub mag_filter: vk::Filter,
    pub min_filter: vk::Filter,
}

impl NullObject for Sampler {
    const KIND: ObjectKind = ObjectKind::Sampler;
}

// ── Images ──────────────────────────────────────────────────

#[no_mangle]
pub unsafe extern "system" fn vkCreateImage(
    device: vk::Device,
    p_create_info: *const vk::ImageCreateInfo<'_>,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
    p_image: *mut vk::Image,
) -> vk::Result {
    if p_create_info.is_null() || p_image.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }

    let image = Image::from_create_info(&*p_create_info);
    to_vk_result(
        Owned::with_storage(object::header_ptr(device), image)
            .map(|image| *p_image = image.into_handle()),
    )
}

#[no_mangle]
pub unsafe extern "system" fn vkDestroyImage(
    _device: vk::Device,
    image: vk::Image,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
) {
    object::destroy::<Image>(image);
}

#[no_mangle]
pub unsafe extern "system" fn vkGetImageMemoryRequirements(
    _device: vk::Device,
    image: vk::Image,
    p_memory_requirements: *mut vk::MemoryRequirements,
) {
    if p_memory_requirements.is_null() {
        return;
    }
    match object::memory_requirements(image, ObjectKind::Image) {
        Ok(reqs) => *p_memory_requirements = reqs,
        Err(e) => warn!("vkGetImageMemoryRequirements: {e}"),
    }
}

#[no_mangle]
pub unsafe extern "system" fn vkBindImageMemory(
    _device: vk::Device,
    _image: vk::Image,
    _memory: vk::DeviceMemory,
    _memory_offset: vk::DeviceSize,
) -> vk::Result {
    vk::Result::SUCCESS
}

#[no_mangle]
pub unsafe extern "system" fn vkGetImageSparseMemoryRequirements(
    _device: vk::Device,
    _image: vk::Image,
    p_sparse_memory_requirement_count: *mut u32,
    p_sparse_memory_requirements: *mut vk::SparseImageMemoryRequirements,
) {
    let _ = util::enumerate(
        &[],
        p_sparse_memory_requirement_count,
        p_sparse_memory_requirements,
    );
}

#[no_mangle]
pub unsafe extern "system" fn vkGetImageSubresourceLayout(
    _device: vk::Device,
    _image: vk::Image,
    _p_subresource: *const vk::ImageSubresource,
    p_layout: *mut vk::SubresourceLayout,
) {
    if p_layout.is_null() {
        return;
    }
    *p_layout = vk::SubresourceLayout {
        offset: 0,
        size: 1,
        row_pitch: 4,
        array_pitch: 0,
        depth_pitch: 4,
    };
}

// ── Image views ─────────────────────────────────────────────

#[no_mangle]
pub unsafe extern "system" fn vkCreateImageView(
    device: vk::Device,
    p_create_info: *const vk::ImageViewCreateInfo<'_>,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
    p_view: *mut vk::ImageView,
) -> vk::Result {
    if p_create_info.is_null() || p_view.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }

    let ci = &*p_create_info;
    let view = ImageView {
        image: ci.image,
        view_type: ci.view_type,
        format: ci.format,
    };
    to_vk_result(
        Owned::new(object::header_ptr(device), view).map(|view| *p_view = view.into_handle()),
    )
}

#[no_mangle]
pub unsafe extern "system" fn vkDestroyImageView(
    _device: vk::Device,
    image_view: vk::ImageView,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
) {
    object::destroy::<ImageView>(image_view);
}

// ── Samplers ────────────────────────────────────────────────

#[no_mangle]
pub unsafe extern "system" fn vkCreateSampler(
    device: vk::Device,
    p_create_info: *const vk::SamplerCreateInfo<'_>,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
    p_sampler: *mut vk::Sampler,
) -> vk::Result {
    if p_create_info.is_null() || p_sampler.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }

    let ci = &*p_create_info;
    let sampler = Sampler {
        mag_filter: ci.mag_filter,
        min_filter: ci.min_filter,
    };
    to_vk_result(
        Owned::new(object::header_ptr(device), sampler)
            .map(|sampler| *p_sampler = sampler.into_handle()),
    )
}

#[no_mangle]
pub unsafe extern "system" fn vkDestroySampler(
    _device: vk::Device,
    sampler: vk::Sampler,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
) {
    object::destroy::<Sampler>(sampler);
}
