//! `VK_KHR_surface` queries and `VK_KHR_swapchain`.
//!
//! Surfaces belong to the loader, so the surface queries only describe what
//! the null GPU would accept. A swapchain owns its images; they are created
//! on the first `vkGetSwapchainImagesKHR` and carry the image storage
//! capability like any other image.

use std::ptr::NonNull;
use std::sync::atomic::{AtomicU32, Ordering};

use ash::vk;
use ash::vk::Handle;
use parking_lot::Mutex;
use tracing::warn;

use crate::device::Device;
use crate::error::{to_vk_result, DriverError};
use crate::extension::{Extension, PRESENTABLE_FORMATS};
use crate::image::Image;
use crate::object::{self, NullObject, ObjectHeader, ObjectKind, Owned, Record};
use crate::util;

const SWAPCHAIN_ENTRY_POINTS: [&str; 5] = [
    "vkCreateSwapchainKHR",
    "vkDestroySwapchainKHR",
    "vkGetSwapchainImagesKHR",
    "vkAcquireNextImageKHR",
    "vkQueuePresentKHR",
];

pub fn is_swapchain_entry_point(name: &str) -> bool {
    SWAPCHAIN_ENTRY_POINTS.contains(&name)
}

pub struct Swapchain {
    /// Owning device, not owned.
    pub device: NonNull<Record<Device>>,
    pub image_format: vk::Format,
    pub image_extent: vk::Extent2D,
    pub image_array_layers: u32,
    pub image_usage: vk::ImageUsageFlags,
    pub image_count: u32,
    images: Mutex<Vec<Owned<Image>>>,
    next_image: AtomicU32,
}

impl NullObject for Swapchain {
    const KIND: ObjectKind = ObjectKind::Swapchain;
}

impl Swapchain {
    pub fn new(device: NonNull<Record<Device>>, ci: &vk::SwapchainCreateInfoKHR<'_>) -> Self {
        let image_count = crate::config()
            .swapchain
            .image_count
            .max(ci.min_image_count)
            .max(1);
        Self {
            device,
            image_format: ci.image_format,
            image_extent: ci.image_extent,
            image_array_layers: ci.image_array_layers,
            image_usage: ci.image_usage,
            image_count,
            images: Mutex::new(Vec::new()),
            next_image: AtomicU32::new(0),
        }
    }

    fn image_desc(&self) -> Image {
        Image::new(
            vk::ImageType::TYPE_2D,
            self.image_format,
            vk::Extent3D {
                width: self.image_extent.width,
                height: self.image_extent.height,
                depth: 1,
            },
            1,
            self.image_array_layers,
            self.image_usage,
            vk::SampleCountFlags::TYPE_1,
        )
    }

    /// The swapchain's images, created together on first use.
    pub fn images(
        &self,
        context: Option<NonNull<ObjectHeader>>,
    ) -> Result<Vec<vk::Image>, DriverError> {
        let mut images = self.images.lock();
        if images.is_empty() {
            *images = (0..self.image_count)
                .map(|_| Owned::with_storage(context, self.image_desc()))
                .collect::<Result<Vec<_>, _>>()?;
        }
        Ok(images.iter().map(|image| image.handle()).collect())
    }

    /// Index of the next image, cycling through all of them.
    pub fn acquire(&self) -> u32 {
        self.next_image.fetch_add(1, Ordering::Relaxed) % self.image_count
    }
}

// ── Surface queries ─────────────────────────────────────────

#[no_mangle]
pub unsafe extern "system" fn vkDestroySurfaceKHR(
    _instance: vk::Instance,
    _surface: vk::SurfaceKHR,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
) {
}

#[no_mangle]
pub unsafe extern "system" fn vkGetPhysicalDeviceSurfaceSupportKHR(
    _physical_device: vk::PhysicalDevice,
    _queue_family_index: u32,
    _surface: vk::SurfaceKHR,
    p_supported: *mut vk::Bool32,
) -> vk::Result {
    if p_supported.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }
    *p_supported = vk::TRUE;
    vk::Result::SUCCESS
}

#[no_mangle]
pub unsafe extern "system" fn vkGetPhysicalDeviceSurfaceCapabilitiesKHR(
    _physical_device: vk::PhysicalDevice,
    _surface: vk::SurfaceKHR,
    p_surface_capabilities: *mut vk::SurfaceCapabilitiesKHR,
) -> vk::Result {
    if p_surface_capabilities.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }
    *p_surface_capabilities = vk::SurfaceCapabilitiesKHR {
        min_image_count: 1,
        max_image_count: 0,
        current_extent: vk::Extent2D {
            width: u32::MAX,
            height: u32::MAX,
        },
        min_image_extent: vk::Extent2D {
            width: 1,
            height: 1,
        },
        max_image_extent: vk::Extent2D {
            width: 16384,
            height: 16384,
        },
        max_image_array_layers: 1,
        supported_transforms: vk::SurfaceTransformFlagsKHR::IDENTITY,
        current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
        supported_composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE,
        supported_usage_flags: vk::ImageUsageFlags::COLOR_ATTACHMENT
            | vk::ImageUsageFlags::TRANSFER_DST,
    };
    vk::Result::SUCCESS
}

#[no_mangle]
pub unsafe extern "system" fn vkGetPhysicalDeviceSurfaceFormatsKHR(
    _physical_device: vk::PhysicalDevice,
    _surface: vk::SurfaceKHR,
    p_surface_format_count: *mut u32,
    p_surface_formats: *mut vk::SurfaceFormatKHR,
) -> vk::Result {
    let formats: Vec<vk::SurfaceFormatKHR> = PRESENTABLE_FORMATS
        .iter()
        .map(|&format| vk::SurfaceFormatKHR {
            format,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        })
        .collect();
    util::enumerate(&formats, p_surface_format_count, p_surface_formats)
}

#[no_mangle]
pub unsafe extern "system" fn vkGetPhysicalDeviceSurfacePresentModesKHR(
    _physical_device: vk::PhysicalDevice,
    _surface: vk::SurfaceKHR,
    p_present_mode_count: *mut u32,
    p_present_modes: *mut vk::PresentModeKHR,
) -> vk::Result {
    util::enumerate(&[vk::PresentModeKHR::FIFO], p_present_mode_count, p_present_modes)
}

// ── Swapchains ──────────────────────────────────────────────

#[no_mangle]
pub unsafe extern "system" fn vkCreateSwapchainKHR(
    device: vk::Device,
    p_create_info: *const vk::SwapchainCreateInfoKHR<'_>,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
    p_swapchain: *mut vk::SwapchainKHR,
) -> vk::Result {
    if p_create_info.is_null() || p_swapchain.is_null() || device.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }

    let dev = object::decode::<Device>(device);
    if !dev.body.extensions.contains(Extension::KhrSwapchain) {
        warn!("vkCreateSwapchainKHR on a device without {:?}", Extension::KhrSwapchain.name());
    }

    let swapchain = Swapchain::new(NonNull::from(dev), &*p_create_info);
    to_vk_result(
        Owned::new(object::header_ptr(device), swapchain)
            .map(|swapchain| *p_swapchain = swapchain.into_handle()),
    )
}

#[no_mangle]
pub unsafe extern "system" fn vkDestroySwapchainKHR(
    _device: vk::Device,
    swapchain: vk::SwapchainKHR,
    _p_allocator: *const vk::AllocationCallbacks<'_>,
) {
    object::destroy::<Swapchain>(swapchain);
}

#[no_mangle]
pub unsafe extern "system" fn vkGetSwapchainImagesKHR(
    device: vk::Device,
    swapchain: vk::SwapchainKHR,
    p_swapchain_image_count: *mut u32,
    p_swapchain_images: *mut vk::Image,
) -> vk::Result {
    if p_swapchain_image_count.is_null() || swapchain.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }

    let chain = object::decode::<Swapchain>(swapchain);
    if p_swapchain_images.is_null() {
        *p_swapchain_image_count = chain.body.image_count;
        return vk::Result::SUCCESS;
    }
    match chain.body.images(object::header_ptr(device)) {
        Ok(images) => util::enumerate(&images, p_swapchain_image_count, p_swapchain_images),
        Err(e) => e.into(),
    }
}

#[no_mangle]
pub unsafe extern "system" fn vkAcquireNextImageKHR(
    _device: vk::Device,
    swapchain: vk::SwapchainKHR,
    _timeout: u64,
    _semaphore: vk::Semaphore,
    _fence: vk::Fence,
    p_image_index: *mut u32,
) -> vk::Result {
    if p_image_index.is_null() || swapchain.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }
    *p_image_index = object::decode::<Swapchain>(swapchain).body.acquire();
    vk::Result::SUCCESS
}

#[no_mangle]
pub unsafe extern "system" fn vkQueuePresentKHR(
    _queue: vk::Queue,
    p_present_info: *const vk::PresentInfoKHR<'_>,
) -> vk::Result {
    if p_present_info.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }
    let info = &*p_present_info;
    if !info.p_results.is_null() {
        for i in 0..info.swapchain_count as usize {
            *info.p_results.add(i) = vk::Result::SUCCESS;
        }
    }
    vk::Result::SUCCESS
}
