//! Integration test: memory requirements through the exported entry points
//!
//! Buffers and images (including swapchain images) report their storage;
//! everything else has no memory requirements and leaves the output alone.
//!
//! Run with: cargo test -p nulldrv-icd --test memory_requirements

use std::ptr;

use ash::vk;
use ash::vk::Handle;

use nulldrv_icd::{device, image, memory, swapchain};

fn create_device(extensions: &[&std::ffi::CStr]) -> vk::Device {
    let priorities = [1.0f32];
    let queue_infos = [vk::DeviceQueueCreateInfo::default()
        .queue_family_index(0)
        .queue_priorities(&priorities)];
    let names: Vec<_> = extensions.iter().map(|name| name.as_ptr()).collect();
    let create_info = vk::DeviceCreateInfo::default()
        .queue_create_infos(&queue_infos)
        .enabled_extension_names(&names);

    let mut handle = vk::Device::null();
    let result = unsafe {
        device::vkCreateDevice(vk::PhysicalDevice::null(), &create_info, ptr::null(), &mut handle)
    };
    assert_eq!(result, vk::Result::SUCCESS);
    handle
}

fn create_image(dev: vk::Device, format: vk::Format, extent: vk::Extent3D, mips: u32) -> vk::Image {
    let create_info = vk::ImageCreateInfo::default()
        .image_type(vk::ImageType::TYPE_2D)
        .format(format)
        .extent(extent)
        .mip_levels(mips)
        .array_layers(1)
        .samples(vk::SampleCountFlags::TYPE_1)
        .usage(vk::ImageUsageFlags::SAMPLED);
    let mut handle = vk::Image::null();
    let result = unsafe { image::vkCreateImage(dev, &create_info, ptr::null(), &mut handle) };
    assert_eq!(result, vk::Result::SUCCESS);
    handle
}

fn image_requirements(dev: vk::Device, handle: vk::Image) -> vk::MemoryRequirements {
    let mut reqs = vk::MemoryRequirements::default();
    unsafe { image::vkGetImageMemoryRequirements(dev, handle, &mut reqs) };
    reqs
}

#[test]
fn test_buffer_requirements() {
    let dev = create_device(&[]);
    let create_info = vk::BufferCreateInfo::default()
        .size(1000)
        .usage(vk::BufferUsageFlags::UNIFORM_BUFFER);
    let mut buffer = vk::Buffer::null();
    let result = unsafe { memory::vkCreateBuffer(dev, &create_info, ptr::null(), &mut buffer) };
    assert_eq!(result, vk::Result::SUCCESS);

    let mut reqs = vk::MemoryRequirements::default();
    unsafe { memory::vkGetBufferMemoryRequirements(dev, buffer, &mut reqs) };
    assert_eq!(reqs.size, 1000);
    assert_eq!(reqs.alignment, 4096);
    assert_eq!(reqs.memory_type_bits, 0x1);

    unsafe {
        memory::vkDestroyBuffer(dev, buffer, ptr::null());
        device::vkDestroyDevice(dev, ptr::null());
    }
}

#[test]
fn test_image_requirements_single_level() {
    let dev = create_device(&[]);
    let extent = vk::Extent3D {
        width: 64,
        height: 64,
        depth: 1,
    };
    let handle = create_image(dev, vk::Format::R8G8B8A8_UNORM, extent, 1);

    let reqs = image_requirements(dev, handle);
    assert_eq!(reqs.size, 64 * 64 * 4);
    assert_eq!(reqs.alignment, 4096);
    assert_eq!(reqs.memory_type_bits, 0x1);

    unsafe {
        image::vkDestroyImage(dev, handle, ptr::null());
        device::vkDestroyDevice(dev, ptr::null());
    }
}

#[test]
fn test_image_requirements_full_mip_chain() {
    let dev = create_device(&[]);
    let extent = vk::Extent3D {
        width: 64,
        height: 64,
        depth: 1,
    };
    let handle = create_image(dev, vk::Format::R8G8B8A8_UNORM, extent, 7);

    // 64² + 32² + 16² + 8² + 4² + 2² + 1² texels
    let reqs = image_requirements(dev, handle);
    assert_eq!(reqs.size, 5461 * 4);

    unsafe {
        image::vkDestroyImage(dev, handle, ptr::null());
        device::vkDestroyDevice(dev, ptr::null());
    }
}

#[test]
fn test_compressed_image_requirements() {
    let dev = create_device(&[]);
    let extent = vk::Extent3D {
        width: 16,
        height: 16,
        depth: 1,
    };
    let handle = create_image(dev, vk::Format::BC1_RGBA_UNORM_BLOCK, extent, 1);

    let reqs = image_requirements(dev, handle);
    assert_eq!(reqs.size, 4 * 4 * 8);

    unsafe {
        image::vkDestroyImage(dev, handle, ptr::null());
        device::vkDestroyDevice(dev, ptr::null());
    }
}

// Debug builds assert on the wrong-kind handle, which cannot unwind out of
// the entry point.
#[test]
#[cfg(not(debug_assertions))]
fn test_sampler_has_no_requirements() {
    use ash::vk::Handle;

    let dev = create_device(&[]);
    let create_info = vk::SamplerCreateInfo::default()
        .mag_filter(vk::Filter::LINEAR)
        .min_filter(vk::Filter::LINEAR);
    let mut sampler = vk::Sampler::null();
    let result = unsafe { image::vkCreateSampler(dev, &create_info, ptr::null(), &mut sampler) };
    assert_eq!(result, vk::Result::SUCCESS);

    let sentinel = vk::MemoryRequirements {
        size: 7,
        alignment: 7,
        memory_type_bits: 7,
    };
    let mut reqs = sentinel;
    unsafe {
        image::vkGetImageMemoryRequirements(dev, vk::Image::from_raw(sampler.as_raw()), &mut reqs)
    };
    assert_eq!(reqs.size, sentinel.size);
    assert_eq!(reqs.alignment, sentinel.alignment);
    assert_eq!(reqs.memory_type_bits, sentinel.memory_type_bits);

    unsafe {
        image::vkDestroySampler(dev, sampler, ptr::null());
        device::vkDestroyDevice(dev, ptr::null());
    }
}

#[test]
fn test_null_image_leaves_output_untouched() {
    let dev = create_device(&[]);
    let mut reqs = vk::MemoryRequirements {
        size: 3,
        alignment: 3,
        memory_type_bits: 3,
    };
    unsafe { image::vkGetImageMemoryRequirements(dev, vk::Image::null(), &mut reqs) };
    assert_eq!(reqs.size, 3);
    unsafe { device::vkDestroyDevice(dev, ptr::null()) };
}

#[test]
fn test_swapchain_images_report_storage() {
    let dev = create_device(&[c"VK_KHR_swapchain"]);
    let create_info = vk::SwapchainCreateInfoKHR::default()
        .min_image_count(3)
        .image_format(vk::Format::B8G8R8A8_UNORM)
        .image_color_space(vk::ColorSpaceKHR::SRGB_NONLINEAR)
        .image_extent(vk::Extent2D {
            width: 32,
            height: 32,
        })
        .image_array_layers(1)
        .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
        .present_mode(vk::PresentModeKHR::FIFO);
    let mut chain = vk::SwapchainKHR::null();
    let result =
        unsafe { swapchain::vkCreateSwapchainKHR(dev, &create_info, ptr::null(), &mut chain) };
    assert_eq!(result, vk::Result::SUCCESS);

    let mut count = 0u32;
    let result =
        unsafe { swapchain::vkGetSwapchainImagesKHR(dev, chain, &mut count, ptr::null_mut()) };
    assert_eq!(result, vk::Result::SUCCESS);
    assert!(count >= 3, "at least minImageCount images, got {count}");

    let mut images = vec![vk::Image::null(); count as usize];
    let result =
        unsafe { swapchain::vkGetSwapchainImagesKHR(dev, chain, &mut count, images.as_mut_ptr()) };
    assert_eq!(result, vk::Result::SUCCESS);

    for &img in &images {
        assert!(!img.is_null());
        let reqs = image_requirements(dev, img);
        assert_eq!(reqs.size, 32 * 32 * 4);
        assert_eq!(reqs.alignment, 4096);
    }

    unsafe {
        swapchain::vkDestroySwapchainKHR(dev, chain, ptr::null());
        device::vkDestroyDevice(dev, ptr::null());
    }
}
