//! Integration test: object lifetime and allocation failure
//!
//! Parents release what they own when they are destroyed, and a host
//! allocation failure part-way through building an object releases
//! everything built so far. Both are observed through the live-object
//! table, so every test here holds `LOCK` to keep counts stable.
//!
//! Run with: cargo test -p nulldrv-icd --test object_lifetime

use std::ptr;

use ash::vk;
use ash::vk::Handle;
use parking_lot::{Mutex, MutexGuard};

use nulldrv_icd::device::{create_device, QueueRequest};
use nulldrv_icd::error::DriverError;
use nulldrv_icd::handle_store::live_count;
use nulldrv_icd::object::ObjectKind;
use nulldrv_icd::{command, descriptor, device, heap, instance, memory, pipeline, swapchain};

static LOCK: Mutex<()> = Mutex::new(());

fn serialized() -> MutexGuard<'static, ()> {
    let guard = LOCK.lock();
    heap::disarm();
    guard
}

fn vk_device(extensions: &[&std::ffi::CStr]) -> vk::Device {
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

// ── Destruction ─────────────────────────────────────────────

#[test]
fn test_destroying_instance_releases_physical_device() {
    let _guard = serialized();
    let gpus = live_count(ObjectKind::PhysicalDevice);
    let instances = live_count(ObjectKind::Instance);

    let mut inst = vk::Instance::null();
    let result = unsafe {
        instance::vkCreateInstance(&vk::InstanceCreateInfo::default(), ptr::null(), &mut inst)
    };
    assert_eq!(result, vk::Result::SUCCESS);

    let mut count = 1u32;
    let mut gpu = vk::PhysicalDevice::null();
    unsafe { instance::vkEnumeratePhysicalDevices(inst, &mut count, &mut gpu) };
    assert_eq!(live_count(ObjectKind::PhysicalDevice), gpus + 1);
    assert_eq!(live_count(ObjectKind::Instance), instances + 1);

    unsafe { instance::vkDestroyInstance(inst, ptr::null()) };
    assert_eq!(live_count(ObjectKind::PhysicalDevice), gpus);
    assert_eq!(live_count(ObjectKind::Instance), instances);
}

#[test]
fn test_destroying_device_releases_queues() {
    let _guard = serialized();
    let devices = live_count(ObjectKind::Device);
    let queues = live_count(ObjectKind::Queue);

    let dev = vk_device(&[]);
    assert_eq!(live_count(ObjectKind::Device), devices + 1);
    assert_eq!(live_count(ObjectKind::Queue), queues + 1);

    unsafe { device::vkDestroyDevice(dev, ptr::null()) };
    assert_eq!(live_count(ObjectKind::Device), devices);
    assert_eq!(live_count(ObjectKind::Queue), queues);
}

#[test]
fn test_destroying_pools_releases_their_children() {
    let _guard = serialized();
    let dev = vk_device(&[]);
    let sets = live_count(ObjectKind::DescriptorSet);
    let buffers = live_count(ObjectKind::CommandBuffer);

    let mut dpool = vk::DescriptorPool::null();
    unsafe {
        descriptor::vkCreateDescriptorPool(
            dev,
            &vk::DescriptorPoolCreateInfo::default().max_sets(4),
            ptr::null(),
            &mut dpool,
        )
    };
    let layouts = [vk::DescriptorSetLayout::null(); 4];
    let mut out_sets = [vk::DescriptorSet::null(); 4];
    let result = unsafe {
        descriptor::vkAllocateDescriptorSets(
            dev,
            &vk::DescriptorSetAllocateInfo::default()
                .descriptor_pool(dpool)
                .set_layouts(&layouts),
            out_sets.as_mut_ptr(),
        )
    };
    assert_eq!(result, vk::Result::SUCCESS);
    assert_eq!(live_count(ObjectKind::DescriptorSet), sets + 4);

    let mut cpool = vk::CommandPool::null();
    unsafe {
        command::vkCreateCommandPool(
            dev,
            &vk::CommandPoolCreateInfo::default(),
            ptr::null(),
            &mut cpool,
        )
    };
    let mut out_buffers = [vk::CommandBuffer::null(); 3];
    let result = unsafe {
        command::vkAllocateCommandBuffers(
            dev,
            &vk::CommandBufferAllocateInfo::default()
                .command_pool(cpool)
                .command_buffer_count(3),
            out_buffers.as_mut_ptr(),
        )
    };
    assert_eq!(result, vk::Result::SUCCESS);
    assert_eq!(live_count(ObjectKind::CommandBuffer), buffers + 3);

    unsafe {
        descriptor::vkDestroyDescriptorPool(dev, dpool, ptr::null());
        command::vkDestroyCommandPool(dev, cpool, ptr::null());
    }
    assert_eq!(live_count(ObjectKind::DescriptorSet), sets);
    assert_eq!(live_count(ObjectKind::CommandBuffer), buffers);

    unsafe { device::vkDestroyDevice(dev, ptr::null()) };
}

#[test]
fn test_destroying_swapchain_releases_images() {
    let _guard = serialized();
    let dev = vk_device(&[c"VK_KHR_swapchain"]);
    let images = live_count(ObjectKind::Image);

    let chain = create_swapchain(dev);
    let mut count = 0u32;
    unsafe { swapchain::vkGetSwapchainImagesKHR(dev, chain, &mut count, ptr::null_mut()) };
    let mut out = vec![vk::Image::null(); count as usize];
    let result =
        unsafe { swapchain::vkGetSwapchainImagesKHR(dev, chain, &mut count, out.as_mut_ptr()) };
    assert_eq!(result, vk::Result::SUCCESS);
    assert_eq!(live_count(ObjectKind::Image), images + count as usize);

    // Asking again hands back the same images.
    let mut again = vec![vk::Image::null(); count as usize];
    unsafe { swapchain::vkGetSwapchainImagesKHR(dev, chain, &mut count, again.as_mut_ptr()) };
    assert_eq!(out, again);
    assert_eq!(live_count(ObjectKind::Image), images + count as usize);

    unsafe { swapchain::vkDestroySwapchainKHR(dev, chain, ptr::null()) };
    assert_eq!(live_count(ObjectKind::Image), images);
    unsafe { device::vkDestroyDevice(dev, ptr::null()) };
}

fn create_swapchain(dev: vk::Device) -> vk::SwapchainKHR {
    let create_info = vk::SwapchainCreateInfoKHR::default()
        .min_image_count(2)
        .image_format(vk::Format::B8G8R8A8_UNORM)
        .image_extent(vk::Extent2D {
            width: 16,
            height: 16,
        })
        .image_array_layers(1)
        .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT);
    let mut chain = vk::SwapchainKHR::null();
    let result =
        unsafe { swapchain::vkCreateSwapchainKHR(dev, &create_info, ptr::null(), &mut chain) };
    assert_eq!(result, vk::Result::SUCCESS);
    chain
}

// ── Allocation failure ──────────────────────────────────────

#[test]
fn test_fault_fires_once() {
    let _guard = serialized();
    heap::fail_allocation_after(1);
    assert!(heap::is_armed());
    assert!(heap::alloc_bytes(8).is_ok());
    assert_eq!(heap::alloc_bytes(8), Err(DriverError::OutOfHostMemory));
    assert!(!heap::is_armed());
    assert!(heap::alloc_bytes(8).is_ok());
}

#[test]
fn test_device_creation_rolls_back_at_every_step() {
    let _guard = serialized();
    let devices = live_count(ObjectKind::Device);
    let queues = live_count(ObjectKind::Queue);
    let requests = [QueueRequest {
        family_index: 0,
        priority_count: 1,
    }];

    // Backend, device record, queue record.
    for successes in 0..3 {
        heap::fail_allocation_after(successes);
        match create_device(&[], &requests) {
            Err(DriverError::OutOfHostMemory) => {}
            Err(other) => panic!("expected OutOfHostMemory, got {:?}", other),
            Ok(_) => panic!("expected OutOfHostMemory after {successes} allocations"),
        }
        assert_eq!(live_count(ObjectKind::Device), devices, "after {successes}");
        assert_eq!(live_count(ObjectKind::Queue), queues, "after {successes}");
    }

    heap::fail_allocation_after(3);
    let device = create_device(&[], &requests).expect("enough allocations succeed");
    heap::disarm();
    assert!(device.body.queue(0).is_some());
    drop(device);
    assert_eq!(live_count(ObjectKind::Device), devices);
}

#[test]
fn test_vk_create_device_reports_out_of_memory() {
    let _guard = serialized();
    let priorities = [1.0f32];
    let queue_infos = [vk::DeviceQueueCreateInfo::default()
        .queue_family_index(0)
        .queue_priorities(&priorities)];
    let create_info = vk::DeviceCreateInfo::default().queue_create_infos(&queue_infos);

    heap::fail_allocation_after(2);
    let mut dev = vk::Device::null();
    let result = unsafe {
        device::vkCreateDevice(vk::PhysicalDevice::null(), &create_info, ptr::null(), &mut dev)
    };
    assert_eq!(result, vk::Result::ERROR_OUT_OF_HOST_MEMORY);
    assert!(dev.is_null());
}

#[test]
fn test_instance_and_physical_device_failures() {
    let _guard = serialized();
    heap::fail_allocation_after(0);
    let mut inst = vk::Instance::null();
    let result = unsafe {
        instance::vkCreateInstance(&vk::InstanceCreateInfo::default(), ptr::null(), &mut inst)
    };
    assert_eq!(result, vk::Result::ERROR_OUT_OF_HOST_MEMORY);
    assert!(inst.is_null());

    let result = unsafe {
        instance::vkCreateInstance(&vk::InstanceCreateInfo::default(), ptr::null(), &mut inst)
    };
    assert_eq!(result, vk::Result::SUCCESS);

    heap::fail_allocation_after(0);
    let mut count = 1u32;
    let mut gpu = vk::PhysicalDevice::null();
    let result = unsafe { instance::vkEnumeratePhysicalDevices(inst, &mut count, &mut gpu) };
    assert_eq!(result, vk::Result::ERROR_OUT_OF_HOST_MEMORY);

    let result = unsafe { instance::vkEnumeratePhysicalDevices(inst, &mut count, &mut gpu) };
    assert_eq!(result, vk::Result::SUCCESS);
    assert!(!gpu.is_null());

    unsafe { instance::vkDestroyInstance(inst, ptr::null()) };
}

#[test]
fn test_descriptor_set_allocation_is_all_or_nothing() {
    let _guard = serialized();
    let dev = vk_device(&[]);
    let mut pool = vk::DescriptorPool::null();
    unsafe {
        descriptor::vkCreateDescriptorPool(
            dev,
            &vk::DescriptorPoolCreateInfo::default().max_sets(4),
            ptr::null(),
            &mut pool,
        )
    };
    let sets = live_count(ObjectKind::DescriptorSet);

    let layouts = [vk::DescriptorSetLayout::null(); 4];
    let mut out = [vk::DescriptorSet::from_raw(0x1); 4];
    heap::fail_allocation_after(2);
    let result = unsafe {
        descriptor::vkAllocateDescriptorSets(
            dev,
            &vk::DescriptorSetAllocateInfo::default()
                .descriptor_pool(pool)
                .set_layouts(&layouts),
            out.as_mut_ptr(),
        )
    };
    assert_eq!(result, vk::Result::ERROR_OUT_OF_HOST_MEMORY);
    assert!(out.iter().all(|set| set.is_null()));
    assert_eq!(live_count(ObjectKind::DescriptorSet), sets);

    let record = unsafe { nulldrv_icd::object::decode::<descriptor::DescriptorPool>(pool) };
    assert_eq!(record.body.live_sets(), 0);

    unsafe {
        descriptor::vkDestroyDescriptorPool(dev, pool, ptr::null());
        device::vkDestroyDevice(dev, ptr::null());
    }
}

#[test]
fn test_command_buffer_allocation_is_all_or_nothing() {
    let _guard = serialized();
    let dev = vk_device(&[]);
    let mut pool = vk::CommandPool::null();
    unsafe {
        command::vkCreateCommandPool(
            dev,
            &vk::CommandPoolCreateInfo::default(),
            ptr::null(),
            &mut pool,
        )
    };
    let buffers = live_count(ObjectKind::CommandBuffer);

    let mut out = [vk::CommandBuffer::from_raw(0x1); 3];
    heap::fail_allocation_after(1);
    let result = unsafe {
        command::vkAllocateCommandBuffers(
            dev,
            &vk::CommandBufferAllocateInfo::default()
                .command_pool(pool)
                .command_buffer_count(3),
            out.as_mut_ptr(),
        )
    };
    assert_eq!(result, vk::Result::ERROR_OUT_OF_HOST_MEMORY);
    assert!(out.iter().all(|cmd| cmd.is_null()));
    assert_eq!(live_count(ObjectKind::CommandBuffer), buffers);

    unsafe {
        command::vkDestroyCommandPool(dev, pool, ptr::null());
        device::vkDestroyDevice(dev, ptr::null());
    }
}

#[test]
fn test_pipeline_creation_is_all_or_nothing() {
    let _guard = serialized();
    let dev = vk_device(&[]);
    let pipelines = live_count(ObjectKind::Pipeline);

    let infos = [vk::GraphicsPipelineCreateInfo::default(); 3];
    let mut out = [vk::Pipeline::from_raw(0x1); 3];
    heap::fail_allocation_after(1);
    let result = unsafe {
        pipeline::vkCreateGraphicsPipelines(
            dev,
            vk::PipelineCache::null(),
            3,
            infos.as_ptr(),
            ptr::null(),
            out.as_mut_ptr(),
        )
    };
    assert_eq!(result, vk::Result::ERROR_OUT_OF_HOST_MEMORY);
    assert!(out.iter().all(|p| p.is_null()));
    assert_eq!(live_count(ObjectKind::Pipeline), pipelines);

    unsafe { device::vkDestroyDevice(dev, ptr::null()) };
}

#[test]
fn test_swapchain_images_roll_back_then_retry() {
    let _guard = serialized();
    let dev = vk_device(&[c"VK_KHR_swapchain"]);
    let chain = create_swapchain(dev);
    let images = live_count(ObjectKind::Image);

    let mut count = 0u32;
    unsafe { swapchain::vkGetSwapchainImagesKHR(dev, chain, &mut count, ptr::null_mut()) };
    assert!(count >= 2);
    let mut out = vec![vk::Image::null(); count as usize];

    heap::fail_allocation_after(1);
    let result =
        unsafe { swapchain::vkGetSwapchainImagesKHR(dev, chain, &mut count, out.as_mut_ptr()) };
    assert_eq!(result, vk::Result::ERROR_OUT_OF_HOST_MEMORY);
    assert_eq!(live_count(ObjectKind::Image), images);

    let result =
        unsafe { swapchain::vkGetSwapchainImagesKHR(dev, chain, &mut count, out.as_mut_ptr()) };
    assert_eq!(result, vk::Result::SUCCESS);
    assert_eq!(live_count(ObjectKind::Image), images + count as usize);

    unsafe {
        swapchain::vkDestroySwapchainKHR(dev, chain, ptr::null());
        device::vkDestroyDevice(dev, ptr::null());
    }
}

#[test]
fn test_memory_allocation_failures() {
    let _guard = serialized();
    let dev = vk_device(&[]);
    let allocations = live_count(ObjectKind::DeviceMemory);

    // Backing store, then the record.
    for successes in 0..2 {
        heap::fail_allocation_after(successes);
        let mut mem = vk::DeviceMemory::null();
        let result = unsafe {
            memory::vkAllocateMemory(
                dev,
                &vk::MemoryAllocateInfo::default().allocation_size(4096),
                ptr::null(),
                &mut mem,
            )
        };
        assert_eq!(result, vk::Result::ERROR_OUT_OF_HOST_MEMORY);
        assert!(mem.is_null());
        assert_eq!(live_count(ObjectKind::DeviceMemory), allocations);
    }

    let mut mem = vk::DeviceMemory::null();
    let result = unsafe {
        memory::vkAllocateMemory(
            dev,
            &vk::MemoryAllocateInfo::default().allocation_size(u64::MAX),
            ptr::null(),
            &mut mem,
        )
    };
    assert_eq!(result, vk::Result::ERROR_OUT_OF_HOST_MEMORY);
    assert_eq!(live_count(ObjectKind::DeviceMemory), allocations);

    unsafe { device::vkDestroyDevice(dev, ptr::null()) };
}
