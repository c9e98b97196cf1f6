//! Integration test: object records and handle decoding
//!
//! Builds records through the Rust-level API and checks the header layout
//! the loader relies on: the magic slot, the kind tag and the context
//! pointer, plus the memory-requirement capability dispatch.
//!
//! Run with: cargo test -p nulldrv-icd --test handle_model

use ash::vk;
use ash::vk::Handle;

use nulldrv_icd::device::{create_device, Device, QueueRequest};
use nulldrv_icd::dispatch::ICD_LOADER_MAGIC;
use nulldrv_icd::error::DriverError;
use nulldrv_icd::handle_store;
use nulldrv_icd::image::{Image, Sampler};
use nulldrv_icd::instance::create_instance;
use nulldrv_icd::memory::Buffer;
use nulldrv_icd::object::{self, ObjectHeader, ObjectKind, Owned};

const ONE_QUEUE: [QueueRequest; 1] = [QueueRequest {
    family_index: 0,
    priority_count: 1,
}];

fn sampler() -> Sampler {
    Sampler {
        mag_filter: vk::Filter::LINEAR,
        min_filter: vk::Filter::NEAREST,
    }
}

fn rgba_image(device: &Owned<Device>) -> Owned<Image> {
    Owned::with_storage(
        Some(device.header_ptr()),
        Image::new(
            vk::ImageType::TYPE_2D,
            vk::Format::R8G8B8A8_UNORM,
            vk::Extent3D {
                width: 16,
                height: 16,
                depth: 1,
            },
            1,
            1,
            vk::ImageUsageFlags::SAMPLED,
            vk::SampleCountFlags::TYPE_1,
        ),
    )
    .expect("create image")
}

#[test]
fn test_records_are_stamped_with_loader_magic() {
    let instance = create_instance().expect("create instance");
    let header = instance.header();

    assert_eq!(header.loader_data(), ICD_LOADER_MAGIC);
    assert!(header.is_stamped());
    assert_eq!(header.kind(), ObjectKind::Instance);
    assert!(header.kind().is_dispatchable());
    assert!(!header.has_storage());
}

#[test]
fn test_bootstrap_objects_are_their_own_context() {
    let instance = create_instance().expect("create instance");
    let own: *const ObjectHeader = instance.header_ptr().as_ptr();
    assert_eq!(instance.header().context(), own);

    let device = create_device(&[], &ONE_QUEUE).expect("create device");
    let own: *const ObjectHeader = device.header_ptr().as_ptr();
    assert_eq!(device.header().context(), own);
}

#[test]
fn test_device_children_point_at_their_device() {
    let device = create_device(&[], &ONE_QUEUE).expect("create device");
    let device_header: *const ObjectHeader = device.header_ptr().as_ptr();

    let queue = device.body.queue(0).expect("queue for family 0");
    assert_eq!(queue.header().kind(), ObjectKind::Queue);
    assert_eq!(queue.header().context(), device_header);
    assert!(queue.header().is_stamped());

    let sampler = Owned::new(Some(device.header_ptr()), sampler()).expect("create sampler");
    assert_eq!(sampler.header().context(), device_header);
    assert!(!sampler.header().kind().is_dispatchable());
}

#[test]
fn test_handles_are_distinct_and_registered() {
    let device = create_device(&[], &[]).expect("create device");
    let a = Owned::new(Some(device.header_ptr()), sampler()).expect("create sampler");
    let b = Owned::new(Some(device.header_ptr()), sampler()).expect("create sampler");

    assert_ne!(a.raw(), b.raw());
    assert_ne!(a.raw(), 0);
    assert!(handle_store::is_live(a.raw()));
    assert_eq!(handle_store::kind_of(a.raw()), Some(ObjectKind::Sampler));
    assert_eq!(handle_store::kind_of(b.raw()), Some(ObjectKind::Sampler));
    assert_eq!(handle_store::kind_of(device.raw()), Some(ObjectKind::Device));
}

#[test]
fn test_decode_round_trips_through_the_handle() {
    let device = create_device(&[], &[]).expect("create device");
    let handle: vk::Sampler = Owned::new(Some(device.header_ptr()), sampler())
        .expect("create sampler")
        .into_handle();

    let record = unsafe { object::decode::<Sampler>(handle) };
    assert_eq!(record.body.mag_filter, vk::Filter::LINEAR);
    assert_eq!(record.body.min_filter, vk::Filter::NEAREST);

    let header = unsafe { object::decode_header(handle) };
    assert_eq!(header.kind(), ObjectKind::Sampler);

    unsafe { object::destroy::<Sampler>(handle) };
}

#[test]
fn test_buffer_capability_reports_its_size() {
    let device = create_device(&[], &[]).expect("create device");
    let buffer = Owned::with_storage(
        Some(device.header_ptr()),
        Buffer {
            size: 1000,
            usage: vk::BufferUsageFlags::VERTEX_BUFFER,
        },
    )
    .expect("create buffer");
    assert!(buffer.header().has_storage());

    match unsafe { object::memory_requirements(buffer.handle::<vk::Buffer>(), ObjectKind::Buffer) } {
        Ok(reqs) => {
            assert_eq!(reqs.size, 1000);
            assert_eq!(reqs.alignment, object::STORAGE_ALIGNMENT);
            assert_eq!(reqs.memory_type_bits, object::STORAGE_MEMORY_TYPE_BITS);
        }
        other => panic!("expected memory requirements, got {:?}", other.err()),
    }
}

#[test]
fn test_image_capability_uses_image_size() {
    let device = create_device(&[], &[]).expect("create device");
    let image = rgba_image(&device);

    let reqs = unsafe { object::memory_requirements(image.handle::<vk::Image>(), ObjectKind::Image) }
        .expect("image has storage");
    assert_eq!(reqs.size, 16 * 16 * 4);
    assert_eq!(reqs.alignment, 4096);
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "is not a live Buffer")]
fn test_buffer_query_on_an_image_asserts() {
    let device = create_device(&[], &[]).expect("create device");
    let image = rgba_image(&device);

    let as_buffer = vk::Buffer::from_raw(image.raw());
    let _ = unsafe { object::memory_requirements(as_buffer, ObjectKind::Buffer) };
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "is not a live Image")]
fn test_image_query_on_a_sampler_asserts() {
    let device = create_device(&[], &[]).expect("create device");
    let sampler = Owned::new(Some(device.header_ptr()), sampler()).expect("create sampler");

    let as_image = vk::Image::from_raw(sampler.raw());
    let _ = unsafe { object::memory_requirements(as_image, ObjectKind::Image) };
}

#[test]
#[cfg(not(debug_assertions))]
fn test_objects_without_storage_refuse_the_query() {
    let device = create_device(&[], &[]).expect("create device");
    let sampler = Owned::new(Some(device.header_ptr()), sampler()).expect("create sampler");

    // Asked for as an image, answered as what the record really is.
    let as_image = vk::Image::from_raw(sampler.raw());
    match unsafe { object::memory_requirements(as_image, ObjectKind::Image) } {
        Err(DriverError::NoStorageRequirement(kind)) => assert_eq!(kind, ObjectKind::Sampler),
        other => panic!("expected NoStorageRequirement, got {:?}", other.err()),
    }
}

#[test]
fn test_null_handle_query_fails() {
    match unsafe { object::memory_requirements(vk::Buffer::null(), ObjectKind::Buffer) } {
        Err(DriverError::NullHandle(kind)) => assert_eq!(kind, ObjectKind::Buffer),
        other => panic!("expected NullHandle, got {:?}", other.err()),
    }
}

#[test]
fn test_destroying_a_null_handle_is_a_no_op() {
    unsafe {
        object::destroy::<Sampler>(vk::Sampler::null());
        object::destroy::<Image>(vk::Image::null());
    }
}
