//! Object records and the opaque handle model.
//!
//! Every API object lives in a heap record that starts with an
//! [`ObjectHeader`]. The handle given to the application is the record's
//! address, so decoding a handle is a pointer cast. Debug builds check each
//! decode against the live-object table and the header's kind tag; release
//! builds trust the caller, as the Vulkan API contract requires.

use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};

use ash::vk;
use tracing::{debug, warn};

use crate::dispatch::LoaderSlot;
use crate::error::DriverError;
use crate::{handle_store, heap};

/// Alignment reported for every object that owns backing storage.
pub const STORAGE_ALIGNMENT: vk::DeviceSize = 4096;

/// Memory types an object with storage may bind to. The driver exposes one.
pub const STORAGE_MEMORY_TYPE_BITS: u32 = 0x1;

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Instance,
    PhysicalDevice,
    Device,
    Queue,
    CommandPool,
    CommandBuffer,
    DeviceMemory,
    Buffer,
    BufferView,
    Image,
    ImageView,
    Sampler,
    ShaderModule,
    PipelineCache,
    PipelineLayout,
    Pipeline,
    DescriptorSetLayout,
    DescriptorPool,
    DescriptorSet,
    RenderPass,
    Framebuffer,
    Fence,
    Semaphore,
    Event,
    QueryPool,
    Swapchain,
}

impl ObjectKind {
    /// Kinds the loader writes its dispatch table into.
    pub fn is_dispatchable(self) -> bool {
        matches!(
            self,
            ObjectKind::Instance
                | ObjectKind::PhysicalDevice
                | ObjectKind::Device
                | ObjectKind::Queue
                | ObjectKind::CommandBuffer
        )
    }
}

/// Memory-requirement capability of a record.
#[derive(Clone, Copy)]
pub enum StorageRequirement {
    NoStorageRequirement,
    HasStorageRequirement(unsafe fn(NonNull<ObjectHeader>) -> vk::MemoryRequirements),
}

#[repr(C)]
pub struct ObjectHeader {
    slot: LoaderSlot,
    kind: ObjectKind,
    context: *const ObjectHeader,
    storage: StorageRequirement,
}

impl ObjectHeader {
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn loader_data(&self) -> usize {
        self.slot.loader_data()
    }

    pub fn is_stamped(&self) -> bool {
        self.slot.is_stamped()
    }

    /// Header of the device this record was created under. Bootstrap
    /// objects (instances, devices) point at themselves.
    pub fn context(&self) -> *const ObjectHeader {
        self.context
    }

    pub fn has_storage(&self) -> bool {
        matches!(self.storage, StorageRequirement::HasStorageRequirement(_))
    }
}

/// An object record: the common header followed by the kind-specific body.
#[repr(C)]
pub struct Record<T> {
    header: ObjectHeader,
    pub body: T,
}

impl<T> Record<T> {
    pub fn header(&self) -> &ObjectHeader {
        &self.header
    }
}

/// Handle values render in hex in logs.
struct Hex(u64);

impl std::fmt::Display for Hex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A record body and the kind it is tagged with.
pub trait NullObject: Sized + 'static {
    const KIND: ObjectKind;
}

/// Bodies that report memory requirements for the storage they need.
pub trait StorageBacked: NullObject {
    fn memory_requirements(&self) -> vk::MemoryRequirements;
}

unsafe fn query_storage<T: StorageBacked>(header: NonNull<ObjectHeader>) -> vk::MemoryRequirements {
    // SAFETY: this query is only attached to headers that start a `Record<T>`.
    let record = unsafe { header.cast::<Record<T>>().as_ref() };
    record.body.memory_requirements()
}

/// A record owned by the driver. Dropping it destroys the object;
/// [`Owned::into_handle`] hands ownership to the application instead.
pub struct Owned<T: NullObject> {
    record: NonNull<Record<T>>,
}

impl<T: NullObject> Owned<T> {
    /// Mint a record stamped with the loader magic and tagged `T::KIND`.
    /// `context` is the owning device's header; `None` makes the record its
    /// own context.
    pub fn new(context: Option<NonNull<ObjectHeader>>, body: T) -> Result<Self, DriverError> {
        let record = heap::alloc(Record {
            header: ObjectHeader {
                slot: LoaderSlot::stamped(),
                kind: T::KIND,
                context: ptr::null(),
                storage: StorageRequirement::NoStorageRequirement,
            },
            body,
        })?;
        let own_header = record.cast::<ObjectHeader>();
        // SAFETY: the record is fresh and nothing else refers to it yet.
        unsafe { (*record.as_ptr()).header.context = context.unwrap_or(own_header).as_ptr() };

        let owned = Self { record };
        handle_store::register(owned.raw(), T::KIND);
        debug!(kind = ?T::KIND, handle = %Hex(owned.raw()), "object created");
        Ok(owned)
    }

    /// Take back ownership of a handle previously released with
    /// [`Owned::into_handle`].
    ///
    /// # Safety
    /// `raw` must be a live record of kind `T::KIND` that nothing else owns.
    pub unsafe fn from_raw(raw: u64) -> Self {
        check_live(raw, Some(T::KIND));
        Self {
            // SAFETY: live handles are never null.
            record: unsafe { NonNull::new_unchecked(raw as usize as *mut Record<T>) },
        }
    }

    pub fn raw(&self) -> u64 {
        self.record.as_ptr() as usize as u64
    }

    pub fn handle<H: vk::Handle>(&self) -> H {
        H::from_raw(self.raw())
    }

    pub fn into_handle<H: vk::Handle>(self) -> H {
        ManuallyDrop::new(self).handle()
    }

    pub fn header_ptr(&self) -> NonNull<ObjectHeader> {
        self.record.cast()
    }

    pub fn as_ptr(&self) -> NonNull<Record<T>> {
        self.record
    }
}

impl<T: StorageBacked> Owned<T> {
    /// [`Owned::new`] followed by [`attach_capability`].
    pub fn with_storage(context: Option<NonNull<ObjectHeader>>, body: T) -> Result<Self, DriverError> {
        let mut owned = Self::new(context, body)?;
        attach_capability(&mut owned);
        Ok(owned)
    }
}

impl<T: NullObject> Deref for Owned<T> {
    type Target = Record<T>;

    fn deref(&self) -> &Record<T> {
        // SAFETY: the record stays allocated while `self` owns it.
        unsafe { self.record.as_ref() }
    }
}

impl<T: NullObject> DerefMut for Owned<T> {
    fn deref_mut(&mut self) -> &mut Record<T> {
        // SAFETY: as above, and `&mut self` makes the access exclusive.
        unsafe { self.record.as_mut() }
    }
}

impl<T: NullObject> Drop for Owned<T> {
    fn drop(&mut self) {
        let raw = self.raw();
        handle_store::unregister(raw);
        // SAFETY: `self` owns the record and releases it exactly once.
        unsafe { heap::free(self.record) };
        debug!(kind = ?T::KIND, handle = %Hex(raw), "object destroyed");
    }
}

/// Give a record the memory-requirement query of its body type.
pub fn attach_capability<T: StorageBacked>(object: &mut Owned<T>) {
    object.header.storage = StorageRequirement::HasStorageRequirement(query_storage::<T>);
}

fn check_live(raw: u64, expected: Option<ObjectKind>) {
    if cfg!(debug_assertions) {
        let live = handle_store::kind_of(raw);
        match expected {
            Some(kind) => assert_eq!(live, Some(kind), "handle {raw:#x} is not a live {kind:?}"),
            None => assert!(live.is_some(), "handle {raw:#x} is not a live object"),
        }
    }
}

/// Resolve a handle to its record.
///
/// # Safety
/// `handle` must be a live, non-null handle of kind `T::KIND`.
pub unsafe fn decode<'a, T: NullObject>(handle: impl vk::Handle) -> &'a Record<T> {
    let raw = handle.as_raw();
    check_live(raw, Some(T::KIND));
    unsafe { &*(raw as usize as *const Record<T>) }
}

/// Resolve any live handle to its header.
///
/// # Safety
/// `handle` must be a live, non-null handle.
pub unsafe fn decode_header<'a>(handle: impl vk::Handle) -> &'a ObjectHeader {
    let raw = handle.as_raw();
    check_live(raw, None);
    unsafe { &*(raw as usize as *const ObjectHeader) }
}

/// Header pointer of a handle, used as the context of its children.
pub fn header_ptr(handle: impl vk::Handle) -> Option<NonNull<ObjectHeader>> {
    NonNull::new(handle.as_raw() as usize as *mut ObjectHeader)
}

/// Destroy the record behind `handle`, along with everything it owns.
/// Null handles are ignored.
///
/// # Safety
/// `handle` must be null or a live handle of kind `T::KIND` owned by the
/// application.
pub unsafe fn destroy<T: NullObject>(handle: impl vk::Handle) {
    let raw = handle.as_raw();
    if raw == 0 {
        return;
    }
    drop(unsafe { Owned::<T>::from_raw(raw) });
}

/// Query the memory requirements of an object through its capability.
/// Debug builds assert that `handle` is a live `kind`.
///
/// # Safety
/// `handle` must be null or a live handle of kind `kind`.
pub unsafe fn memory_requirements(
    handle: impl vk::Handle,
    kind: ObjectKind,
) -> Result<vk::MemoryRequirements, DriverError> {
    let raw = handle.as_raw();
    let header =
        NonNull::new(raw as usize as *mut ObjectHeader).ok_or(DriverError::NullHandle(kind))?;
    if let Some(live) = handle_store::kind_of(raw).filter(|&live| live != kind) {
        warn!(
            handle = %Hex(raw),
            expected = ?kind,
            actual = ?live,
            "memory requirements queried on the wrong kind"
        );
    }
    check_live(raw, Some(kind));
    // SAFETY: the caller guarantees the handle is live.
    let (storage, actual) = unsafe {
        let h = header.as_ref();
        (h.storage, h.kind)
    };
    match storage {
        StorageRequirement::HasStorageRequirement(query) => Ok(unsafe { query(header) }),
        StorageRequirement::NoStorageRequirement => Err(DriverError::NoStorageRequirement(actual)),
    }
}
