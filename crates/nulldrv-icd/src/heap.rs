//! Fallible host allocation.
//!
//! Every object record, shared backend and memory backing store goes through
//! here, so one armed fault makes exactly one allocation fail no matter which
//! object is being built.

use std::alloc::{self, Layout};
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::warn;

use crate::error::DriverError;

const DISARMED: u64 = u64::MAX;

/// Successful allocations left before the injected failure.
static COUNTDOWN: AtomicU64 = AtomicU64::new(DISARMED);

/// Let `successes` allocations through, then fail the next one. The fault
/// fires once and disarms itself.
pub fn fail_allocation_after(successes: u64) {
    COUNTDOWN.store(successes.min(DISARMED - 1), Ordering::SeqCst);
}

pub fn disarm() {
    COUNTDOWN.store(DISARMED, Ordering::SeqCst);
}

pub fn is_armed() -> bool {
    COUNTDOWN.load(Ordering::SeqCst) != DISARMED
}

fn charge() -> Result<(), DriverError> {
    let previous = COUNTDOWN.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
        DISARMED => None,
        0 => Some(DISARMED),
        left => Some(left - 1),
    });
    if previous == Ok(0) {
        warn!("injected host allocation failure");
        return Err(DriverError::OutOfHostMemory);
    }
    Ok(())
}

/// Move `value` into a fresh heap block.
pub fn alloc<T>(value: T) -> Result<NonNull<T>, DriverError> {
    charge()?;
    let layout = Layout::new::<T>();
    debug_assert!(layout.size() > 0);
    // SAFETY: callers only allocate records, which always contain a header.
    let block = unsafe { alloc::alloc(layout) } as *mut T;
    let block = NonNull::new(block).ok_or(DriverError::OutOfHostMemory)?;
    // SAFETY: the block is fresh, aligned and sized for T.
    unsafe { block.as_ptr().write(value) };
    Ok(block)
}

/// Drop and release a block from [`alloc`].
///
/// # Safety
/// `block` must come from [`alloc`] with the same `T` and not be freed yet.
pub unsafe fn free<T>(block: NonNull<T>) {
    unsafe {
        ptr::drop_in_place(block.as_ptr());
        alloc::dealloc(block.as_ptr() as *mut u8, Layout::new::<T>());
    }
}

/// Zero-filled byte storage of `size` bytes.
pub fn alloc_bytes(size: u64) -> Result<Vec<u8>, DriverError> {
    charge()?;
    let size = usize::try_from(size).map_err(|_| DriverError::OutOfHostMemory)?;
    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(size)
        .map_err(|_| DriverError::OutOfHostMemory)?;
    bytes.resize(size, 0);
    Ok(bytes)
}

/// Reference-counted state shared between records.
pub fn shared<T>(value: T) -> Result<Arc<T>, DriverError> {
    charge()?;
    Ok(Arc::new(value))
}
