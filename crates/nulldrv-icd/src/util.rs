use std::ffi::{c_char, CStr};

use ash::vk;

/// Read an array of C strings, skipping null entries.
pub unsafe fn read_string_array<'a>(ptrs: *const *const c_char, count: u32) -> Vec<&'a CStr> {
    slice_or_empty(ptrs, count)
        .iter()
        .filter(|p| !p.is_null())
        .map(|&p| CStr::from_ptr(p))
        .collect()
}

/// View a `(pointer, count)` pair as a slice. A null pointer is empty.
pub unsafe fn slice_or_empty<'a, T>(ptr: *const T, count: u32) -> &'a [T] {
    if ptr.is_null() || count == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(ptr, count as usize)
    }
}

/// Copy `src` into a fixed-size C string field, truncating and NUL-terminating.
pub fn write_c_string(src: &[u8], dst: &mut [c_char]) {
    let len = src.len().min(dst.len().saturating_sub(1));
    for (d, &s) in dst.iter_mut().zip(&src[..len]) {
        *d = s as c_char;
    }
    if let Some(terminator) = dst.get_mut(len) {
        *terminator = 0;
    }
}

/// Two-call enumeration. With a null output array the count of `items` is
/// written; otherwise as many items as fit are copied and `INCOMPLETE` is
/// returned if that was fewer than all of them.
pub unsafe fn enumerate<T: Copy>(items: &[T], p_count: *mut u32, p_items: *mut T) -> vk::Result {
    if p_count.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }

    if p_items.is_null() {
        *p_count = items.len() as u32;
        return vk::Result::SUCCESS;
    }

    let requested = *p_count as usize;
    let available = items.len();
    let count = std::cmp::min(requested, available);
    std::ptr::copy_nonoverlapping(items.as_ptr(), p_items, count);
    *p_count = count as u32;

    if count < available {
        vk::Result::INCOMPLETE
    } else {
        vk::Result::SUCCESS
    }
}
