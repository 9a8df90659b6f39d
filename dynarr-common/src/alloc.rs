use crate::error::{Error, Result};
use std::alloc::Layout;
use std::ptr::NonNull;

/// Minimum alignment of all blocks allocated by opaque arrays.
/// Element zero is placed at an offset which is multiple of it,
/// so any type with alignment no more than 16 bytes can be viewed
/// in place.
pub const ALIGNMENT: usize = 16;

/// Returns layout of a block with a header of `header` bytes
/// followed by `cap` elements of `stride` bytes.
#[inline]
pub fn block_layout(header: usize, cap: usize, stride: usize, align: usize) -> Result<Layout> {
    let size = cap
        .checked_mul(stride)
        .and_then(|data| data.checked_add(header))
        .ok_or(Error::CapacityOverflow)?;
    let layout = Layout::from_size_align(size, align.max(ALIGNMENT))?;
    Ok(layout)
}

/// Allocate a memory block with given layout.
///
/// The memory is not initialized.
/// Caller should always call `free_block` with the same layout
/// to release the memory.
#[inline]
pub fn alloc_block(layout: Layout) -> Result<NonNull<u8>> {
    if layout.size() == 0 {
        return Err(Error::InvalidArgument("zero-sized block"));
    }
    // SAFETY:
    //
    // layout has non-zero size.
    let ptr = unsafe { std::alloc::alloc(layout) };
    NonNull::new(ptr).ok_or_else(|| {
        log::debug!("failed to allocate block of {} bytes", layout.size());
        Error::InsufficientMemory(layout.size())
    })
}

/// Reallocate a memory block to new size, keeping its alignment.
/// Contents up to the smaller of old and new size are preserved.
///
/// On failure, the old block is untouched and still owned by caller.
///
/// # Safety
///
/// Caller must guarantee the pointer was allocated by `alloc_block`
/// or `realloc_block` with exactly the `old` layout.
/// After a successful call, the old pointer must not be used.
#[inline]
pub unsafe fn realloc_block(ptr: NonNull<u8>, old: Layout, new_size: usize) -> Result<NonNull<u8>> {
    if new_size == 0 {
        return Err(Error::InvalidArgument("zero-sized block"));
    }
    // realloc requires rounded size not to overflow isize.
    let new = Layout::from_size_align(new_size, old.align())?;
    let new_ptr = std::alloc::realloc(ptr.as_ptr(), old, new.size());
    NonNull::new(new_ptr).ok_or_else(|| {
        log::debug!(
            "failed to reallocate block from {} to {} bytes",
            old.size(),
            new_size
        );
        Error::InsufficientMemory(new_size)
    })
}

/// Release memory allocated by [`alloc_block`] or [`realloc_block`].
///
/// # Safety
///
/// Caller must guarantee the input pointer and layout is identical to
/// the allocation, and only call this method once. After this call,
/// the memory must not be used.
#[inline]
pub unsafe fn free_block(ptr: NonNull<u8>, layout: Layout) {
    std::alloc::dealloc(ptr.as_ptr(), layout)
}
