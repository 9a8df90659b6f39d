use dynarr_common::alloc::ALIGNMENT;
use dynarr_common::growth::align_up;
use std::mem::size_of;

/// Metadata fields kept in the hidden header.
///
/// The header is an array of `usize` words in front of element zero,
/// indexed by the field discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Field {
    Length = 0,
    Capacity = 1,
    Increment = 2,
    Stride = 3,
}

impl Field {
    pub const ALL: [Field; FIELD_COUNT] = [
        Field::Length,
        Field::Capacity,
        Field::Increment,
        Field::Stride,
    ];
}

pub(crate) const FIELD_COUNT: usize = 4;

/// Byte size of the header, padded so that element zero
/// keeps block alignment.
pub const HEADER_SIZE: usize = align_up(FIELD_COUNT * size_of::<usize>(), ALIGNMENT);

/// Read a header field backward from element zero.
///
/// # Safety
///
/// `data` must point to element zero of a live block, which
/// is exactly HEADER_SIZE bytes after block start.
#[inline]
pub(crate) unsafe fn read_field(data: *const u8, field: Field) -> usize {
    let words = data.sub(HEADER_SIZE) as *const usize;
    words.add(field as usize).read()
}

/// Write a header field backward from element zero.
///
/// # Safety
///
/// Same as [`read_field`], and caller must keep the header consistent.
#[inline]
pub(crate) unsafe fn write_field(data: *mut u8, field: Field, value: usize) {
    let words = data.sub(HEADER_SIZE) as *mut usize;
    words.add(field as usize).write(value)
}
