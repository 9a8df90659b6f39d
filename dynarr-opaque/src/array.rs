use crate::header::{read_field, write_field, Field, HEADER_SIZE};
use dynarr_common::alloc::{alloc_block, block_layout, free_block, ALIGNMENT};
use dynarr_common::growth::{adjusted_capacity, grown_capacity};
use dynarr_common::{ArrayConfig, Error, Result};
use std::alloc::Layout;
use std::fmt;
use std::mem::size_of;
use std::ptr::{self, NonNull};

/// OpaqueArray is a type-erased growable array.
///
/// Element size is captured as `stride` at creation, so one
/// implementation serves every element type. Metadata is kept in a
/// hidden header right before element zero, and the handle only holds
/// the pointer to element zero:
///
/// ```text
///                                   handle
///                                     |
///                                     v
/// +--------+----------+-----------+--------+---------+---------+-----+
/// | length | capacity | increment | stride | elem[0] | elem[1] | ... |
/// +--------+----------+-----------+--------+---------+---------+-----+
/// ```
///
/// Any call that changes capacity moves data into a freshly
/// allocated block. Methods that may do so take `&mut self` and
/// update the handle in place, so previously derived slices cannot
/// outlive them.
pub struct OpaqueArray {
    data: NonNull<u8>,
}

unsafe impl Send for OpaqueArray {}
unsafe impl Sync for OpaqueArray {}

impl OpaqueArray {
    /// Create an array for element type T with capacity and increment
    /// both set to 2.
    #[inline]
    pub fn new<T>() -> Result<Self> {
        Self::with_config::<T>(&ArrayConfig::default())
    }

    /// Create an array for element type T with given config.
    #[inline]
    pub fn with_config<T>(config: &ArrayConfig) -> Result<Self> {
        Self::create(config.capacity, config.increment, size_of::<T>())
    }

    /// Create an array with given capacity, increment and stride.
    pub fn create(capacity: usize, increment: usize, stride: usize) -> Result<Self> {
        ArrayConfig::new(capacity, increment).validate()?;
        let block = alloc_block(Self::layout(capacity, stride)?)?;
        // SAFETY:
        //
        // block is at least HEADER_SIZE bytes, so element zero is
        // within or one past the end of the block.
        unsafe {
            let data = block.as_ptr().add(HEADER_SIZE);
            write_field(data, Field::Length, 0);
            write_field(data, Field::Capacity, capacity);
            write_field(data, Field::Increment, increment);
            write_field(data, Field::Stride, stride);
            Ok(OpaqueArray {
                data: NonNull::new_unchecked(data),
            })
        }
    }

    /// Returns value of given header field.
    #[inline]
    pub fn field(&self, field: Field) -> usize {
        // SAFETY:
        //
        // handle always points to element zero of a live block.
        unsafe { read_field(self.data.as_ptr(), field) }
    }

    /// Overwrite given header field.
    ///
    /// # Safety
    ///
    /// Caller must keep the header consistent with the block:
    /// length must not exceed capacity, elements below length must be
    /// initialized, and capacity and stride must match the allocation
    /// so it can be released.
    #[inline]
    pub unsafe fn set_field(&mut self, field: Field, value: usize) {
        write_field(self.data.as_ptr(), field, value)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.field(Field::Length)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.field(Field::Capacity)
    }

    #[inline]
    pub fn increment(&self) -> usize {
        self.field(Field::Increment)
    }

    /// Returns byte size of one element.
    #[inline]
    pub fn stride(&self) -> usize {
        self.field(Field::Stride)
    }

    /// Returns pointer to element zero.
    ///
    /// The pointer is invalidated by any call that takes `&mut self`.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.data.as_ptr()
    }

    /// Returns bytes of all live elements.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY:
        //
        // first length * stride bytes after element zero are initialized.
        unsafe { std::slice::from_raw_parts(self.data.as_ptr(), self.len() * self.stride()) }
    }

    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY:
        //
        // same as as_bytes(), and self is exclusively borrowed.
        unsafe { std::slice::from_raw_parts_mut(self.data.as_ptr(), self.len() * self.stride()) }
    }

    /// Returns bytes of element at given position.
    #[inline]
    pub fn element(&self, index: usize) -> Result<&[u8]> {
        let len = self.len();
        if index >= len {
            return Err(Error::IndexOutOfBound { index, len });
        }
        let stride = self.stride();
        Ok(&self.as_bytes()[index * stride..(index + 1) * stride])
    }

    /// Move all elements into a new block with given capacity.
    ///
    /// Length, increment and stride are preserved.
    /// Capacity less than current length is rejected.
    pub fn resize(&mut self, capacity: usize) -> Result<()> {
        let len = self.len();
        if capacity < len {
            return Err(Error::InvalidArgument("capacity less than length"));
        }
        let old_cap = self.capacity();
        let mut new = OpaqueArray::create(capacity, self.increment(), self.stride())?;
        // SAFETY:
        //
        // both blocks hold at least length elements of the same stride,
        // and they do not overlap.
        unsafe {
            ptr::copy_nonoverlapping(self.as_ptr(), new.as_mut_ptr(), len * self.stride());
            new.set_field(Field::Length, len);
        }
        // old block is released by drop on assignment.
        *self = new;
        log::trace!("opaque array resized, capacity {} -> {}", old_cap, capacity);
        Ok(())
    }

    /// Grow capacity by one increment.
    #[inline]
    pub fn capacity_increment(&mut self) -> Result<()> {
        let capacity = grown_capacity(self.capacity(), self.increment())?;
        self.resize(capacity)
    }

    /// Shrink or grow capacity to the smallest multiple of increment
    /// that holds all elements.
    /// Calling it repeatedly without other changes is no-op.
    pub fn capacity_deflate(&mut self) -> Result<()> {
        let capacity = adjusted_capacity(self.len(), self.increment())?;
        if capacity != self.capacity() {
            self.resize(capacity)?;
        }
        Ok(())
    }

    /// Insert element bytes at given position, shifting elements after
    /// it to the right. If the array is full, capacity grows by one
    /// increment first.
    pub fn push_at(&mut self, index: usize, elem: &[u8]) -> Result<()> {
        let stride = self.stride();
        if elem.len() != stride {
            return Err(Error::StrideMismatch {
                expected: stride,
                actual: elem.len(),
            });
        }
        let len = self.len();
        if index > len {
            return Err(Error::IndexOutOfBound { index, len });
        }
        if len >= self.capacity() {
            self.capacity_increment()?;
        }
        // SAFETY:
        //
        // index <= len < capacity, so shifted range and the gap are
        // within the block. elem cannot alias the block as self is
        // exclusively borrowed.
        unsafe {
            let p = self.data.as_ptr().add(index * stride);
            if index < len {
                ptr::copy(p, p.add(stride), (len - index) * stride);
            }
            ptr::copy_nonoverlapping(elem.as_ptr(), p, stride);
            self.set_field(Field::Length, len + 1);
        }
        Ok(())
    }

    /// Append element bytes at the end.
    #[inline]
    pub fn push_back(&mut self, elem: &[u8]) -> Result<()> {
        self.push_at(self.len(), elem)
    }

    /// Insert element bytes at the front.
    #[inline]
    pub fn push_front(&mut self, elem: &[u8]) -> Result<()> {
        self.push_at(0, elem)
    }

    /// Remove element at given position, shifting elements after it
    /// to the left. If `dest` is provided, the removed bytes are copied
    /// into it. Capacity is never changed.
    pub fn pop_at(&mut self, index: usize, dest: Option<&mut [u8]>) -> Result<()> {
        let len = self.len();
        if index >= len {
            return Err(Error::IndexOutOfBound { index, len });
        }
        let stride = self.stride();
        if let Some(dest) = dest.as_ref() {
            if dest.len() != stride {
                return Err(Error::StrideMismatch {
                    expected: stride,
                    actual: dest.len(),
                });
            }
        }
        // SAFETY:
        //
        // index < len, so removed element and the tail segment are
        // initialized bytes within the block.
        unsafe {
            let p = self.data.as_ptr().add(index * stride);
            if let Some(dest) = dest {
                ptr::copy_nonoverlapping(p, dest.as_mut_ptr(), stride);
            }
            if index < len - 1 {
                ptr::copy(p.add(stride), p, (len - index - 1) * stride);
            }
            self.set_field(Field::Length, len - 1);
        }
        Ok(())
    }

    /// Remove the last element.
    #[inline]
    pub fn pop_back(&mut self, dest: Option<&mut [u8]>) -> Result<()> {
        let index = self
            .len()
            .checked_sub(1)
            .ok_or(Error::IndexOutOfBound { index: 0, len: 0 })?;
        self.pop_at(index, dest)
    }

    /// Remove the first element.
    #[inline]
    pub fn pop_front(&mut self, dest: Option<&mut [u8]>) -> Result<()> {
        self.pop_at(0, dest)
    }

    /// Release the array.
    #[inline]
    pub fn destroy(self) {
        drop(self)
    }

    #[inline]
    fn layout(capacity: usize, stride: usize) -> Result<Layout> {
        block_layout(HEADER_SIZE, capacity, stride, ALIGNMENT)
    }
}

impl Drop for OpaqueArray {
    #[inline]
    fn drop(&mut self) {
        // block starts at header, not at element zero.
        if let Ok(layout) = Self::layout(self.capacity(), self.stride()) {
            // SAFETY:
            //
            // header precedes element zero in the same block, and
            // layout is the one used to allocate it.
            unsafe {
                let block = NonNull::new_unchecked(self.data.as_ptr().sub(HEADER_SIZE));
                free_block(block, layout);
            }
        }
    }
}

impl fmt::Debug for OpaqueArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpaqueArray")
            .field("length", &self.len())
            .field("capacity", &self.capacity())
            .field("increment", &self.increment())
            .field("stride", &self.stride())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{thread_rng, Rng};

    fn i32_bytes(v: i32) -> [u8; 4] {
        v.to_ne_bytes()
    }

    fn i32s(arr: &OpaqueArray) -> Vec<i32> {
        arr.as_bytes()
            .chunks_exact(4)
            .map(|c| i32::from_ne_bytes(c.try_into().unwrap()))
            .collect()
    }

    #[test]
    fn test_opaque_array_create() {
        let arr = OpaqueArray::create(2, 2, 4).unwrap();
        assert_eq!(0, arr.len());
        assert_eq!(2, arr.capacity());
        assert_eq!(2, arr.increment());
        assert_eq!(4, arr.stride());
        assert!(arr.is_empty());
        assert_eq!(0, arr.as_ptr() as usize % ALIGNMENT);
        assert_eq!(
            "OpaqueArray { length: 0, capacity: 2, increment: 2, stride: 4 }",
            format!("{:?}", arr)
        );
        arr.destroy();

        let arr = OpaqueArray::new::<u64>().unwrap();
        assert_eq!((2, 2, 8), (arr.capacity(), arr.increment(), arr.stride()));
        let arr = OpaqueArray::with_config::<u16>(&ArrayConfig::new(7, 3)).unwrap();
        assert_eq!((7, 3, 2), (arr.capacity(), arr.increment(), arr.stride()));
        let arr = OpaqueArray::create(0, 1, 4).unwrap();
        assert_eq!(0, arr.capacity());
        assert!(matches!(
            OpaqueArray::create(2, 0, 4),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            OpaqueArray::create(usize::MAX, 2, 4),
            Err(Error::CapacityOverflow)
        ));
    }

    #[test]
    fn test_opaque_array_push_back_scenario() {
        let mut arr = OpaqueArray::create(2, 2, size_of::<i32>()).unwrap();
        for _ in 0..3 {
            arr.push_back(&i32_bytes(10)).unwrap();
        }
        assert_eq!(3, arr.len());
        assert_eq!(4, arr.capacity());
        assert_eq!(vec![10, 10, 10], i32s(&arr));
        let mut dest = [0u8; 4];
        arr.pop_at(1, Some(&mut dest)).unwrap();
        assert_eq!(10, i32::from_ne_bytes(dest));
        assert_eq!(2, arr.len());
        assert_eq!(4, arr.capacity());
    }

    #[test]
    fn test_opaque_array_push_front_and_pop() {
        let mut arr = OpaqueArray::new::<i32>().unwrap();
        for i in 0..10 {
            arr.push_front(&i32_bytes((i + 1) * 2)).unwrap();
        }
        assert_eq!(vec![20, 18, 16, 14, 12, 10, 8, 6, 4, 2], i32s(&arr));
        let mut dest = [0u8; 4];
        arr.pop_at(1, Some(&mut dest)).unwrap();
        assert_eq!(18, i32::from_ne_bytes(dest));
        arr.pop_front(None).unwrap();
        assert_eq!(vec![16, 14, 12, 10, 8, 6, 4, 2], i32s(&arr));
        arr.pop_back(Some(&mut dest)).unwrap();
        assert_eq!(2, i32::from_ne_bytes(dest));
        assert_eq!(7, arr.len());
        assert_eq!(10, arr.capacity());
        arr.capacity_deflate().unwrap();
        assert_eq!(8, arr.capacity());
        assert_eq!(vec![16, 14, 12, 10, 8, 6, 4], i32s(&arr));
    }

    #[test]
    fn test_opaque_array_growth() {
        let mut rng = thread_rng();
        for _ in 0..100 {
            let cap: usize = rng.gen_range(0..16);
            let inc: usize = rng.gen_range(1..8);
            let n: usize = rng.gen_range(0..200);
            let mut arr = OpaqueArray::create(cap, inc, 4).unwrap();
            for i in 0..n {
                arr.push_back(&i32_bytes(i as i32)).unwrap();
            }
            let k = if n <= cap { 0 } else { (n - cap).div_ceil(inc) };
            assert_eq!(n, arr.len());
            assert_eq!(cap + inc * k, arr.capacity());
            assert!(i32s(&arr).into_iter().eq(0..n as i32));
        }
    }

    #[test]
    fn test_opaque_array_random_ops() {
        let mut rng = thread_rng();
        let mut arr = OpaqueArray::create(1, 3, 4).unwrap();
        let mut expected: Vec<i32> = vec![];
        for _ in 0..2000 {
            if expected.is_empty() || rng.gen_bool(0.6) {
                let index = rng.gen_range(0..=expected.len());
                let v: i32 = rng.gen();
                arr.push_at(index, &i32_bytes(v)).unwrap();
                expected.insert(index, v);
            } else {
                let index = rng.gen_range(0..expected.len());
                let mut dest = [0u8; 4];
                arr.pop_at(index, Some(&mut dest)).unwrap();
                assert_eq!(expected.remove(index), i32::from_ne_bytes(dest));
            }
            assert_eq!(expected, i32s(&arr));
            assert!(arr.len() <= arr.capacity());
        }
    }

    #[test]
    fn test_opaque_array_resize() {
        let mut arr = OpaqueArray::create(2, 2, 4).unwrap();
        arr.push_back(&i32_bytes(1)).unwrap();
        arr.push_back(&i32_bytes(2)).unwrap();
        arr.resize(100).unwrap();
        assert_eq!((2, 100, 2, 4), (arr.len(), arr.capacity(), arr.increment(), arr.stride()));
        assert_eq!(vec![1, 2], i32s(&arr));
        arr.resize(2).unwrap();
        assert_eq!(vec![1, 2], i32s(&arr));
        assert!(matches!(arr.resize(1), Err(Error::InvalidArgument(_))));
        assert_eq!(2, arr.capacity());
        arr.capacity_increment().unwrap();
        assert_eq!(4, arr.capacity());
        assert_eq!(vec![1, 2], i32s(&arr));
    }

    #[test]
    fn test_opaque_array_resize_insufficient_memory() {
        let mut arr = OpaqueArray::create(2, 2, 1).unwrap();
        arr.push_back(&[7]).unwrap();
        assert!(matches!(
            arr.resize(isize::MAX as usize / 2),
            Err(Error::InsufficientMemory(_))
        ));
        assert_eq!((1, 2, 2, 1), (arr.len(), arr.capacity(), arr.increment(), arr.stride()));
        assert_eq!(&[7], arr.as_bytes());
        arr.push_back(&[8]).unwrap();
        assert_eq!(&[7, 8], arr.as_bytes());
    }

    #[test]
    fn test_opaque_array_deflate() {
        let mut arr = OpaqueArray::create(20, 4, 1).unwrap();
        for b in 0..9u8 {
            arr.push_back(&[b]).unwrap();
        }
        arr.capacity_deflate().unwrap();
        assert_eq!(12, arr.capacity());
        arr.capacity_deflate().unwrap();
        assert_eq!(12, arr.capacity());
        while !arr.is_empty() {
            arr.pop_back(None).unwrap();
        }
        arr.capacity_deflate().unwrap();
        assert_eq!(4, arr.capacity());
    }

    #[test]
    fn test_opaque_array_errors() {
        let mut arr = OpaqueArray::create(2, 2, 4).unwrap();
        assert_eq!(
            Err(Error::StrideMismatch {
                expected: 4,
                actual: 8
            }),
            arr.push_back(&[0u8; 8])
        );
        assert_eq!(
            Err(Error::IndexOutOfBound { index: 1, len: 0 }),
            arr.push_at(1, &i32_bytes(1))
        );
        assert_eq!(
            Err(Error::IndexOutOfBound { index: 0, len: 0 }),
            arr.pop_back(None)
        );
        assert_eq!(
            Err(Error::IndexOutOfBound { index: 0, len: 0 }),
            arr.pop_front(None)
        );
        arr.push_back(&i32_bytes(5)).unwrap();
        let mut small = [0u8; 2];
        assert_eq!(
            Err(Error::StrideMismatch {
                expected: 4,
                actual: 2
            }),
            arr.pop_at(0, Some(&mut small))
        );
        assert_eq!(1, arr.len());
        assert_eq!(Ok(&i32_bytes(5)[..]), arr.element(0));
        assert!(arr.element(1).is_err());
    }

    #[test]
    fn test_opaque_array_fields() {
        let mut arr = OpaqueArray::create(4, 2, 4).unwrap();
        arr.push_back(&i32_bytes(1)).unwrap();
        arr.push_back(&i32_bytes(2)).unwrap();
        let values: Vec<usize> = Field::ALL.iter().map(|f| arr.field(*f)).collect();
        assert_eq!(vec![2, 4, 2, 4], values);
        // truncate through header
        unsafe { arr.set_field(Field::Length, 1) };
        assert_eq!(vec![1], i32s(&arr));
        unsafe { arr.set_field(Field::Increment, 5) };
        arr.push_back(&i32_bytes(3)).unwrap();
        arr.push_back(&i32_bytes(4)).unwrap();
        arr.push_back(&i32_bytes(5)).unwrap();
        arr.push_back(&i32_bytes(6)).unwrap();
        assert_eq!(9, arr.capacity());
        assert_eq!(vec![1, 3, 4, 5, 6], i32s(&arr));
    }

    #[test]
    fn test_opaque_array_bytes_mut() {
        let mut arr = OpaqueArray::create(4, 4, 2).unwrap();
        arr.push_back(&[1, 2]).unwrap();
        arr.push_back(&[3, 4]).unwrap();
        arr.as_bytes_mut()[3] = 9;
        assert_eq!(&[1, 2, 3, 9], arr.as_bytes());
        unsafe {
            *arr.as_mut_ptr() = 7;
        }
        assert_eq!(7, arr.as_bytes()[0]);
    }

    #[test]
    fn test_opaque_array_zero_stride() {
        let mut arr = OpaqueArray::create(0, 2, 0).unwrap();
        for _ in 0..3 {
            arr.push_back(&[]).unwrap();
        }
        assert_eq!(3, arr.len());
        assert_eq!(4, arr.capacity());
        assert!(arr.as_bytes().is_empty());
        arr.pop_at(1, None).unwrap();
        assert_eq!(2, arr.len());
    }
}
